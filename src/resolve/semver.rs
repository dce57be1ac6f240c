//! Simplified semantic version parsing and ordering.
//!
//! The grammar is deliberately looser than strict SemVer: a prerelease
//! identifier may be empty (so `2.097.0-alpha.` parses, yielding a trailing
//! empty identifier), and build metadata after `+` is discarded without
//! validation. The ordering rules match what version resolution has always
//! relied on, in particular that a numeric identifier sorts below any textual
//! identifier at the same position.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::resolve::error::SemverError;

/// One dot-separated prerelease component.
///
/// `Number` sorts before `Text` at the same position; the derived `Ord`
/// relies on the variant order here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Identifier {
    Number(u64),
    Text(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A `major.minor.patch` triple plus an ordered prerelease identifier list.
///
/// An empty prerelease list means a release, which sorts above every
/// prerelease of the same triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleSemver {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Vec<Identifier>,
}

impl SimpleSemver {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: Vec::new(),
        }
    }

    pub fn with_prerelease(mut self, identifiers: Vec<Identifier>) -> Self {
        self.prerelease = identifiers;
        self
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }
}

impl FromStr for SimpleSemver {
    type Err = SemverError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let stripped = text.strip_prefix('v').unwrap_or(text);
        // Build metadata carries no ordering information.
        let stripped = match stripped.find('+') {
            Some(at) => &stripped[..at],
            None => stripped,
        };

        let (triple, prerelease) = match stripped.find('-') {
            Some(at) => (&stripped[..at], Some(&stripped[at + 1..])),
            None => (stripped, None),
        };

        let numbers: Vec<&str> = triple.split('.').collect();
        let [major, minor, patch] = numbers.as_slice() else {
            return Err(SemverError(text.to_string()));
        };
        let parse_number =
            |n: &str| n.parse::<u64>().map_err(|_| SemverError(text.to_string()));
        let major = parse_number(major)?;
        let minor = parse_number(minor)?;
        let patch = parse_number(patch)?;

        let prerelease = match prerelease {
            Some(rest) => rest.split('.').map(parse_identifier).collect(),
            None => Vec::new(),
        };

        Ok(Self {
            major,
            minor,
            patch,
            prerelease,
        })
    }
}

fn parse_identifier(part: &str) -> Identifier {
    // All-digit identifiers are numeric; everything else (including the
    // empty string) stays textual.
    if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
        match part.parse() {
            Ok(n) => Identifier::Number(n),
            Err(_) => Identifier::Text(part.to_string()),
        }
    } else {
        Identifier::Text(part.to_string())
    }
}

impl Ord for SimpleSemver {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| {
                match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
                    (true, true) => Ordering::Equal,
                    // A release outranks any prerelease of the same triple.
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    // Slice ordering compares pairwise and ranks a strict
                    // prefix below the longer sequence.
                    (false, false) => self.prerelease.cmp(&other.prerelease),
                }
            })
    }
}

impl PartialOrd for SimpleSemver {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimpleSemver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        for (i, id) in self.prerelease.iter().enumerate() {
            let lead = if i == 0 { '-' } else { '.' };
            write!(f, "{}{}", lead, id)?;
        }
        Ok(())
    }
}
