use thiserror::Error;

use crate::platform::{Arch, Platform};

/// A string that could not be parsed as a semantic version.
#[derive(Debug, Clone, Error)]
#[error("not a semantic version: '{0}'")]
pub struct SemverError(pub String);

/// Transport-level failure: connection problems, retry exhaustion, or a
/// response body that could not be interpreted.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("network error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed requesting {url} - aborting after {attempts} attempts\n{status} {body}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        status: u16,
        body: String,
    },

    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

/// Why a specifier could not be resolved to an artifact.
///
/// Every variant names the offending input so the invoking layer can report
/// it without further context.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unrecognized {tool} version specifier: '{spec}'")]
    UnrecognizedVersion { tool: &'static str, spec: String },

    #[error("{tool} is not supported on {platform}")]
    UnsupportedPlatform {
        tool: &'static str,
        platform: Platform,
    },

    #[error("unsupported platform-arch pair ({platform}-{arch}) for {tool} {version}")]
    UnsupportedArchitecture {
        tool: &'static str,
        platform: Platform,
        arch: Arch,
        version: String,
    },

    #[error("requested {requested} versions before latest but latest points to {latest}")]
    MinorOutOfRange { requested: u64, latest: String },

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Semver(#[from] SemverError),
}
