//! Target platform and CPU architecture value types.
//!
//! Every resolver takes these explicitly; nothing in the resolution core reads
//! them from the host environment. [`Platform::host`] and [`Arch::host`] exist
//! for the CLI entry point only.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("unrecognized platform: '{0}'")]
pub struct PlatformParseError(pub String);

#[derive(Debug, Error)]
#[error("unrecognized architecture: '{0}'")]
pub struct ArchParseError(pub String);

/// Operating system a toolchain archive is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    Macos,
}

impl Platform {
    /// The platform of the running process, if it is one we have archive
    /// naming for.
    pub fn host() -> Option<Self> {
        if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else if cfg!(target_os = "windows") {
            Some(Self::Windows)
        } else if cfg!(target_os = "macos") {
            Some(Self::Macos)
        } else {
            None
        }
    }

    /// Path separator used inside this platform's archives.
    pub fn path_sep(self) -> char {
        match self {
            Self::Windows => '\\',
            Self::Linux | Self::Macos => '/',
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Macos => "macos",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(Self::Linux),
            "windows" | "win32" => Ok(Self::Windows),
            "macos" | "darwin" | "osx" => Ok(Self::Macos),
            other => Err(PlatformParseError(other.to_string())),
        }
    }
}

/// CPU architecture a toolchain archive is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86,
    X64,
    Arm,
    Arm64,
}

impl Arch {
    /// The architecture of the running process, if it is one we have archive
    /// naming for.
    pub fn host() -> Option<Self> {
        if cfg!(target_arch = "x86_64") {
            Some(Self::X64)
        } else if cfg!(target_arch = "aarch64") {
            Some(Self::Arm64)
        } else if cfg!(target_arch = "x86") {
            Some(Self::X86)
        } else if cfg!(target_arch = "arm") {
            Some(Self::Arm)
        } else {
            None
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Arch {
    type Err = ArchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86" | "ia32" => Ok(Self::X86),
            "x64" | "x86_64" | "amd64" => Ok(Self::X64),
            "arm" | "armhf" => Ok(Self::Arm),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            other => Err(ArchParseError(other.to_string())),
        }
    }
}
