//! Version resolution for GDC, the GCC-based D compiler.
//!
//! GDC is installed from the distribution's apt repositories, so resolution
//! is purely local: validate the specifier, derive the apt package name, and
//! point at the gdmd wrapper script pinned by commit. Linux only.

use regex::Regex;

use crate::platform::{Arch, Platform};
use crate::resolve::artifact::ArtifactDescriptor;
use crate::resolve::error::ResolveError;

const TOOL: &str = "gdc";

/// Repository hosting the gdmd wrapper script.
const GDMD_RAW_ROOT: &str = "https://raw.githubusercontent.com/D-Programming-GDC/gdmd";

pub struct GdcResolver {
    package: Regex,
}

impl GdcResolver {
    pub fn new() -> Self {
        Self {
            package: Regex::new(r"^gdc(-\d+)?$").unwrap(),
        }
    }

    /// Resolve `spec` (`gdc` or `gdc-<major>`) plus the gdmd commit to pin.
    ///
    /// `gdmd_commit` is a commit in the gdmd repository, or `latest` for the
    /// current master branch.
    pub fn resolve(
        &self,
        spec: &str,
        gdmd_commit: &str,
        platform: Platform,
        _arch: Arch,
    ) -> Result<ArtifactDescriptor, ResolveError> {
        if platform != Platform::Linux {
            return Err(ResolveError::UnsupportedPlatform {
                tool: TOOL,
                platform,
            });
        }
        if gdmd_commit.is_empty() {
            return Err(ResolveError::UnrecognizedVersion {
                tool: TOOL,
                spec: format!("{} (missing gdmd commit identifier)", spec),
            });
        }

        let captures =
            self.package
                .captures(spec)
                .ok_or_else(|| ResolveError::UnrecognizedVersion {
                    tool: TOOL,
                    spec: spec.to_string(),
                })?;
        let package_suffix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
        let commit = if gdmd_commit == "latest" {
            "master"
        } else {
            gdmd_commit
        };

        Ok(ArtifactDescriptor {
            tool_name: format!("gdc{}", package_suffix),
            resolved_version: commit.to_string(),
            url: format!("{}/{}/dmd-script", GDMD_RAW_ROOT, commit),
            signature_url: None,
            // Packages install straight into the system prefix; the wrapper
            // script lands next to them.
            binary_dir: "/usr/bin".to_string(),
            library_dirs: Vec::new(),
            wrapper_executable: format!("gdmd{}", package_suffix),
        })
    }
}

impl Default for GdcResolver {
    fn default() -> Self {
        Self::new()
    }
}
