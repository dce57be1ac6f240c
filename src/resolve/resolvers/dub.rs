//! Version resolution for the DUB build tool.
//!
//! Only two shapes are accepted: `latest` (resolved through the repository's
//! latest-release lookup) and an exact `[v]X.Y.Z` triple. Prereleases are
//! rejected outright.

use std::sync::Arc;

use regex::Regex;

use crate::platform::{Arch, Platform};
use crate::resolve::artifact::ArtifactDescriptor;
use crate::resolve::error::ResolveError;
use crate::resolve::registries::github::latest_release;
use crate::resolve::semver::SimpleSemver;
use crate::resolve::transport::Transport;

const TOOL: &str = "dub";
const REPO: &str = "dlang/dub";

const DOWNLOAD_ROOT: &str = "https://github.com/dlang/dub/releases/download";

pub struct DubResolver {
    transport: Arc<dyn Transport>,
    token: Option<String>,
    exact: Regex,
}

impl DubResolver {
    pub fn new(transport: Arc<dyn Transport>, token: Option<String>) -> Self {
        Self {
            transport,
            token,
            exact: Regex::new(r"^v?(\d+\.\d+\.\d+)(-.+)?$").unwrap(),
        }
    }

    pub async fn resolve(
        &self,
        spec: &str,
        platform: Platform,
        arch: Arch,
    ) -> Result<ArtifactDescriptor, ResolveError> {
        let requested = if spec == "latest" {
            let release = latest_release(
                self.transport.as_ref(),
                self.token.as_deref(),
                REPO,
            )
            .await?;
            // Release tags occasionally carry a `: summary` suffix.
            match release.tag_name.split_once(':') {
                Some((tag, _)) => tag.trim().to_string(),
                None => release.tag_name,
            }
        } else {
            spec.to_string()
        };

        let captures = self.exact.captures(&requested).ok_or_else(|| {
            ResolveError::UnrecognizedVersion {
                tool: TOOL,
                spec: requested.clone(),
            }
        })?;
        if captures.get(2).is_some() {
            return Err(ResolveError::NotFound(format!(
                "only release versions of dub are supported, not: {}",
                requested
            )));
        }
        let version = format!("v{}", &captures[1]);

        let arch_suffix = arch_suffix(&version, platform, arch)?;
        let (os, extension) = match platform {
            Platform::Windows => ("windows", "zip"),
            Platform::Linux => ("linux", "tar.gz"),
            Platform::Macos => ("osx", "tar.gz"),
        };
        let url = format!(
            "{}/{}/dub-{}-{}-{}.{}",
            DOWNLOAD_ROOT, version, version, os, arch_suffix, extension
        );

        Ok(ArtifactDescriptor {
            tool_name: TOOL.to_string(),
            resolved_version: version,
            url,
            signature_url: None,
            // The archive holds the executable at its root.
            binary_dir: String::new(),
            library_dirs: Vec::new(),
            wrapper_executable: TOOL.to_string(),
        })
    }
}

/// dub releases ship arm64 binaries only for macOS, and only since v1.38.1;
/// everything else gets the x86_64 build.
fn arch_suffix(version: &str, platform: Platform, arch: Arch) -> Result<&'static str, ResolveError> {
    if arch == Arch::X64 {
        return Ok("x86_64");
    }

    if arch == Arch::Arm64 && platform == Platform::Macos {
        let resolved: SimpleSemver = version.parse()?;
        let first_arm64 = SimpleSemver::new(1, 38, 1);
        if resolved >= first_arm64 {
            return Ok("arm64");
        }
        return Ok("x86_64");
    }

    Err(ResolveError::UnsupportedArchitecture {
        tool: TOOL,
        platform,
        arch,
        version: version.to_string(),
    })
}
