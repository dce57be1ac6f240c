//! Version resolution for the LDC compiler.
//!
//! The grammar mirrors dmd's (`ldc`, `ldc-beta`, `ldc-1.39.0`, `ldc-1.39`,
//! `ldc-1.39b`, `ldc^2`, `ldc-master`) with a few differences: the two
//! LATEST pointers are independent (a beta may legitimately resolve lower
//! than stable), minor lookups walk the tag listing directly instead of a
//! persistent cache, and `ldc-master` picks the freshest CI asset for the
//! platform. The `wekaldc-` prefix selects weka's vendor fork, which mirrors
//! the upstream archive naming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::config::LDC_PAGES;
use crate::platform::{Arch, Platform};
use crate::resolve::artifact::ArtifactDescriptor;
use crate::resolve::error::ResolveError;
use crate::resolve::registries::github::{
    CrawlOutcome, TagVisit, release_by_tag, tags_url, visit_tags,
};
use crate::resolve::semver::{Identifier, SimpleSemver};
use crate::resolve::transport::{Transport, body_as_text};

const TOOL: &str = "ldc2";
const REPO: &str = "ldc-developers/ldc";

const DOWNLOAD_ROOT: &str = "https://github.com/ldc-developers/ldc/releases/download";
const WEKA_DOWNLOAD_ROOT: &str = "https://github.com/weka/ldc/releases/download";

/// Tag of the rolling CI release.
const CI_TAG: &str = "CI";

pub struct LdcResolver {
    transport: Arc<dyn Transport>,
    token: Option<String>,
    latest: Regex,
    exact: Regex,
    minor_only: Regex,
    relative: Regex,
    weka: Regex,
}

impl LdcResolver {
    pub fn new(transport: Arc<dyn Transport>, token: Option<String>) -> Self {
        Self {
            transport,
            token,
            latest: Regex::new(r"^ldc(?:-(beta|latest))?$").unwrap(),
            exact: Regex::new(r"^ldc-(\d+\.\d+\.\d+.*)$").unwrap(),
            minor_only: Regex::new(r"^ldc-(\d+)\.(\d+)(b)?$").unwrap(),
            relative: Regex::new(r"^ldc\^(\d+)$").unwrap(),
            weka: Regex::new(r"^wekaldc-(.+)$").unwrap(),
        }
    }

    pub async fn resolve(
        &self,
        spec: &str,
        platform: Platform,
        arch: Arch,
    ) -> Result<ArtifactDescriptor, ResolveError> {
        if spec == "ldc-master" {
            return self.resolve_ci_build(platform, arch).await;
        }

        let (version, download_root) = if let Some(captures) = self.weka.captures(spec) {
            (captures[1].to_string(), WEKA_DOWNLOAD_ROOT)
        } else {
            (self.resolve_version(spec).await?, DOWNLOAD_ROOT)
        };

        let legacy_osx = is_legacy_osx(&version)?;
        let suffix = archive_suffix(platform, arch, legacy_osx);
        let url = format!("{}/v{}/ldc2-{}-{}", download_root, version, version, suffix);

        Ok(descriptor(url, version, &suffix, platform, legacy_osx))
    }

    /// Classify a non-CI specifier into a concrete version string like
    /// `1.39.0` or `1.30.0-beta1`.
    async fn resolve_version(&self, spec: &str) -> Result<String, ResolveError> {
        if let Some(captures) = self.latest.captures(spec) {
            let pointer = match captures.get(1).map(|m| m.as_str()) {
                Some("beta") => format!("{}/LATEST_BETA", LDC_PAGES),
                _ => format!("{}/LATEST", LDC_PAGES),
            };
            return Ok(body_as_text(self.transport.as_ref(), &pointer, None).await?);
        }

        if let Some(captures) = self.exact.captures(spec) {
            return Ok(captures[1].to_string());
        }

        if let Some(captures) = self.minor_only.captures(spec) {
            let major = captures[1].parse().map_err(|_| self.unrecognized(spec))?;
            let minor = captures[2].parse().map_err(|_| self.unrecognized(spec))?;
            let with_prereleases = captures.get(3).is_some();
            return self
                .resolve_highest_patch(major, minor, with_prereleases)
                .await;
        }

        if let Some(captures) = self.relative.captures(spec) {
            let minors_ago: u64 = captures[1].parse().map_err(|_| self.unrecognized(spec))?;
            let pointer = format!("{}/LATEST", LDC_PAGES);
            let latest: SimpleSemver = body_as_text(self.transport.as_ref(), &pointer, None)
                .await?
                .parse()?;
            if latest.minor < minors_ago {
                return Err(ResolveError::MinorOutOfRange {
                    requested: minors_ago,
                    latest: format!("{}.{}", latest.major, latest.minor),
                });
            }
            return self
                .resolve_highest_patch(latest.major, latest.minor - minors_ago, false)
                .await;
        }

        Err(self.unrecognized(spec))
    }

    fn unrecognized(&self, spec: &str) -> ResolveError {
        ResolveError::UnrecognizedVersion {
            tool: "ldc",
            spec: spec.to_string(),
        }
    }

    /// Highest patch release of `major.minor`, walking the tag listing until
    /// a match or until the listing drops below the requested pair.
    async fn resolve_highest_patch(
        &self,
        major: u64,
        minor: u64,
        with_prereleases: bool,
    ) -> Result<String, ResolveError> {
        let mut wanted = format!(r"^v{}\.{}\.(\d+)", major, minor);
        if with_prereleases {
            // Lenient about suffix shape; ldc has used beta1 and beta.1.
            wanted.push_str("(.*)");
        }
        wanted.push('$');
        let pattern = Regex::new(&wanted).unwrap();

        let crawl = visit_tags(
            self.transport.as_ref(),
            &tags_url(REPO),
            self.token.as_deref(),
            |tag| {
                if pattern.is_match(&tag.name) {
                    return TagVisit::Accept(tag.name.clone());
                }
                // Vendor fork tags (dmd-rewrite-v2.*, ...) never match the
                // release scheme; skip rather than compare them.
                if !tag.name.starts_with('v') {
                    return TagVisit::Continue;
                }
                match tag.name.parse::<SimpleSemver>() {
                    Ok(version) if version.major == major && version.minor < minor => {
                        TagVisit::Abort
                    }
                    Ok(_) => TagVisit::Continue,
                    Err(_) => {
                        debug!("skipping unparseable ldc tag '{}'", tag.name);
                        TagVisit::Continue
                    }
                }
            },
        )
        .await?;

        match crawl.outcome {
            CrawlOutcome::Accepted(tag) => Ok(tag.trim_start_matches('v').to_string()),
            CrawlOutcome::Aborted | CrawlOutcome::Exhausted => {
                Err(ResolveError::NotFound(format!(
                    "no tag matching {}.{} found for ldc",
                    major, minor
                )))
            }
        }
    }

    /// Resolve `ldc-master`: list the CI release's assets, keep the ones
    /// named for this platform, and pick the most recently updated.
    async fn resolve_ci_build(
        &self,
        platform: Platform,
        arch: Arch,
    ) -> Result<ArtifactDescriptor, ResolveError> {
        let suffix = archive_suffix(platform, arch, false);
        let release = release_by_tag(
            self.transport.as_ref(),
            self.token.as_deref(),
            REPO,
            CI_TAG,
        )
        .await?;
        let assets = release.assets.ok_or_else(|| {
            ResolveError::NotFound("no asset listing in the ldc CI release".to_string())
        })?;
        if assets.is_empty() {
            return Err(ResolveError::NotFound(
                "no assets found for the ldc CI release".to_string(),
            ));
        }

        let wanted = Regex::new(&format!(
            "^ldc2-([0-9a-fA-F]{{5,12}})-{}$",
            regex::escape(&suffix)
        ))
        .unwrap();
        let mut builds: Vec<(String, String, Option<DateTime<Utc>>)> = assets
            .iter()
            .filter_map(|asset| {
                let commit = wanted.captures(&asset.name)?[1].to_string();
                let updated_at = DateTime::parse_from_rfc3339(&asset.updated_at)
                    .ok()
                    .map(|stamp| stamp.with_timezone(&Utc));
                Some((asset.name.clone(), commit, updated_at))
            })
            .collect();
        if builds.is_empty() {
            return Err(ResolveError::NotFound(format!(
                "no ldc CI asset found for platform {}",
                suffix
            )));
        }

        builds.sort_by(|a, b| b.2.cmp(&a.2));
        let (name, commit, _) = builds.swap_remove(0);
        let url = format!("{}/{}/{}", DOWNLOAD_ROOT, CI_TAG, name);

        Ok(descriptor(url, commit, &suffix, platform, false))
    }
}

/// Universal macOS archives exist since 1.30.0-beta1; older versions ship
/// one archive per architecture.
fn is_legacy_osx(version: &str) -> Result<bool, ResolveError> {
    let parsed: SimpleSemver = version.parse()?;
    let first_universal = SimpleSemver::new(1, 30, 0)
        .with_prerelease(vec![Identifier::Text("beta1".to_string())]);
    Ok(parsed < first_universal)
}

/// Archive name suffix (including extension) for a platform/arch pair.
/// Windows archives are multilib; every architecture shares one name.
fn archive_suffix(platform: Platform, arch: Arch, legacy_osx: bool) -> String {
    match platform {
        Platform::Windows => "windows-multilib.7z".to_string(),
        Platform::Linux => {
            let arch_name = match arch {
                // Only found on very old releases, but still resolvable.
                Arch::X86 => "x86",
                Arch::X64 => "x86_64",
                Arch::Arm => "armhf",
                Arch::Arm64 => "aarch64",
            };
            format!("linux-{}.tar.xz", arch_name)
        }
        Platform::Macos => {
            let arch_name = match arch {
                Arch::X86 | Arch::X64 => "x86_64",
                Arch::Arm | Arch::Arm64 => "arm64",
            };
            let arch_name = if legacy_osx { arch_name } else { "universal" };
            format!("osx-{}.tar.xz", arch_name)
        }
    }
}

fn descriptor(
    url: String,
    version: String,
    suffix: &str,
    platform: Platform,
    legacy_osx: bool,
) -> ArtifactDescriptor {
    // `windows-multilib.7z` -> `windows-multilib`
    let folder_suffix = suffix.split_once('.').map_or(suffix, |(folder, _)| folder);
    let sep = platform.path_sep();
    let base = format!("{}ldc2-{}-{}{}", sep, version, folder_suffix, sep);

    let library_dirs = match platform {
        Platform::Windows => vec![format!("{}lib64", base)],
        Platform::Linux => vec![format!("{}lib", base)],
        Platform::Macos => {
            if legacy_osx {
                vec![format!("{}lib", base)]
            } else {
                vec![format!("{}lib-arm64", base), format!("{}lib-x86_64", base)]
            }
        }
    };

    ArtifactDescriptor {
        tool_name: TOOL.to_string(),
        resolved_version: version,
        url,
        signature_url: None,
        binary_dir: format!("{}bin", base),
        library_dirs,
        wrapper_executable: "ldmd2".to_string(),
    }
}
