//! Version resolution for the DMD reference compiler.
//!
//! Specifier grammar:
//! - `dmd-2.109.1` / `dmd-2.110.0-beta.1`: echoed directly, no network.
//! - `dmd-2.108`: highest patch release of that minor, via tag crawl.
//! - `dmd-2.108b`: same, but prereleases count too.
//! - `dmd` / `dmd-latest` / `dmd-beta`: the LATEST pointer files; a beta
//!   older than the stable release is floored to the stable release.
//! - `dmd^3`: three minors before latest, then highest patch.
//! - `dmd-master`: the nightly build, unsigned.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::config::DLANG_DOWNLOADS;
use crate::platform::{Arch, Platform};
use crate::resolve::artifact::ArtifactDescriptor;
use crate::resolve::error::{NetworkError, ResolveError};
use crate::resolve::registries::github::{TagVisit, tags_url, visit_tags};
use crate::resolve::semver::SimpleSemver;
use crate::resolve::tags::TagCache;
use crate::resolve::transport::{Transport, body_as_text};

const TOOL: &str = "dmd";
const REPO: &str = "dlang/dmd";

/// The nightly release keeps a fixed archive name.
const NIGHTLY_URL: &str = "https://github.com/dlang/dmd/releases/download/nightly/dmd.master";

/// Archives before 2.069 were zips on every platform.
const ZIP_ARCHIVES_BELOW: u64 = 69;

/// 64-bit Windows binaries ship since 2.091.0-beta.1.
const WINDOWS_BIN64_SINCE: u64 = 91;

/// Effective minor of the nightly build, past every naming threshold.
const NIGHTLY_MINOR: u64 = 999;

pub struct DmdResolver {
    transport: Arc<dyn Transport>,
    token: Option<String>,
    tags: TagCache,
    exact: Regex,
    exact_prerelease: Regex,
    minor_only: Regex,
    minor_with_prereleases: Regex,
    latest: Regex,
    relative: Regex,
}

impl DmdResolver {
    pub fn new(transport: Arc<dyn Transport>, token: Option<String>) -> Self {
        Self {
            transport,
            token,
            tags: TagCache::new(),
            exact: Regex::new(r"^dmd-2\.(\d+)\.(\d+)$").unwrap(),
            exact_prerelease: Regex::new(r"^dmd-2\.(\d+)\.(\d+)(-\w+\.\d+)$").unwrap(),
            minor_only: Regex::new(r"^dmd-2\.(\d+)$").unwrap(),
            minor_with_prereleases: Regex::new(r"^dmd-2\.(\d+)b$").unwrap(),
            latest: Regex::new(r"^dmd(?:-(beta|latest))?$").unwrap(),
            relative: Regex::new(r"^dmd\^(\d+)$").unwrap(),
        }
    }

    /// Resolve `spec` into the artifact for `platform`.
    ///
    /// DMD archives bundle every architecture they support, so `arch` does
    /// not participate in the naming.
    pub async fn resolve(
        &mut self,
        spec: &str,
        platform: Platform,
        _arch: Arch,
    ) -> Result<ArtifactDescriptor, ResolveError> {
        if spec == "dmd-master" {
            return Ok(descriptor(
                NIGHTLY_URL.to_string(),
                "master".to_string(),
                false,
                NIGHTLY_MINOR,
                platform,
            ));
        }

        let (minor, patch, suffix) = self.resolve_version(spec).await?;
        let minor_text = pad_minor(minor);
        let version = format!("2.{}.{}{}", minor_text, patch, suffix);
        let tree = if suffix.is_empty() {
            "releases"
        } else {
            "pre-releases"
        };
        let url = format!(
            "{}/{}/2.x/2.{}.{}/dmd.{}",
            DLANG_DOWNLOADS, tree, minor_text, patch, version
        );

        Ok(descriptor(url, version, true, minor, platform))
    }

    /// Classify a non-nightly specifier into `(minor, patch, suffix)`.
    async fn resolve_version(&mut self, spec: &str) -> Result<(u64, u64, String), ResolveError> {
        let unrecognized = || ResolveError::UnrecognizedVersion {
            tool: TOOL,
            spec: spec.to_string(),
        };

        if let Some(captures) = self.exact.captures(spec) {
            let minor = captures[1].parse().map_err(|_| unrecognized())?;
            let patch = captures[2].parse().map_err(|_| unrecognized())?;
            return Ok((minor, patch, String::new()));
        }

        if let Some(captures) = self.exact_prerelease.captures(spec) {
            let minor = captures[1].parse().map_err(|_| unrecognized())?;
            let patch = captures[2].parse().map_err(|_| unrecognized())?;
            return Ok((minor, patch, captures[3].to_string()));
        }

        if let Some(captures) = self.minor_only.captures(spec) {
            let minor = captures[1].parse().map_err(|_| unrecognized())?;
            let (patch, _) = self.resolve_highest_patch(minor, false).await?;
            return Ok((minor, patch, String::new()));
        }

        if let Some(captures) = self.minor_with_prereleases.captures(spec) {
            let minor = captures[1].parse().map_err(|_| unrecognized())?;
            let (patch, suffix) = self.resolve_highest_patch(minor, true).await?;
            return Ok((minor, patch, suffix));
        }

        if let Some(captures) = self.latest.captures(spec) {
            let mut beta = self.fetch_latest_pointer("pre-releases").await?;
            let stable = self.fetch_latest_pointer("releases").await?;
            if beta < stable {
                // A stale beta pointer never downgrades the resolution.
                beta = stable.clone();
            }

            let picked = match captures.get(1).map(|m| m.as_str()) {
                Some("beta") => beta,
                _ => stable,
            };
            return Ok((picked.minor, picked.patch, prerelease_suffix(&picked)));
        }

        if let Some(captures) = self.relative.captures(spec) {
            let minors_ago: u64 = captures[1].parse().map_err(|_| unrecognized())?;
            let stable = self.fetch_latest_pointer("releases").await?;
            if stable.minor < minors_ago {
                return Err(ResolveError::MinorOutOfRange {
                    requested: minors_ago,
                    latest: format!("{}.{}", stable.major, stable.minor),
                });
            }
            let minor = stable.minor - minors_ago;
            let (patch, _) = self.resolve_highest_patch(minor, false).await?;
            return Ok((minor, patch, String::new()));
        }

        Err(unrecognized())
    }

    /// Resolve one of the LATEST pointer files into a version.
    async fn fetch_latest_pointer(&self, tree: &str) -> Result<SimpleSemver, ResolveError> {
        let url = format!("{}/{}/LATEST", DLANG_DOWNLOADS, tree);
        let body = body_as_text(self.transport.as_ref(), &url, None).await?;
        body.parse().map_err(|_| {
            NetworkError::InvalidResponse {
                url,
                reason: format!("unrecognized LATEST file contents: '{}'", body),
            }
            .into()
        })
    }

    /// Highest patch release of `2.<minor>`, crawling further tag pages only
    /// when the cache cannot already answer for that minor.
    async fn resolve_highest_patch(
        &mut self,
        minor: u64,
        with_prereleases: bool,
    ) -> Result<(u64, String), ResolveError> {
        let minor_text = pad_minor(minor);
        let pattern = if with_prereleases {
            Regex::new(&format!(r"^v2\.{}\.(\d+)(-(?:beta|rc)\.\d+)?$", minor_text)).unwrap()
        } else {
            Regex::new(&format!(r"^v2\.{}\.(\d+)$", minor_text)).unwrap()
        };
        // Tags arrive most-recent-first: once one at or below this bound
        // shows up, nothing for the requested minor remains undiscovered.
        let lower_bound = SimpleSemver::new(2, minor.saturating_sub(1), 9999);

        if self.tags.needs_update(minor) {
            let url = format!("{}?page={}", tags_url(REPO), self.tags.next_page());
            let Self {
                transport,
                token,
                tags,
                ..
            } = self;
            let crawl = visit_tags::<(), _>(transport.as_ref(), &url, token.as_deref(), |tag| {
                tags.record(tag.name.clone());
                if pattern.is_match(&tag.name) {
                    return TagVisit::Accept(());
                }
                match tag.name.parse::<SimpleSemver>() {
                    Ok(version) if version <= lower_bound => TagVisit::Abort,
                    Ok(_) => TagVisit::Continue,
                    Err(_) => {
                        debug!("skipping unparseable dmd tag '{}'", tag.name);
                        TagVisit::Continue
                    }
                }
            })
            .await?;
            tags.advance(crawl.full_pages);
        }

        let found = self.tags.find(&pattern).ok_or_else(|| {
            ResolveError::NotFound(format!(
                "no dmd patch releases found for minor release {}",
                minor
            ))
        })?;
        let version: SimpleSemver = found.parse()?;
        Ok((version.patch, prerelease_suffix(&version)))
    }
}

/// Minors below 100 appear zero-padded in archive URLs and version labels;
/// an upstream naming artifact that has to be preserved.
fn pad_minor(minor: u64) -> String {
    if minor < 100 {
        format!("0{}", minor)
    } else {
        minor.to_string()
    }
}

fn prerelease_suffix(version: &SimpleSemver) -> String {
    if !version.is_prerelease() {
        return String::new();
    }
    let identifiers: Vec<String> = version.prerelease.iter().map(|id| id.to_string()).collect();
    format!("-{}", identifiers.join("."))
}

/// Attach the platform naming to a resolved archive URL.
fn descriptor(
    mut url: String,
    version: String,
    signed: bool,
    minor: u64,
    platform: Platform,
) -> ArtifactDescriptor {
    let binary_dir;
    let library_dirs: Vec<String>;
    match platform {
        Platform::Windows => {
            url.push_str(".windows");
            url.push_str(if minor < ZIP_ARCHIVES_BELOW { ".zip" } else { ".7z" });
            binary_dir = if minor >= WINDOWS_BIN64_SINCE {
                r"\dmd2\windows\bin64"
            } else {
                r"\dmd2\windows\bin"
            };
            // Entries are prepended to the search path in order, so bin64
            // goes last to end up in front of bin.
            library_dirs = vec![
                r"\dmd2\windows\bin".to_string(),
                r"\dmd2\windows\bin64".to_string(),
            ];
        }
        Platform::Linux => {
            url.push_str(".linux");
            url.push_str(if minor < ZIP_ARCHIVES_BELOW {
                ".zip"
            } else {
                ".tar.xz"
            });
            binary_dir = "/dmd2/linux/bin64";
            library_dirs = vec!["/dmd2/linux/lib64".to_string()];
        }
        Platform::Macos => {
            url.push_str(".osx");
            url.push_str(if minor < ZIP_ARCHIVES_BELOW {
                ".zip"
            } else {
                ".tar.xz"
            });
            binary_dir = "/dmd2/osx/bin";
            library_dirs = vec!["/dmd2/osx/lib".to_string()];
        }
    }

    let signature_url = signed.then(|| ArtifactDescriptor::signature_for(&url));
    ArtifactDescriptor {
        tool_name: TOOL.to_string(),
        resolved_version: version,
        url,
        signature_url,
        binary_dir: binary_dir.to_string(),
        library_dirs,
        wrapper_executable: TOOL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::transport::fake::FakeTransport;
    use rstest::rstest;

    const STABLE_POINTER: &str = "https://downloads.dlang.org/releases/LATEST";
    const BETA_POINTER: &str = "https://downloads.dlang.org/pre-releases/LATEST";

    fn resolver(fake: Arc<FakeTransport>) -> DmdResolver {
        DmdResolver::new(fake, None)
    }

    async fn resolve(
        resolver: &mut DmdResolver,
        spec: &str,
        platform: Platform,
    ) -> Result<ArtifactDescriptor, ResolveError> {
        resolver.resolve(spec, platform, Arch::X64).await
    }

    fn offline() -> Arc<FakeTransport> {
        Arc::new(FakeTransport::new())
    }

    #[rstest]
    #[case(
        Platform::Linux,
        "https://downloads.dlang.org/releases/2.x/2.109.1/dmd.2.109.1.linux.tar.xz",
        "/dmd2/linux/bin64",
        vec!["/dmd2/linux/lib64"]
    )]
    #[case(
        Platform::Windows,
        "https://downloads.dlang.org/releases/2.x/2.109.1/dmd.2.109.1.windows.7z",
        r"\dmd2\windows\bin64",
        vec![r"\dmd2\windows\bin", r"\dmd2\windows\bin64"]
    )]
    #[case(
        Platform::Macos,
        "https://downloads.dlang.org/releases/2.x/2.109.1/dmd.2.109.1.osx.tar.xz",
        "/dmd2/osx/bin",
        vec!["/dmd2/osx/lib"]
    )]
    #[tokio::test]
    async fn exact_versions_resolve_without_network(
        #[case] platform: Platform,
        #[case] url: &str,
        #[case] binary_dir: &str,
        #[case] library_dirs: Vec<&str>,
    ) {
        let mut resolver = resolver(offline());
        let artifact = resolve(&mut resolver, "dmd-2.109.1", platform).await.unwrap();

        assert_eq!(artifact.tool_name, "dmd");
        assert_eq!(artifact.resolved_version, "2.109.1");
        assert_eq!(artifact.url, url);
        assert_eq!(artifact.signature_url.as_deref(), Some(&*format!("{}.sig", url)));
        assert_eq!(artifact.binary_dir, binary_dir);
        assert_eq!(artifact.library_dirs, library_dirs);
        assert_eq!(artifact.wrapper_executable, "dmd");
    }

    #[tokio::test]
    async fn zero_padded_minors_keep_their_padding() {
        let mut resolver = resolver(offline());
        let artifact = resolve(&mut resolver, "dmd-2.097.2", Platform::Linux)
            .await
            .unwrap();

        assert_eq!(artifact.resolved_version, "2.097.2");
        assert_eq!(
            artifact.url,
            "https://downloads.dlang.org/releases/2.x/2.097.2/dmd.2.097.2.linux.tar.xz"
        );
    }

    #[tokio::test]
    async fn exact_prereleases_use_the_prerelease_tree() {
        let mut resolver = resolver(offline());
        let artifact = resolve(&mut resolver, "dmd-2.110.0-beta.1", Platform::Linux)
            .await
            .unwrap();

        assert_eq!(artifact.resolved_version, "2.110.0-beta.1");
        assert_eq!(
            artifact.url,
            "https://downloads.dlang.org/pre-releases/2.x/2.110.0/dmd.2.110.0-beta.1.linux.tar.xz"
        );
        assert!(artifact.signature_url.is_some());
    }

    #[tokio::test]
    async fn oldest_supported_release_is_a_zip_without_win64_binaries() {
        let mut resolver = resolver(offline());

        let artifact = resolve(&mut resolver, "dmd-2.065.0", Platform::Linux)
            .await
            .unwrap();
        assert_eq!(
            artifact.url,
            "https://downloads.dlang.org/releases/2.x/2.065.0/dmd.2.065.0.linux.zip"
        );

        let artifact = resolve(&mut resolver, "dmd-2.065.0", Platform::Windows)
            .await
            .unwrap();
        assert_eq!(
            artifact.url,
            "https://downloads.dlang.org/releases/2.x/2.065.0/dmd.2.065.0.windows.zip"
        );
        assert_eq!(artifact.binary_dir, r"\dmd2\windows\bin");
    }

    #[tokio::test]
    async fn windows_64_bit_binaries_start_at_2_091() {
        let mut resolver = resolver(offline());

        let artifact = resolve(&mut resolver, "dmd-2.090.1", Platform::Windows)
            .await
            .unwrap();
        assert_eq!(artifact.binary_dir, r"\dmd2\windows\bin");

        let artifact = resolve(&mut resolver, "dmd-2.091.0-beta.1", Platform::Windows)
            .await
            .unwrap();
        assert_eq!(artifact.binary_dir, r"\dmd2\windows\bin64");
        // Lower-precedence 32-bit folder stays first.
        assert_eq!(
            artifact.library_dirs,
            vec![r"\dmd2\windows\bin".to_string(), r"\dmd2\windows\bin64".to_string()]
        );
    }

    #[rstest]
    #[case(
        Platform::Linux,
        "https://github.com/dlang/dmd/releases/download/nightly/dmd.master.linux.tar.xz"
    )]
    #[case(
        Platform::Windows,
        "https://github.com/dlang/dmd/releases/download/nightly/dmd.master.windows.7z"
    )]
    #[case(
        Platform::Macos,
        "https://github.com/dlang/dmd/releases/download/nightly/dmd.master.osx.tar.xz"
    )]
    #[tokio::test]
    async fn nightly_builds_are_unsigned(#[case] platform: Platform, #[case] url: &str) {
        let mut resolver = resolver(offline());
        let artifact = resolve(&mut resolver, "dmd-master", platform).await.unwrap();

        assert_eq!(artifact.resolved_version, "master");
        assert_eq!(artifact.url, url);
        assert_eq!(artifact.signature_url, None);
    }

    #[tokio::test]
    async fn latest_and_beta_follow_the_pointer_files() {
        let fake = Arc::new(
            FakeTransport::new()
                .respond_text(STABLE_POINTER, "v2.109.0\n")
                .respond_text(BETA_POINTER, "v2.109.1-rc.2\n"),
        );
        let mut resolver = resolver(fake);

        for spec in ["dmd", "dmd-latest"] {
            let artifact = resolve(&mut resolver, spec, Platform::Linux).await.unwrap();
            assert_eq!(artifact.resolved_version, "2.109.0");
        }

        let artifact = resolve(&mut resolver, "dmd-beta", Platform::Linux)
            .await
            .unwrap();
        assert_eq!(artifact.resolved_version, "2.109.1-rc.2");
    }

    #[tokio::test]
    async fn stale_beta_pointers_are_floored_to_stable() {
        let fake = Arc::new(
            FakeTransport::new()
                .respond_text(STABLE_POINTER, "v2.109.0")
                .respond_text(BETA_POINTER, "v2.109.0-beta.1"),
        );
        let mut resolver = resolver(fake);

        let artifact = resolve(&mut resolver, "dmd-beta", Platform::Linux)
            .await
            .unwrap();
        assert_eq!(artifact.resolved_version, "2.109.0");
    }

    #[tokio::test]
    async fn garbage_pointer_contents_surface_in_the_error() {
        let fake = Arc::new(
            FakeTransport::new()
                .respond_text(STABLE_POINTER, "YaBaDaBaDoo")
                .respond_text(BETA_POINTER, "YaBaDaBaDoo"),
        );
        let mut resolver = resolver(fake);

        let err = resolve(&mut resolver, "dmd", Platform::Linux)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("YaBaDaBaDoo"));
    }

    #[rstest]
    #[case("dmd-1")]
    #[case("dmd-alpha")]
    #[case("dmd-2.x")]
    #[case("dmd^")]
    #[case("dub")]
    #[case("ldc^4")]
    #[tokio::test]
    async fn unrecognized_specifiers_name_the_input(#[case] spec: &str) {
        let mut resolver = resolver(offline());
        let err = resolve(&mut resolver, spec, Platform::Linux)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains(spec));
        assert!(message.contains("dmd"));
    }
}
