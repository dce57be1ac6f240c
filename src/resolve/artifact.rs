//! The resolved artifact handed to the download/install collaborators.

use serde::Serialize;

/// Everything an installer needs to fetch and wire up one toolchain build on
/// one platform/architecture pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    /// Executable name of the tool, also used as its cache key.
    pub tool_name: String,
    /// The concrete version this resolution produced. For CI builds this is
    /// a short commit identifier or the literal `master`.
    pub resolved_version: String,
    /// Download URL of the release archive.
    pub url: String,
    /// Detached signature next to the archive; CI builds carry none.
    pub signature_url: Option<String>,
    /// Sub-folder of the archive holding the tool binaries, starting with the
    /// platform's path separator.
    pub binary_dir: String,
    /// Archive sub-folders to prepend to the library search path, in order.
    /// The installer prepends each in turn, so the *last* entry ends up with
    /// the highest precedence; legacy paths come first.
    pub library_dirs: Vec<String>,
    /// Basename (no extension) of the dmd-style wrapper executable, e.g.
    /// `ldmd2` or `gdmd-12`.
    pub wrapper_executable: String,
}

impl ArtifactDescriptor {
    /// The signature URL convention for signed archives: the artifact URL
    /// with `.sig` appended.
    pub fn signature_for(url: &str) -> String {
        format!("{}.sig", url)
    }
}
