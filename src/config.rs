use std::time::Duration;

// =============================================================================
// HTTP transport
// =============================================================================

/// User agent sent with every request.
pub const USER_AGENT: &str = "dlang-toolchain";

/// Delays applied after each failed attempt of a page/pointer request.
/// The transport gives up once all attempts are exhausted.
pub const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(5),
    Duration::from_secs(10),
    Duration::from_secs(20),
];

// =============================================================================
// Remote endpoints
// =============================================================================

/// GitHub REST API root (tag listings, release and asset lookups).
pub const GITHUB_API: &str = "https://api.github.com";

/// Root of the dmd release archives and LATEST pointer files.
pub const DLANG_DOWNLOADS: &str = "https://downloads.dlang.org";

/// Root of the ldc LATEST / LATEST_BETA pointer files.
pub const LDC_PAGES: &str = "https://ldc-developers.github.io";
