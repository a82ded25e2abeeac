//! Runtime settings for the source manager
//!
//! Settings come from explicit construction or from the environment:
//!
//! - `VW_SOURCES_SCRATCH` - directory that holds the scratch root (default: system temp)
//! - `VW_SOURCES_HTTP_TIMEOUT` - per-request HTTP timeout in seconds
//!   (default: none, requests may block indefinitely)

use std::path::PathBuf;
use std::time::Duration;

pub const SCRATCH_ENV: &str = "VW_SOURCES_SCRATCH";
pub const HTTP_TIMEOUT_ENV: &str = "VW_SOURCES_HTTP_TIMEOUT";

const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Knobs shared by every handler a manager dispatches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Directory the manager allocates its scratch root in. `None` uses the
    /// system temp dir. The directory itself is never removed.
    pub scratch_root: Option<PathBuf>,
    /// Per-request HTTP timeout. `None` means no internal deadline.
    pub http_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            scratch_root: None,
            http_timeout: None,
            user_agent: concat!("vectorweight-sources/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchSettings {
    /// Defaults overlaid with the `VW_SOURCES_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(root) = lookup(SCRATCH_ENV).filter(|s| !s.trim().is_empty()) {
            settings.scratch_root = Some(PathBuf::from(root));
        }
        settings.http_timeout = lookup(HTTP_TIMEOUT_ENV)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)));
        settings
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }
}
