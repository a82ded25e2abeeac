//! Metadata recorded for each successful fetch.

use super::descriptor::Verification;
use crate::helpers::internal::url_utils;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of a successful fetch. Created exactly once per fetch and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMetadata {
    /// Tag of the handler that produced this record (`git`, `local`, ...).
    pub source_type: String,
    pub origin_location: Option<String>,
    /// Directory holding the fetched content, inside the manager's scratch root.
    pub local_path: PathBuf,
    pub verification: Option<Verification>,
    /// For git sources this is the cloned commit's timestamp.
    pub fetched_at: DateTime<Utc>,
    /// The file a network fetch wrote into `local_path`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

impl SourceMetadata {
    pub fn new(source_type: &str, local_path: impl Into<PathBuf>) -> Self {
        Self {
            source_type: source_type.to_string(),
            origin_location: None,
            local_path: local_path.into(),
            verification: None,
            fetched_at: Utc::now(),
            artifact: None,
        }
    }

    /// Record where the content came from. Userinfo in a URL is dropped.
    pub fn with_origin(mut self, origin: Option<&str>) -> Self {
        self.origin_location = origin.map(url_utils::redact_url);
        self
    }

    pub fn with_verification(mut self, verification: Option<&Verification>) -> Self {
        self.verification = verification.cloned();
        self
    }

    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    pub fn with_artifact(mut self, artifact: impl Into<PathBuf>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    /// Whether the backing directory is still on disk.
    pub fn is_present(&self) -> bool {
        Path::new(&self.local_path).is_dir()
    }
}
