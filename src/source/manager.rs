//! Source orchestration and the per-manager fetch cache
//!
//! A [`SourceManager`] owns a scratch root and a cache of completed fetches.
//! Each descriptor is fetched at most once per manager: the cache key is
//! derived from the descriptor's non-secret fields, so re-requesting the same
//! source returns the recorded [`SourceMetadata`] without touching the
//! network or disk.
//!
//! The scratch root is always a directory the manager created itself. A
//! caller-supplied directory only hosts it, and anything else in there is
//! left alone. Dropping the manager removes the scratch root, on unwinding
//! paths too. Call [`SourceManager::into_scratch_root`] to keep the fetched
//! content.

use super::descriptor::ProvenanceDescriptor;
use super::error::SourceError;
use super::handlers::handler_for;
use super::metadata::SourceMetadata;
use crate::core::FetchSettings;
use crate::core::output;
use crate::helpers::internal::{fs_utils, url_utils};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Length of the hex cache key.
const CACHE_KEY_LEN: usize = 16;

const SCRATCH_PREFIX: &str = "vectorweight-sources-";

/// Deterministic, secret-free identifier for a descriptor.
///
/// Built from mode, location, path and username. Passwords and tokens never
/// contribute, so two descriptors that differ only in their secret share a
/// key.
pub fn cache_key(descriptor: &ProvenanceDescriptor) -> String {
    let path = descriptor
        .path
        .as_deref()
        .map(|p| p.to_string_lossy())
        .unwrap_or_default();
    let material = format!(
        "{}|{}|{}|{}",
        descriptor.mode,
        descriptor.location.as_deref().unwrap_or_default(),
        path,
        descriptor.username().unwrap_or_default(),
    );

    let digest = hex::encode(Sha256::digest(material.as_bytes()));
    digest[..CACHE_KEY_LEN].to_string()
}

/// Fetches sources into a private scratch root and caches the results.
#[derive(Debug)]
pub struct SourceManager {
    scratch_root: PathBuf,
    cache: HashMap<String, SourceMetadata>,
    settings: FetchSettings,
    fetch_count: usize,
    keep: bool,
}

impl SourceManager {
    /// Manager with default settings and a fresh temporary scratch root.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_settings(FetchSettings::default())
    }

    /// Manager whose scratch root is a fresh directory inside `parent`.
    /// `parent` is created if missing and is never removed.
    pub fn with_scratch_root(root: impl Into<PathBuf>) -> Result<Self, SourceError> {
        Self::with_settings(FetchSettings::default().with_scratch_root(root))
    }

    pub fn with_settings(settings: FetchSettings) -> Result<Self, SourceError> {
        let allocate_err = |e: std::io::Error| {
            SourceError::Configuration(format!("cannot allocate scratch root: {}", e))
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);

        let scratch_root = match settings.scratch_root.as_deref() {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SourceError::Configuration(format!(
                        "cannot create scratch directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
                builder.tempdir_in(parent).map_err(allocate_err)?.keep()
            }
            None => builder.tempdir().map_err(allocate_err)?.keep(),
        };

        Ok(Self {
            scratch_root,
            cache: HashMap::new(),
            settings,
            fetch_count: 0,
            keep: false,
        })
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Number of handler invocations so far. Cache hits do not count.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    /// Peek at the cache entry for `descriptor` without fetching.
    pub fn cached(&self, descriptor: &ProvenanceDescriptor) -> Option<&SourceMetadata> {
        self.cache.get(&cache_key(descriptor))
    }

    /// Fetch `descriptor` into the scratch root, or return the cached result.
    ///
    /// A cached entry whose directory has since disappeared is evicted and
    /// fetched again. On failure the destination is removed and nothing is
    /// cached; the handler's error is returned unchanged.
    pub fn fetch_source(
        &mut self,
        descriptor: &ProvenanceDescriptor,
    ) -> Result<SourceMetadata, SourceError> {
        let key = cache_key(descriptor);

        if let Some(hit) = self.cache.get(&key) {
            if hit.is_present() {
                output::skip(&format!(
                    "using cached {} source at {}",
                    descriptor.mode,
                    hit.local_path.display()
                ));
                return Ok(hit.clone());
            }
            output::detail(&format!(
                "cached {} is gone, fetching again",
                hit.local_path.display()
            ));
            self.cache.remove(&key);
        }

        let handler = handler_for(descriptor, &self.settings)?;
        let destination = self.scratch_root.join(format!("source_{}", key));
        output::action(&format!(
            "Fetching {} source{}",
            descriptor.mode,
            describe_origin(descriptor)
        ));

        self.fetch_count += 1;
        match handler.fetch(&destination) {
            Ok(metadata) => {
                output::success(&format!("{} -> {}", descriptor.mode, destination.display()));
                self.cache.insert(key, metadata.clone());
                Ok(metadata)
            }
            Err(err) => {
                if let Err(cause) = fs_utils::remove_dir_if_exists(&destination) {
                    output::warning(&format!("could not remove partial fetch: {}", cause));
                }
                Err(err)
            }
        }
    }

    /// Remove the scratch root and forget every cached fetch.
    ///
    /// The manager stays usable; the next fetch recreates the root.
    pub fn cleanup(&mut self) -> Result<(), SourceError> {
        self.cache.clear();
        fs_utils::remove_dir_if_exists(&self.scratch_root).map_err(|cause| {
            SourceError::Configuration(format!(
                "cannot remove scratch root {}: {}",
                self.scratch_root.display(),
                cause
            ))
        })
    }

    /// Consume the manager without deleting the scratch root.
    pub fn into_scratch_root(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.scratch_root)
    }
}

impl Drop for SourceManager {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(err) = self.cleanup() {
            output::warning(&err.to_string());
        }
    }
}

fn describe_origin(descriptor: &ProvenanceDescriptor) -> String {
    match (descriptor.location.as_deref(), descriptor.path.as_deref()) {
        (Some(location), _) => format!(" from {}", url_utils::redact_url(location)),
        (None, Some(path)) => format!(" from {}", path.display()),
        (None, None) => String::new(),
    }
}
