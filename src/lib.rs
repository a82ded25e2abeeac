//! Source acquisition and caching for vectorweight deployments
//!
//! Deployment tooling needs source material (charts, manifests, bundles) that
//! may come from the internet, an internal git mirror, a local directory, a
//! network share, or an offline archive. This crate fetches each source into a
//! process-owned scratch directory, optionally verifies it, and caches the
//! result so the same source is fetched at most once per [`SourceManager`].
//!
//! # Example
//!
//! ```no_run
//! use vectorweight_sources::{ProvenanceDescriptor, SourceManager, Verification};
//!
//! let mut manager = SourceManager::new()?;
//! let charts = ProvenanceDescriptor::archive("https://mirror.lan/charts.tar.gz")
//!     .with_verification(Verification::sha256("9f86d081884c7d65..."));
//!
//! let metadata = manager.fetch_source(&charts)?;
//! println!("charts extracted to {}", metadata.local_path.display());
//! // the scratch root is removed when `manager` is dropped
//! # Ok::<(), vectorweight_sources::SourceError>(())
//! ```
//!
//! # Provenance Modes
//!
//! - `direct` - nothing to fetch, packages come from upstream repositories
//! - `versioned-control` - shallow single-branch git clone
//! - `local-path` - copy a file or directory tree
//! - `network` - download one artifact over HTTP(S)
//! - `archive` - extract a local or downloaded tar/zip archive
//!
//! # Environment
//!
//! - `VW_SOURCES_SCRATCH` - directory that holds the scratch root instead of the system temp dir
//! - `VW_SOURCES_HTTP_TIMEOUT` - per-request HTTP timeout in seconds
//! - `VW_SOURCES_FILE` - sources file used by the `vwsources` CLI

pub mod config;
pub mod core;
pub mod helpers;
pub mod source;

pub use crate::core::output;
pub use crate::core::FetchSettings;
pub use source::{
    ChecksumAlgorithm, Credentials, FetchCause, ProvenanceDescriptor, ProvenanceMode, Secret,
    SourceError, SourceManager, SourceMetadata, Verification, cache_key,
};
