//! Source acquisition
//!
//! Describes where source material comes from ([`ProvenanceDescriptor`]),
//! fetches it through a per-mode [`FetchHandler`], and caches the results in
//! a [`SourceManager`].

pub mod descriptor;
pub mod error;
pub mod handlers;
pub mod manager;
pub mod metadata;

pub use descriptor::{
    ChecksumAlgorithm, Credentials, DEFAULT_BRANCH, ProvenanceDescriptor, ProvenanceMode, Secret,
    Verification,
};
pub use error::{FetchCause, SourceError};
pub use handlers::{FetchHandler, handler_for};
pub use manager::{SourceManager, cache_key};
pub use metadata::SourceMetadata;
