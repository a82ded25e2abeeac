//! Fetch mechanics used by the source handlers
//!
//! ## Modules
//!
//! - **download**: streamed HTTP(S) downloads with basic auth
//! - **git**: shallow single-branch clones
//! - **verify**: checksum verification of fetched artifacts
//! - **extract**: native tar/zip extraction with path-safety checks
//!
//! Each helper takes explicit inputs and returns explicit outputs; none of
//! them know about descriptors or caching.

pub mod download;
pub mod extract;
pub mod git;
pub(crate) mod internal;
pub mod verify;

pub use download::{DownloadOptions, Downloaded, download_into};
pub use extract::{ArchiveFormat, detect_format, extract};
pub use git::{CloneOptions, shallow_clone};
pub use verify::{FileHashes, Verdict, compute_hashes, verify_checksum};
