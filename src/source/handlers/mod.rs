//! Fetch handlers, one per provenance mode
//!
//! Every handler materializes its descriptor into a destination directory
//! and returns the [`SourceMetadata`] describing the result, or an error.
//! A handler never returns metadata for a partial fetch.
//!
//! [`handler_for`] is the only place a mode is mapped to an implementation;
//! the match is exhaustive, so a new [`ProvenanceMode`] variant does not
//! compile until it has a handler.

mod archive;
mod direct;
mod git;
mod local;
mod network;

pub use archive::ArchiveHandler;
pub use direct::DirectHandler;
pub use git::GitHandler;
pub use local::LocalHandler;
pub use network::NetworkHandler;

use super::descriptor::{ProvenanceDescriptor, ProvenanceMode};
use super::error::{FetchCause, SourceError};
use super::metadata::SourceMetadata;
use crate::core::FetchSettings;
use crate::helpers::internal::fs_utils;
use std::path::Path;

/// Materializes one kind of source into a local directory.
pub trait FetchHandler {
    fn mode(&self) -> ProvenanceMode;

    /// Fetch into `destination`, which may or may not already exist.
    fn fetch(&self, destination: &Path) -> Result<SourceMetadata, SourceError>;

    /// Wrap a cause in this handler's mode.
    fn fail(&self, cause: FetchCause) -> SourceError {
        SourceError::fetch(self.mode(), cause)
    }

    /// Create `destination` if it is missing.
    fn prepare(&self, destination: &Path) -> Result<(), SourceError> {
        fs_utils::ensure_dir(destination).map_err(|c| self.fail(c))
    }
}

/// Build the handler for `descriptor.mode`.
///
/// Fails with [`SourceError::Configuration`] when the descriptor lacks a
/// field its mode requires.
pub fn handler_for<'a>(
    descriptor: &'a ProvenanceDescriptor,
    settings: &'a FetchSettings,
) -> Result<Box<dyn FetchHandler + 'a>, SourceError> {
    descriptor.validate()?;

    Ok(match descriptor.mode {
        ProvenanceMode::Direct => Box::new(DirectHandler),
        ProvenanceMode::VersionedControl => Box::new(GitHandler::new(descriptor)?),
        ProvenanceMode::LocalPath => Box::new(LocalHandler::new(descriptor)?),
        ProvenanceMode::Network => Box::new(NetworkHandler::new(descriptor, settings)?),
        ProvenanceMode::Archive => Box::new(ArchiveHandler::new(descriptor, settings)?),
    })
}

/// Shared "field is required" error for handler constructors.
fn required(mode: ProvenanceMode, field: &str) -> SourceError {
    SourceError::Configuration(format!("{} source requires `{}`", mode, field))
}
