use super::{FetchHandler, required};
use crate::core::output;
use crate::helpers::git::{self, CloneOptions};
use crate::helpers::internal::fs_utils;
use crate::source::{Credentials, ProvenanceDescriptor, ProvenanceMode, SourceError, SourceMetadata};
use std::path::Path;

/// Shallow, single-branch clone of a version-control mirror.
#[derive(Debug)]
pub struct GitHandler<'a> {
    url: &'a str,
    branch: &'a str,
    credentials: Option<&'a Credentials>,
}

impl<'a> GitHandler<'a> {
    pub fn new(descriptor: &'a ProvenanceDescriptor) -> Result<Self, SourceError> {
        let url = descriptor
            .location
            .as_deref()
            .ok_or_else(|| required(ProvenanceMode::VersionedControl, "location"))?;
        Ok(Self {
            url,
            branch: descriptor.branch(),
            credentials: descriptor.credentials.as_ref(),
        })
    }
}

impl FetchHandler for GitHandler<'_> {
    fn mode(&self) -> ProvenanceMode {
        ProvenanceMode::VersionedControl
    }

    fn fetch(&self, destination: &Path) -> Result<SourceMetadata, SourceError> {
        // git refuses to clone into a non-empty directory
        if !fs_utils::is_empty_dir(destination) {
            output::warning(&format!(
                "{} is not empty, clearing before clone",
                destination.display()
            ));
            fs_utils::reset_dir(destination).map_err(|c| self.fail(c))?;
        }
        self.prepare(destination)?;

        let options = CloneOptions {
            branch: self.branch,
            credentials: self.credentials,
        };
        let committed_at =
            git::shallow_clone(self.url, destination, &options).map_err(|c| self.fail(c))?;

        let mut metadata = SourceMetadata::new("git", destination).with_origin(Some(self.url));
        if let Some(committed_at) = committed_at {
            metadata = metadata.with_fetched_at(committed_at);
        }
        Ok(metadata)
    }
}
