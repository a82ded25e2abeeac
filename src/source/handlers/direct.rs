use super::FetchHandler;
use crate::source::{ProvenanceMode, SourceError, SourceMetadata};
use std::path::Path;

/// Packages come straight from their upstream repositories; there is
/// nothing to fetch. The destination is left empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectHandler;

impl FetchHandler for DirectHandler {
    fn mode(&self) -> ProvenanceMode {
        ProvenanceMode::Direct
    }

    fn fetch(&self, destination: &Path) -> Result<SourceMetadata, SourceError> {
        self.prepare(destination)?;
        Ok(SourceMetadata::new("direct", destination))
    }
}
