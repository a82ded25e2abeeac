use super::{FetchHandler, required};
use crate::core::output;
use crate::helpers::internal::fs_utils;
use crate::source::{FetchCause, ProvenanceDescriptor, ProvenanceMode, SourceError, SourceMetadata};
use std::path::Path;

/// Copies a file or directory tree from the local filesystem.
///
/// A file `x` lands at `destination/x`; a directory `d` is copied to
/// `destination/d/...`. Re-running overwrites in place.
#[derive(Debug)]
pub struct LocalHandler<'a> {
    source: &'a Path,
}

impl<'a> LocalHandler<'a> {
    pub fn new(descriptor: &'a ProvenanceDescriptor) -> Result<Self, SourceError> {
        let source = descriptor
            .local_source()
            .ok_or_else(|| required(ProvenanceMode::LocalPath, "path"))?;
        Ok(Self { source })
    }
}

impl FetchHandler for LocalHandler<'_> {
    fn mode(&self) -> ProvenanceMode {
        ProvenanceMode::LocalPath
    }

    fn fetch(&self, destination: &Path) -> Result<SourceMetadata, SourceError> {
        let metadata = std::fs::metadata(self.source).map_err(|e| {
            self.fail(match e.kind() {
                std::io::ErrorKind::NotFound => FetchCause::NotFound(self.source.to_path_buf()),
                _ => FetchCause::io(format!("cannot stat {}", self.source.display()), e),
            })
        })?;
        self.prepare(destination)?;

        // Paths like "/" or "dir/.." have no final component
        let target = match self.source.file_name() {
            Some(name) => destination.join(name),
            None => destination.to_path_buf(),
        };

        if metadata.is_dir() {
            let copied = fs_utils::copy_tree(self.source, &target).map_err(|c| self.fail(c))?;
            output::detail(&format!(
                "copied {} files from {}",
                copied,
                self.source.display()
            ));
        } else {
            fs_utils::copy_file(self.source, &target).map_err(|c| self.fail(c))?;
            output::detail(&format!("copied {}", self.source.display()));
        }

        Ok(SourceMetadata::new("local", destination))
    }
}
