use super::{FetchHandler, required};
use crate::core::FetchSettings;
use crate::core::output;
use crate::helpers::download::{self, DownloadOptions};
use crate::helpers::extract::{self, ArchiveFormat};
use crate::helpers::internal::url_utils;
use crate::helpers::verify::{self, Verdict};
use crate::source::{
    Credentials, FetchCause, ProvenanceDescriptor, ProvenanceMode, SourceError, SourceMetadata,
    Verification,
};
use std::path::{Path, PathBuf};

/// Where the archive comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ArchiveInput<'a> {
    File(&'a Path),
    Url(&'a str),
}

/// Extracts a local or downloaded archive into the destination.
///
/// When the descriptor carries a checksum the archive is verified first and
/// nothing is extracted on mismatch.
#[derive(Debug)]
pub struct ArchiveHandler<'a> {
    descriptor: &'a ProvenanceDescriptor,
    credentials: Option<&'a Credentials>,
    settings: &'a FetchSettings,
}

impl<'a> ArchiveHandler<'a> {
    pub fn new(
        descriptor: &'a ProvenanceDescriptor,
        settings: &'a FetchSettings,
    ) -> Result<Self, SourceError> {
        if descriptor.location.is_none() && descriptor.path.is_none() {
            return Err(required(ProvenanceMode::Archive, "location` or `path"));
        }
        Ok(Self {
            descriptor,
            credentials: descriptor.credentials.as_ref(),
            settings,
        })
    }

    /// An existing local file wins; otherwise the location must be a URL.
    fn input(&self) -> Result<ArchiveInput<'a>, FetchCause> {
        if let Some(path) = self.descriptor.path.as_deref()
            && path.is_file()
        {
            return Ok(ArchiveInput::File(path));
        }

        let Some(location) = self.descriptor.location.as_deref() else {
            let missing = self.descriptor.path.clone().unwrap_or_default();
            return Err(FetchCause::NotFound(missing));
        };

        if Path::new(location).is_file() {
            return Ok(ArchiveInput::File(Path::new(location)));
        }
        if url_utils::is_http(location) {
            return Ok(ArchiveInput::Url(location));
        }
        match url_utils::url_scheme(location) {
            Some(other) => Err(FetchCause::UnsupportedTransport(other)),
            None => Err(FetchCause::NotFound(PathBuf::from(location))),
        }
    }

    fn format_of(&self, archive: &Path) -> Result<ArchiveFormat, FetchCause> {
        match self.descriptor.archive_format {
            Some(format) => Ok(format),
            None => extract::detect_format(archive),
        }
    }

    fn verify(&self, archive: &Path, verification: &Verification) -> Result<(), SourceError> {
        let verdict = verify::check(archive, verification).map_err(|e| {
            self.fail(FetchCause::io(
                format!("cannot read {} for verification", archive.display()),
                e,
            ))
        })?;
        match verdict {
            Verdict::Mismatch { expected, actual } => Err(SourceError::Verification {
                path: archive.to_path_buf(),
                algorithm: verification.algorithm,
                expected,
                actual,
            }),
            Verdict::Match | Verdict::Skipped => Ok(()),
        }
    }

    fn unpack(&self, archive: &Path, destination: &Path) -> Result<(), SourceError> {
        let format = self.format_of(archive).map_err(|c| self.fail(c))?;
        if let Some(verification) = self.descriptor.verification.as_ref() {
            self.verify(archive, verification)?;
        }
        self.prepare(destination)?;
        extract::extract(archive, destination, format).map_err(|c| self.fail(c))
    }
}

impl FetchHandler for ArchiveHandler<'_> {
    fn mode(&self) -> ProvenanceMode {
        ProvenanceMode::Archive
    }

    fn fetch(&self, destination: &Path) -> Result<SourceMetadata, SourceError> {
        match self.input().map_err(|c| self.fail(c))? {
            ArchiveInput::File(archive) => self.unpack(archive, destination)?,
            ArchiveInput::Url(url) => {
                // Download beside the destination so the archive never ends
                // up among the extracted files.
                let parent = destination
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(std::env::temp_dir);
                std::fs::create_dir_all(&parent).map_err(|e| {
                    self.fail(FetchCause::io(
                        format!("cannot create directory {}", parent.display()),
                        e,
                    ))
                })?;
                let staging = tempfile::Builder::new()
                    .prefix(".download-")
                    .tempdir_in(&parent)
                    .map_err(|e| {
                        self.fail(FetchCause::io(
                            format!("cannot create staging dir in {}", parent.display()),
                            e,
                        ))
                    })?;

                let options = DownloadOptions {
                    credentials: self.credentials,
                    timeout: self.settings.http_timeout,
                    user_agent: &self.settings.user_agent,
                };
                let downloaded = download::download_into(url, staging.path(), &options)
                    .map_err(|c| self.fail(c))?;
                self.unpack(&downloaded.path, destination)?;
                output::detail(&format!("removing staged {}", downloaded.path.display()));
            }
        }

        Ok(SourceMetadata::new("archive", destination)
            .with_origin(self.descriptor.location.as_deref())
            .with_verification(self.descriptor.verification.as_ref()))
    }
}
