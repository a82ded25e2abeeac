//! Provenance descriptors - where source material comes from
//!
//! A [`ProvenanceDescriptor`] is a read-only value built from user
//! configuration. It names a [`ProvenanceMode`], the location to fetch from,
//! optional credentials, and an optional verification policy.
//!
//! ## Example
//!
//! ```
//! use vectorweight_sources::{ProvenanceDescriptor, Verification};
//!
//! let desc = ProvenanceDescriptor::archive("https://mirror.lan/charts.tar.gz")
//!     .with_verification(Verification::sha256("ab12cd34"));
//! assert!(desc.validate().is_ok());
//! ```

use super::error::SourceError;
use crate::helpers::extract::ArchiveFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default branch for versioned-control sources.
pub const DEFAULT_BRANCH: &str = "main";

/// How source material is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProvenanceMode {
    /// Use external package repositories directly; nothing to fetch.
    Direct,
    /// Shallow clone of a version-control mirror.
    VersionedControl,
    /// Copy from the local filesystem.
    LocalPath,
    /// Download from a network location.
    Network,
    /// Download (or pick up) an archive and extract it.
    Archive,
}

impl ProvenanceMode {
    pub const ALL: [ProvenanceMode; 5] = [
        Self::Direct,
        Self::VersionedControl,
        Self::LocalPath,
        Self::Network,
        Self::Archive,
    ];

    /// Canonical tag used in configuration and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::VersionedControl => "versioned-control",
            Self::LocalPath => "local-path",
            Self::Network => "network",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for ProvenanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ProvenanceMode {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "internet" => Ok(Self::Direct),
            "versioned-control" | "vc" | "git" | "airgapped-vc" => Ok(Self::VersionedControl),
            "local-path" | "local" | "airgapped-local" => Ok(Self::LocalPath),
            "network" | "airgapped-network" => Ok(Self::Network),
            "archive" | "airgapped-archive" => Ok(Self::Archive),
            other => Err(SourceError::Configuration(format!(
                "unsupported source mode: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ProvenanceMode {
    type Error = SourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProvenanceMode> for String {
    fn from(mode: ProvenanceMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Supported checksum algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Sha512,
    Sha3_256,
    Sha3_512,
    Blake3,
}

impl ChecksumAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_512 => "SHA3-512",
            Self::Blake3 => "BLAKE3",
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Sha3_256 => "sha3-256",
            Self::Sha3_512 => "sha3-512",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' { '-' } else { c })
            .collect();
        match normalized.as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            "sha3-256" => Ok(Self::Sha3_256),
            "sha3-512" => Ok(Self::Sha3_512),
            "blake3" => Ok(Self::Blake3),
            _ => Err(SourceError::Configuration(format!(
                "unsupported checksum algorithm: {}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ChecksumAlgorithm {
    type Error = SourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChecksumAlgorithm> for String {
    fn from(algorithm: ChecksumAlgorithm) -> Self {
        algorithm.tag().to_string()
    }
}

/// Integrity policy attached to a descriptor.
///
/// Verification is opt-in: without a `checksum` it trivially passes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Verification {
    pub checksum: Option<String>,
    #[serde(default)]
    pub algorithm: ChecksumAlgorithm,
    pub signature: Option<PathBuf>,
    pub gpg_key_id: Option<String>,
}

impl Verification {
    pub fn new(checksum: impl Into<String>, algorithm: ChecksumAlgorithm) -> Self {
        Self {
            checksum: Some(checksum.into()),
            algorithm,
            ..Self::default()
        }
    }

    pub fn sha256(checksum: impl Into<String>) -> Self {
        Self::new(checksum, ChecksumAlgorithm::Sha256)
    }
}

/// A password or token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: Option<Secret>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Some(Secret::new(secret)),
        }
    }
}

/// Where source material for a deployment originates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceDescriptor {
    pub mode: ProvenanceMode,
    /// URL or filesystem path, interpreted per `mode`.
    pub location: Option<String>,
    pub path: Option<PathBuf>,
    pub credentials: Option<Credentials>,
    pub verification: Option<Verification>,
    /// Overrides extension detection for `mode = archive`.
    pub archive_format: Option<ArchiveFormat>,
    /// Branch to clone for `mode = versioned-control`.
    pub branch: Option<String>,
}

impl ProvenanceDescriptor {
    pub fn new(mode: ProvenanceMode) -> Self {
        Self {
            mode,
            location: None,
            path: None,
            credentials: None,
            verification: None,
            archive_format: None,
            branch: None,
        }
    }

    pub fn direct() -> Self {
        Self::new(ProvenanceMode::Direct)
    }

    pub fn git(url: impl Into<String>) -> Self {
        Self::new(ProvenanceMode::VersionedControl).with_location(url)
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::new(ProvenanceMode::LocalPath).with_path(path)
    }

    pub fn network(url: impl Into<String>) -> Self {
        Self::new(ProvenanceMode::Network).with_location(url)
    }

    /// An archive given as a URL or local file path.
    pub fn archive(location: impl Into<String>) -> Self {
        Self::new(ProvenanceMode::Archive).with_location(location)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_verification(mut self, verification: Verification) -> Self {
        self.verification = Some(verification);
        self
    }

    pub fn with_archive_format(mut self, format: ArchiveFormat) -> Self {
        self.archive_format = Some(format);
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Filesystem path for local sources: `path`, else `location`.
    pub fn local_source(&self) -> Option<&Path> {
        self.path
            .as_deref()
            .or_else(|| self.location.as_deref().map(Path::new))
    }

    /// Check that the fields required by `mode` are present.
    ///
    /// Existence of local paths is checked at fetch time, not here.
    pub fn validate(&self) -> Result<(), SourceError> {
        let missing = |field: &str| {
            Err(SourceError::Configuration(format!(
                "{} source requires `{}`",
                self.mode, field
            )))
        };
        let has_location = self.location.as_deref().is_some_and(|l| !l.trim().is_empty());

        match self.mode {
            ProvenanceMode::Direct => Ok(()),
            ProvenanceMode::VersionedControl | ProvenanceMode::Network => {
                if has_location {
                    Ok(())
                } else {
                    missing("location")
                }
            }
            ProvenanceMode::LocalPath | ProvenanceMode::Archive => {
                if has_location || self.path.is_some() {
                    Ok(())
                } else {
                    missing("location` or `path")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_aliases() {
        assert_eq!("internet".parse::<ProvenanceMode>().unwrap(), ProvenanceMode::Direct);
        assert_eq!(
            "airgapped-vc".parse::<ProvenanceMode>().unwrap(),
            ProvenanceMode::VersionedControl
        );
        assert_eq!(
            "Airgapped-Local".parse::<ProvenanceMode>().unwrap(),
            ProvenanceMode::LocalPath
        );
        assert_eq!(
            "airgapped-network".parse::<ProvenanceMode>().unwrap(),
            ProvenanceMode::Network
        );
        assert_eq!(
            "airgapped-archive".parse::<ProvenanceMode>().unwrap(),
            ProvenanceMode::Archive
        );
    }

    #[test]
    fn test_mode_round_trips_through_canonical_tag() {
        for mode in ProvenanceMode::ALL {
            assert_eq!(mode.as_str().parse::<ProvenanceMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_unknown_mode_names_the_mode() {
        let err = "carrier-pigeon".parse::<ProvenanceMode>().unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_checksum_algorithm_spellings() {
        for s in ["sha256", "SHA256", "sha-256", "SHA-256"] {
            assert_eq!(s.parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha256);
        }
        assert_eq!(
            "sha3_256".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Sha3_256
        );
        assert_eq!("blake3".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Blake3);
        assert!("md5".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_verification_defaults_to_sha256() {
        assert_eq!(Verification::default().algorithm, ChecksumAlgorithm::Sha256);
        assert!(Verification::default().checksum.is_none());
    }

    #[test]
    fn test_secret_is_redacted() {
        let creds = Credentials::new("deploy", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("deploy"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_validate_required_fields() {
        assert!(ProvenanceDescriptor::direct().validate().is_ok());
        assert!(ProvenanceDescriptor::git("https://git.lan/a.git").validate().is_ok());
        assert!(ProvenanceDescriptor::local("/tmp").validate().is_ok());

        let err = ProvenanceDescriptor::new(ProvenanceMode::VersionedControl)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("requires `location`"));

        let err = ProvenanceDescriptor::new(ProvenanceMode::Archive)
            .validate()
            .unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));

        let blank = ProvenanceDescriptor::network("  ");
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_local_source_prefers_path() {
        let desc = ProvenanceDescriptor::new(ProvenanceMode::LocalPath)
            .with_location("/from/location")
            .with_path("/from/path");
        assert_eq!(desc.local_source(), Some(Path::new("/from/path")));

        let desc = ProvenanceDescriptor::new(ProvenanceMode::LocalPath).with_location("/only");
        assert_eq!(desc.local_source(), Some(Path::new("/only")));
    }

    #[test]
    fn test_branch_default() {
        assert_eq!(ProvenanceDescriptor::git("https://x/y.git").branch(), "main");
        assert_eq!(
            ProvenanceDescriptor::git("https://x/y.git")
                .with_branch("release")
                .branch(),
            "release"
        );
    }
}
