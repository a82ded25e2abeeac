//! Sources file loading
//!
//! A sources file names each source and describes where it comes from:
//!
//! ```toml
//! [sources.charts]
//! mode = "archive"
//! location = "https://mirror.lan/charts.tar.gz"
//!
//! [sources.charts.verification]
//! checksum = "ab12..."
//! algorithm = "sha256"
//!
//! [sources.mirror]
//! mode = "airgapped-vc"
//! location = "https://git.lan/homelab/charts.git"
//! username = "deploy"
//! token_env = "GIT_MIRROR_TOKEN"
//! ```
//!
//! Files ending in `.json` are read as JSON with the same shape. Unknown keys
//! are rejected, and every entry is validated as it is loaded.

use crate::helpers::extract::ArchiveFormat;
use crate::source::{Credentials, ProvenanceDescriptor, ProvenanceMode, SourceError, Verification};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Overrides the default sources file location.
pub const SOURCES_FILE_ENV: &str = "VW_SOURCES_FILE";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SourcesFile {
    #[serde(default)]
    sources: BTreeMap<String, SourceToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceToml {
    mode: ProvenanceMode,
    location: Option<String>,
    path: Option<PathBuf>,
    branch: Option<String>,
    archive_format: Option<String>,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    password_env: Option<String>,
    token_env: Option<String>,
    verification: Option<Verification>,
}

impl SourceToml {
    fn into_descriptor(
        self,
        name: &str,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<ProvenanceDescriptor, SourceError> {
        let invalid = |msg: String| SourceError::Configuration(format!("source '{}': {}", name, msg));

        let mut descriptor = ProvenanceDescriptor::new(self.mode);
        descriptor.location = self.location;
        descriptor.path = self.path;
        descriptor.branch = self.branch;
        descriptor.verification = self.verification;

        if let Some(format) = self.archive_format {
            descriptor.archive_format = Some(format.parse::<ArchiveFormat>().map_err(invalid)?);
        }

        let from_env = |var: Option<&str>| {
            var.map(|var| env_secret(var, lookup))
                .transpose()
                .map_err(invalid)
        };
        let secrets = [
            ("token", self.token),
            ("password", self.password),
            ("token_env", from_env(self.token_env.as_deref())?),
            ("password_env", from_env(self.password_env.as_deref())?),
        ];
        let mut given = secrets.into_iter().filter_map(|(key, value)| value.map(|v| (key, v)));
        let secret = given.next();
        if let Some((second, _)) = given.next() {
            return Err(invalid(format!(
                "`{}` conflicts with `{}`; set only one secret",
                second,
                secret.map(|(key, _)| key).unwrap_or_default()
            )));
        }

        descriptor.credentials = match (self.username, secret) {
            (Some(username), Some((_, secret))) => Some(Credentials::new(username, secret)),
            (Some(username), None) => Some(Credentials {
                username,
                secret: None,
            }),
            (None, Some((key, _))) => {
                return Err(invalid(format!("`{}` requires `username`", key)));
            }
            (None, None) => None,
        };

        descriptor.validate().map_err(|e| match e {
            SourceError::Configuration(msg) => invalid(msg),
            other => other,
        })?;
        Ok(descriptor)
    }
}

fn env_secret(var: &str, lookup: &impl Fn(&str) -> Option<String>) -> Result<String, String> {
    lookup(var)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("environment variable {} is not set", var))
}

/// Default location of the sources file.
///
/// `$VW_SOURCES_FILE` if set, else `<config dir>/vectorweight/sources.toml`.
pub fn default_sources_file() -> PathBuf {
    if let Ok(raw) = std::env::var(SOURCES_FILE_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".").join(".config"))
        .join("vectorweight")
        .join("sources.toml")
}

/// Load every source in `path`, keyed by name.
pub fn load_sources(path: &Path) -> Result<BTreeMap<String, ProvenanceDescriptor>, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        SourceError::Configuration(format!("Failed to read {}: {e}", path.display()))
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    parse_sources(&text, is_json, |key| std::env::var(key).ok()).map_err(|e| match e {
        SourceError::Configuration(msg) => {
            SourceError::Configuration(format!("{} (in {})", msg, path.display()))
        }
        other => other,
    })
}

fn parse_sources(
    text: &str,
    is_json: bool,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<BTreeMap<String, ProvenanceDescriptor>, SourceError> {
    let file: SourcesFile = if is_json {
        serde_json::from_str(text)
            .map_err(|e| SourceError::Configuration(format!("Invalid JSON: {e}")))?
    } else {
        toml::from_str(text).map_err(|e| SourceError::Configuration(format!("Invalid TOML: {e}")))?
    };

    file.sources
        .into_iter()
        .map(|(name, source)| {
            let descriptor = source.into_descriptor(&name, &lookup)?;
            Ok((name, descriptor))
        })
        .collect()
}
