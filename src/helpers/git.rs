//! Git helpers - shallow clones of version-control mirrors
//!
//! Clones shell out to the `git` binary. Credentials never appear in argv or
//! in the clone URL: they are handed to the child process as an
//! `http.extraHeader` through git's `GIT_CONFIG_*` environment channel, which
//! lives only as long as the child.

use crate::core::output;
use crate::source::{Credentials, FetchCause};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::process::{Command, Stdio};

use super::download::basic_auth_header;
use super::internal::progress::{self, ProgressGuard};
use super::internal::url_utils;

/// Validate that a URL uses a scheme git can clone from here.
/// `https://`, `http://`, `ssh://`, `git@` and `file://` are accepted.
pub fn validate_git_url(url: &str) -> Result<(), FetchCause> {
    match url_utils::url_scheme(url).as_deref() {
        Some("https" | "http" | "ssh" | "file") => Ok(()),
        Some(other) => Err(FetchCause::UnsupportedTransport(other.to_string())),
        None => Err(FetchCause::UnsupportedTransport(format!(
            "not a repository URL: {}",
            url
        ))),
    }
}

/// Options for [`shallow_clone`].
#[derive(Debug, Clone, Copy)]
pub struct CloneOptions<'a> {
    pub branch: &'a str,
    pub credentials: Option<&'a Credentials>,
}

/// Depth-1, single-branch clone of `url` into `dest`.
///
/// `dest` must be empty or absent. Returns the committer timestamp of the
/// cloned HEAD when git reports one.
pub fn shallow_clone(
    url: &str,
    dest: &Path,
    options: &CloneOptions<'_>,
) -> Result<Option<DateTime<Utc>>, FetchCause> {
    validate_git_url(url)?;
    let display_url = url_utils::redact_url(url);

    let dest_str = dest
        .to_str()
        .ok_or_else(|| FetchCause::Git("destination path contains invalid UTF-8".into()))?;

    output::detail(&format!(
        "git clone --depth 1 --branch {} {}",
        options.branch, display_url
    ));
    let _guard = ProgressGuard(progress::create_spinner(&format!(
        "shallow cloning {}",
        display_url
    )));

    let mut cmd = Command::new("git");
    cmd.args([
        "clone",
        "--depth",
        "1",
        "--single-branch",
        "--branch",
        options.branch,
        "--",
        url,
        dest_str,
    ])
    .env("GIT_TERMINAL_PROMPT", "0")
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::piped());

    if let Some(credentials) = options.credentials {
        cmd.env("GIT_CONFIG_COUNT", "1")
            .env("GIT_CONFIG_KEY_0", "http.extraHeader")
            .env(
                "GIT_CONFIG_VALUE_0",
                format!("Authorization: {}", basic_auth_header(credentials)),
            );
    }

    let out = cmd
        .output()
        .map_err(|e| FetchCause::Git(format!("failed to run git: {}", e)))?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(FetchCause::Git(format!(
            "clone failed for {} (branch {})\nDetails: {}",
            display_url,
            options.branch,
            stderr.trim()
        )));
    }

    output::detail(&format!("cloned {} to {}", display_url, dest.display()));
    Ok(head_commit_time(dest))
}

/// Committer timestamp of HEAD in `repo`, if readable.
pub fn head_commit_time(repo: &Path) -> Option<DateTime<Utc>> {
    let out = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["log", "-1", "--format=%cI"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    parse_commit_time(&String::from_utf8_lossy(&out.stdout))
}

fn parse_commit_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
