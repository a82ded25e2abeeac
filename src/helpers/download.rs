//! Streamed HTTP(S) downloads
//!
//! Response bodies are copied to disk in fixed-size chunks; the payload is
//! never held in memory. Bytes land in `<name>.part` first and are renamed
//! only after the body has been read to the end, so an interrupted transfer
//! never leaves a file that looks complete.

use crate::core::output;
use crate::source::{Credentials, FetchCause};
use base64::Engine;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::internal::fs_utils;
use super::internal::progress::{self, ProgressGuard, upgrade_to_bytes};
use super::internal::url_utils::{self, FALLBACK_FILENAME};

/// Read buffer for response bodies (64KB)
const CHUNK_SIZE: usize = 64 * 1024;

/// Request options shared by the network and archive handlers.
#[derive(Debug, Clone, Copy)]
pub struct DownloadOptions<'a> {
    pub credentials: Option<&'a Credentials>,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub user_agent: &'a str,
}

/// A completed download.
#[derive(Debug, Clone)]
pub struct Downloaded {
    pub path: PathBuf,
    pub bytes: u64,
}

/// `Authorization` header value for HTTP basic auth.
pub(crate) fn basic_auth_header(credentials: &Credentials) -> String {
    let secret = credentials
        .secret
        .as_ref()
        .map(|s| s.expose())
        .unwrap_or_default();
    let token = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", credentials.username, secret));
    format!("Basic {}", token)
}

/// Download `url` into directory `dir`.
///
/// The file is named from the `Content-Disposition` header, else the last
/// path segment of the (final, post-redirect) URL, else `downloaded_file`.
pub fn download_into(
    url: &str,
    dir: &Path,
    options: &DownloadOptions<'_>,
) -> Result<Downloaded, FetchCause> {
    fs_utils::ensure_dir(dir)?;
    let display_url = url_utils::redact_url(url);

    let mut request = ureq::get(url).set("User-Agent", options.user_agent);
    if let Some(timeout) = options.timeout {
        request = request.timeout(timeout);
    }
    if let Some(credentials) = options.credentials {
        request = request.set("Authorization", &basic_auth_header(credentials));
    }

    output::detail(&format!("GET {}", display_url));
    let response = request.call().map_err(|e| match e {
        ureq::Error::Status(status, _) => FetchCause::Http {
            url: display_url.clone(),
            status,
        },
        ureq::Error::Transport(t) => FetchCause::Transport(t.to_string()),
    })?;

    let filename = response
        .header("content-disposition")
        .and_then(url_utils::filename_from_content_disposition)
        .or_else(|| url_utils::filename_from_url(response.get_url()))
        .or_else(|| url_utils::filename_from_url(url))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
    let content_length = response
        .header("content-length")
        .and_then(|s| s.parse::<u64>().ok());

    let dest = dir.join(&filename);
    let partial = dir.join(format!("{}.part", filename));

    let pb = ProgressGuard(progress::create_spinner(&format!("downloading {}", filename)));
    if let Some(len) = content_length {
        upgrade_to_bytes(&pb.0, len);
    }

    let copied = stream_to_file(response.into_reader(), &partial, |n| pb.0.set_position(n));
    drop(pb);

    let bytes = match copied {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }
    };

    if let Some(expected) = content_length
        && bytes != expected
    {
        let _ = std::fs::remove_file(&partial);
        return Err(FetchCause::Transport(format!(
            "short read from {}: expected {} bytes, got {}",
            display_url, expected, bytes
        )));
    }

    std::fs::rename(&partial, &dest).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        FetchCause::io(format!("cannot move download to {}", dest.display()), e)
    })?;

    output::detail(&format!("downloaded {} ({} bytes)", filename, bytes));
    Ok(Downloaded { path: dest, bytes })
}

fn stream_to_file(
    mut reader: impl Read,
    dest: &Path,
    mut on_progress: impl FnMut(u64),
) -> Result<u64, FetchCause> {
    let mut file = std::fs::File::create(dest)
        .map_err(|e| FetchCause::io(format!("cannot create {}", dest.display()), e))?;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| FetchCause::Transport(format!("read error: {}", e)))?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])
            .map_err(|e| FetchCause::io(format!("write error for {}", dest.display()), e))?;
        total_bytes += n as u64;
        on_progress(total_bytes);
    }

    file.flush()
        .map_err(|e| FetchCause::io(format!("write error for {}", dest.display()), e))?;
    Ok(total_bytes)
}
