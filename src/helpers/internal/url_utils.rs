//! URL parsing and filename derivation utilities

use url::Url;

/// Name used when neither the response nor the URL yields a filename.
pub const FALLBACK_FILENAME: &str = "downloaded_file";

/// Lowercase scheme of `location`, or `None` if it is not an absolute URL.
///
/// `git@host:org/repo` scp-style locations report `ssh`.
pub fn url_scheme(location: &str) -> Option<String> {
    if location.starts_with("git@") {
        return Some("ssh".to_string());
    }
    let parsed = Url::parse(location).ok()?;
    // Single letters are Windows drive prefixes, not schemes.
    if parsed.scheme().len() < 2 {
        return None;
    }
    Some(parsed.scheme().to_ascii_lowercase())
}

/// Whether `location` is an HTTP(S) URL.
pub fn is_http(location: &str) -> bool {
    matches!(url_scheme(location).as_deref(), Some("http" | "https"))
}

/// Last non-empty path segment of a URL, sanitized.
///
/// # Example
/// ```ignore
/// assert_eq!(filename_from_url("https://example.com/foo-1.0.tar.gz?x=1"), Some("foo-1.0.tar.gz".into()));
/// assert_eq!(filename_from_url("https://example.com/"), None);
/// ```
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .rev()
        .find(|s| !s.is_empty())?
        .to_string();
    let decoded = percent_decode(&segment);
    let name = sanitize_filename(&decoded);
    (name != FALLBACK_FILENAME).then_some(name)
}

/// Extract the filename from a `Content-Disposition` header value.
///
/// Prefers the RFC 5987 `filename*=` form over plain `filename=`.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in value.split(';').map(str::trim) {
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // charset'lang'percent-encoded
                let encoded = raw.trim().trim_matches('"');
                let value = encoded.splitn(3, '\'').nth(2).unwrap_or(encoded);
                extended = Some(percent_decode(value));
            }
            "filename" => {
                plain = Some(raw.trim().trim_matches('"').to_string());
            }
            _ => {}
        }
    }

    extended
        .or(plain)
        .filter(|name| !name.is_empty())
        .map(|name| sanitize_filename(&name))
        .filter(|name| name != FALLBACK_FILENAME)
}

/// Strip credentials from a URL before it is logged or recorded.
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if !parsed.username().is_empty() || parsed.password().is_some() => {
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}

/// Percent-decoding for URL path segments and header parameters.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let Some(byte) = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        {
            out.push(byte);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Sanitize a filename for safe filesystem use.
///
/// Replaces path separators and other problematic characters.
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() || name == "." || name == ".." {
        return FALLBACK_FILENAME.to_string();
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Trim leading/trailing whitespace and dots
    let trimmed = sanitized.trim().trim_matches('.');

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}
