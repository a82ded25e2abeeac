//! Checksum verification for fetched artifacts
//!
//! The verifier answers a yes/no question and never raises on mismatch;
//! callers decide whether a mismatch is fatal.

use crate::core::output;
use crate::source::Verification;
use std::io;
use std::path::Path;

use super::internal::hash;

pub use super::internal::hash::FileHashes;

/// Outcome of checking one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No checksum configured.
    Skipped,
    Match,
    Mismatch { expected: String, actual: String },
}

impl Verdict {
    pub fn passed(&self) -> bool {
        !matches!(self, Self::Mismatch { .. })
    }
}

/// Check `artifact` against the configured checksum.
///
/// Absence of a checksum means verification trivially passes.
pub fn verify_checksum(artifact: &Path, verification: &Verification) -> io::Result<bool> {
    check(artifact, verification).map(|v| v.passed())
}

/// Like [`verify_checksum`] but keeps both digests for error reporting.
pub fn check(artifact: &Path, verification: &Verification) -> io::Result<Verdict> {
    let Some(expected) = verification.checksum.as_deref() else {
        return Ok(Verdict::Skipped);
    };

    output::detail(&format!(
        "verifying {} of {}",
        verification.algorithm.name().to_lowercase(),
        artifact.display()
    ));
    let (ok, actual) = hash::matches_file_hash(artifact, expected, verification.algorithm)?;
    if ok {
        Ok(Verdict::Match)
    } else {
        Ok(Verdict::Mismatch {
            expected: expected.trim().to_lowercase(),
            actual,
        })
    }
}

/// Compute all hashes for a file (used by `vwsources hash`)
pub fn compute_hashes(file: &Path) -> io::Result<FileHashes> {
    hash::compute_all_hashes(file)
}
