//! Streaming file hashing
//!
//! Files are read in fixed-size chunks so arbitrarily large artifacts never
//! sit in memory. Covers SHA-256/512, SHA3-256/512 and BLAKE3.

use crate::core::output;
use crate::source::ChecksumAlgorithm;
use indicatif::ProgressBar;
use sha2::Digest;
use std::io::{self, Read};
use std::path::Path;

use super::progress;

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Threshold for showing progress (100MB)
const PROGRESS_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Compute the lowercase hex digest of a file.
pub fn compute_file_hash(file: &Path, algorithm: ChecksumAlgorithm) -> io::Result<String> {
    let mut f = std::fs::File::open(file)?;
    let file_size = f.metadata().map(|m| m.len()).unwrap_or(0);

    let pb = (file_size > PROGRESS_THRESHOLD && !output::is_quiet())
        .then(|| progress::create_byte_progress(file_size));

    let hash = match algorithm {
        ChecksumAlgorithm::Sha256 => hash_reader::<sha2::Sha256>(&mut f, pb.as_ref()),
        ChecksumAlgorithm::Sha512 => hash_reader::<sha2::Sha512>(&mut f, pb.as_ref()),
        ChecksumAlgorithm::Sha3_256 => hash_reader::<sha3::Sha3_256>(&mut f, pb.as_ref()),
        ChecksumAlgorithm::Sha3_512 => hash_reader::<sha3::Sha3_512>(&mut f, pb.as_ref()),
        ChecksumAlgorithm::Blake3 => hash_blake3(&mut f, pb.as_ref()),
    };

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    hash
}

/// Compare a file's digest with an expected hex value (case-insensitive).
///
/// Returns the actual digest alongside the verdict so callers can report it.
pub fn matches_file_hash(
    file: &Path,
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> io::Result<(bool, String)> {
    let actual = compute_file_hash(file, algorithm)?;
    Ok((actual == expected.trim().to_lowercase(), actual))
}

fn hash_reader<D: Digest>(reader: &mut impl Read, pb: Option<&ProgressBar>) -> io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        if let Some(pb) = pb {
            pb.inc(n as u64);
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

/// BLAKE3 has its own hasher API.
fn hash_blake3(reader: &mut impl Read, pb: Option<&ProgressBar>) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        if let Some(pb) = pb {
            pb.inc(n as u64);
        }
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute all hashes for a file at once (for `vwsources hash`).
pub fn compute_all_hashes(file: &Path) -> io::Result<FileHashes> {
    let mut f = std::fs::File::open(file)?;
    let mut sha256_hasher = sha2::Sha256::new();
    let mut sha512_hasher = sha2::Sha512::new();
    let mut blake3_hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = f.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        sha256_hasher.update(&buffer[..n]);
        sha512_hasher.update(&buffer[..n]);
        blake3_hasher.update(&buffer[..n]);
    }

    Ok(FileHashes {
        sha256: hex::encode(sha256_hasher.finalize()),
        sha512: hex::encode(sha512_hasher.finalize()),
        blake3: blake3_hasher.finalize().to_hex().to_string(),
    })
}

/// Container for computed file hashes
#[derive(Debug, Clone)]
pub struct FileHashes {
    pub sha256: String,
    pub sha512: String,
    pub blake3: String,
}
