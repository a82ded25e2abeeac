//! Common filesystem utilities
//!
//! Shared directory and copy operations used by the fetch handlers. Errors
//! carry the path that failed.

use crate::source::FetchCause;
use std::path::Path;
use walkdir::WalkDir;

/// Create a directory and all ancestors. Succeeds if it already exists.
pub fn ensure_dir(path: &Path) -> Result<(), FetchCause> {
    std::fs::create_dir_all(path)
        .map_err(|e| FetchCause::io(format!("cannot create directory {}", path.display()), e))
}

/// Ensure a file's parent directory exists.
///
/// # Example
/// ```ignore
/// ensure_parent_dir(Path::new("/foo/bar/baz.txt"))?;
/// // /foo/bar/ now exists
/// ```
pub fn ensure_parent_dir(path: &Path) -> Result<(), FetchCause> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Remove a directory tree if present. Missing paths are not an error.
pub fn remove_dir_if_exists(path: &Path) -> Result<(), FetchCause> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FetchCause::io(
            format!("cannot remove {}", path.display()),
            e,
        )),
    }
}

/// Make `path` an empty directory, deleting whatever it held.
pub fn reset_dir(path: &Path) -> Result<(), FetchCause> {
    remove_dir_if_exists(path)?;
    ensure_dir(path)
}

/// Whether a directory has no entries. Missing directories count as empty.
pub fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

/// Copy a file, creating parent directories as needed.
///
/// An existing destination is truncated and overwritten.
pub fn copy_file(src: &Path, dest: &Path) -> Result<u64, FetchCause> {
    ensure_parent_dir(dest)?;
    // A symlink at the destination would redirect the write.
    if std::fs::symlink_metadata(dest).is_ok_and(|m| m.file_type().is_symlink()) {
        remove_path(dest)?;
    }
    std::fs::copy(src, dest).map_err(|e| {
        FetchCause::io(
            format!("copy failed: {} -> {}", src.display(), dest.display()),
            e,
        )
    })
}

/// Recursively copy `src` into `dest`, preserving relative structure.
///
/// Files already present in `dest` are overwritten; nothing is appended.
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<u64, FetchCause> {
    ensure_dir(dest)?;
    let mut copied = 0u64;

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            let context = format!("cannot walk {}", src.display());
            match e.into_io_error() {
                Some(io) => FetchCause::io(context, io),
                None => FetchCause::io(context, std::io::Error::other("filesystem loop")),
            }
        })?;
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => continue,
        };
        let target = dest.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if std::fs::symlink_metadata(&target).is_ok_and(|m| !m.is_dir()) {
                remove_path(&target)?;
            }
            ensure_dir(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<(), FetchCause> {
    let link = std::fs::read_link(src)
        .map_err(|e| FetchCause::io(format!("cannot read link {}", src.display()), e))?;
    if std::fs::symlink_metadata(dest).is_ok() {
        remove_path(dest)?;
    }
    ensure_parent_dir(dest)?;
    std::os::unix::fs::symlink(&link, dest)
        .map_err(|e| FetchCause::io(format!("cannot create link {}", dest.display()), e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> Result<(), FetchCause> {
    // No portable symlink creation; copy what the link points at.
    copy_file(src, dest).map(|_| ())
}

fn remove_path(path: &Path) -> Result<(), FetchCause> {
    let result = match std::fs::symlink_metadata(path) {
        Ok(m) if m.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(_) => Ok(()),
    };
    result.map_err(|e| FetchCause::io(format!("cannot remove {}", path.display()), e))
}
