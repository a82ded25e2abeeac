//! Native archive extraction (no external tools needed)
//!
//! Supports tar (plain, gzip, xz, bzip2, zstd) and zip. Entries are checked
//! before they are written: absolute paths, `..` components, writes through
//! symlinks, and link targets that escape the destination are all rejected.

use crate::core::output;
use crate::source::FetchCause;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use super::internal::fs_utils;
use super::internal::progress::{self, ProgressGuard};

/// Archive container and compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    TarXz,
    TarBz2,
    TarZst,
    Zip,
}

impl ArchiveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
            Self::TarBz2 => "tar.bz2",
            Self::TarZst => "tar.zst",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "tar" => Ok(Self::Tar),
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            "tar.xz" | "txz" => Ok(Self::TarXz),
            "tar.bz2" | "tbz2" => Ok(Self::TarBz2),
            "tar.zst" | "tzst" => Ok(Self::TarZst),
            "zip" => Ok(Self::Zip),
            other => Err(format!("unknown archive format: {}", other)),
        }
    }
}

/// Detect archive format from the file name's extension.
///
/// Fails with [`FetchCause::UnsupportedExtension`] naming the extension.
pub fn detect_format(archive: &Path) -> Result<ArchiveFormat, FetchCause> {
    let name = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let format = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveFormat::TarGz)
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
        Some(ArchiveFormat::TarXz)
    } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
        Some(ArchiveFormat::TarBz2)
    } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
        Some(ArchiveFormat::TarZst)
    } else if name.ends_with(".zip") {
        Some(ArchiveFormat::Zip)
    } else if name.ends_with(".tar") {
        Some(ArchiveFormat::Tar)
    } else {
        None
    };

    format.ok_or_else(|| {
        let ext = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_string(),
            _ => "<none>".to_string(),
        };
        FetchCause::UnsupportedExtension(ext)
    })
}

/// Extract `archive` into `dest`, creating `dest` if needed.
pub fn extract(archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<(), FetchCause> {
    fs_utils::ensure_dir(dest)?;

    let filename = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());
    let _pb = ProgressGuard(progress::create_spinner(&format!("extracting {}", filename)));

    match format {
        ArchiveFormat::TarGz => extract_tar(flate2::read::GzDecoder::new(open(archive)?), dest),
        ArchiveFormat::TarXz => extract_tar(xz2::read::XzDecoder::new(open(archive)?), dest),
        ArchiveFormat::TarBz2 => extract_tar(bzip2::read::BzDecoder::new(open(archive)?), dest),
        ArchiveFormat::TarZst => {
            let decoder = zstd::stream::read::Decoder::new(open(archive)?)
                .map_err(|e| FetchCause::Archive(format!("zstd init error: {}", e)))?;
            extract_tar(decoder, dest)
        }
        ArchiveFormat::Tar => extract_tar(open(archive)?, dest),
        ArchiveFormat::Zip => extract_zip(archive, dest),
    }?;

    output::detail(&format!("extracted {} to {}", filename, dest.display()));
    Ok(())
}

fn open(archive: &Path) -> Result<BufReader<File>, FetchCause> {
    File::open(archive)
        .map(BufReader::new)
        .map_err(|e| FetchCause::io(format!("cannot open {}", archive.display()), e))
}

fn normalize_lexical(path: &Path) -> PathBuf {
    // No filesystem access: link targets are validated without following them.
    let mut out = PathBuf::new();
    let mut has_root = false;

    for c in path.components() {
        match c {
            Component::Prefix(p) => {
                out.clear();
                out.push(p.as_os_str());
                has_root = true;
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = out
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !has_root {
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

fn ensure_no_symlink_components(dest: &Path, full_path: &Path) -> Result<(), FetchCause> {
    let rel = full_path.strip_prefix(dest).map_err(|_| {
        FetchCause::UnsafeEntry(format!("path outside destination: {}", full_path.display()))
    })?;

    let mut cur = dest.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(md) = std::fs::symlink_metadata(&cur)
            && md.file_type().is_symlink()
        {
            return Err(FetchCause::UnsafeEntry(format!(
                "symlink in path component: {}",
                cur.display()
            )));
        }
    }

    Ok(())
}

fn ensure_link_target_within_dest(
    dest: &Path,
    link_parent: &Path,
    link_name: &Path,
) -> Result<(), FetchCause> {
    if link_name.is_absolute()
        || link_name
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(FetchCause::UnsafeEntry(format!(
            "unsafe link target (absolute): {}",
            link_name.display()
        )));
    }

    let candidate = normalize_lexical(&link_parent.join(link_name));
    let norm_dest = normalize_lexical(dest);
    if candidate.strip_prefix(&norm_dest).is_err() {
        return Err(FetchCause::UnsafeEntry(format!(
            "unsafe link target (escapes dest): {} -> {}",
            link_parent.display(),
            link_name.display()
        )));
    }

    Ok(())
}

fn is_unsafe_relative(path: &Path) -> bool {
    path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_) | Component::RootDir))
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> Result<(), FetchCause> {
    let mut archive = tar::Archive::new(reader);
    let tar_err = |what: &str, e: std::io::Error| FetchCause::Archive(format!("tar {}: {}", what, e));

    for entry in archive.entries().map_err(|e| tar_err("read error", e))? {
        let mut entry = entry.map_err(|e| tar_err("entry error", e))?;
        let path = entry
            .path()
            .map_err(|e| tar_err("path error", e))?
            .into_owned();

        if is_unsafe_relative(&path) {
            return Err(FetchCause::UnsafeEntry(format!(
                "tar contains unsafe path: {}",
                path.display()
            )));
        }

        // Some archives contain a "." entry
        if path.as_os_str().is_empty() || path == Path::new(".") {
            continue;
        }

        let full_path = dest.join(&path);
        ensure_no_symlink_components(dest, &full_path)?;

        let entry_type = entry.header().entry_type();
        let mut hard_link_target = None;
        if entry_type == tar::EntryType::Symlink || entry_type == tar::EntryType::Link {
            let Some(link_name) = entry
                .link_name()
                .map_err(|e| tar_err("link_name error", e))?
            else {
                return Err(FetchCause::UnsafeEntry(format!(
                    "tar contains link without target: {}",
                    path.display()
                )));
            };

            if entry_type == tar::EntryType::Link {
                // Hard link targets name a path from the archive root.
                ensure_link_target_within_dest(dest, dest, &link_name)?;
                let target = dest.join(&link_name);
                ensure_no_symlink_components(dest, &target)?;
                hard_link_target = Some(target);
            } else {
                let link_parent = full_path.parent().unwrap_or(dest);
                ensure_link_target_within_dest(dest, link_parent, &link_name)?;
            }
        }

        if let Some(parent) = full_path.parent() {
            if parent.starts_with(dest) {
                ensure_no_symlink_components(dest, parent)?;
            }
            fs_utils::ensure_dir(parent)?;
        }

        if let Some(target) = hard_link_target {
            if full_path.symlink_metadata().is_ok() {
                std::fs::remove_file(&full_path).map_err(|e| {
                    FetchCause::io(format!("cannot replace {}", full_path.display()), e)
                })?;
            }
            std::fs::hard_link(&target, &full_path).map_err(|e| {
                tar_err(
                    &format!("hard link error for {} -> {}", path.display(), target.display()),
                    e,
                )
            })?;
            continue;
        }

        entry
            .unpack(&full_path)
            .map_err(|e| tar_err(&format!("unpack error for {}", path.display()), e))?;
    }

    Ok(())
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), FetchCause> {
    let file = File::open(archive_path)
        .map_err(|e| FetchCause::io(format!("cannot open {}", archive_path.display()), e))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| FetchCause::Archive(format!("zip read error: {}", e)))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| FetchCause::Archive(format!("zip entry error: {}", e)))?;

        let Some(rel) = file.enclosed_name() else {
            return Err(FetchCause::UnsafeEntry(format!(
                "zip contains unsafe path: {}",
                file.name()
            )));
        };
        let outpath = dest.join(rel);
        ensure_no_symlink_components(dest, &outpath)?;

        if file.is_dir() {
            fs_utils::ensure_dir(&outpath)?;
            continue;
        }

        fs_utils::ensure_parent_dir(&outpath)?;
        let mut outfile = File::create(&outpath)
            .map_err(|e| FetchCause::io(format!("cannot create {}", outpath.display()), e))?;
        std::io::copy(&mut file, &mut outfile)
            .map_err(|e| FetchCause::io(format!("write error for {}", outpath.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }
    }

    Ok(())
}
