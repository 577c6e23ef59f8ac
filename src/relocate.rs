use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{info, warn};
use url::Url;

use crate::error::{DownloadError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    TarGz,
}

impl FileKind {
    pub fn from_url(url: &Url) -> Result<Self> {
        Self::from_name(url.path())
    }

    pub fn from_name(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();

        if lower.ends_with(".txt") {
            Ok(Self::Text)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else {
            let extension = Path::new(name)
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default();
            Err(DownloadError::UnsupportedFormat(extension))
        }
    }

    /// Whether the bytes of this kind may be fetched in independent ranges.
    pub fn supports_ranged_download(self) -> bool {
        match self {
            Self::Text | Self::TarGz => true,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TarGz => "tar.gz",
        }
    }
}

/// Places the combined file at `final_path`, moving plain files and
/// extracting archives into it. The combined file is gone afterwards.
///
/// Archives are unpacked next to the combined file first and only moved to
/// `final_path` once extraction finished, so a broken archive leaves nothing
/// at the destination.
pub fn relocate(combined: &Path, source_url: &Url, final_path: &Path) -> Result<()> {
    let kind = FileKind::from_url(source_url)?;

    match kind {
        FileKind::Text => {
            create_parent(final_path)?;
            move_file(combined, final_path)?;
        }
        FileKind::TarGz => {
            if !is_tar_gz(combined)? {
                return Err(DownloadError::Format {
                    path: combined.to_path_buf(),
                    kind: kind.name(),
                });
            }

            let staging = combined.with_extension("extract");
            if staging.exists() {
                std::fs::remove_dir_all(&staging)
                    .map_err(DownloadError::io("could not clear extraction directory"))?;
            }

            if let Err(err) = extract_tar_gz(combined, &staging) {
                let _ = std::fs::remove_dir_all(&staging);
                return Err(err);
            }

            create_parent(final_path)?;
            move_dir(&staging, final_path)?;

            std::fs::remove_file(combined)
                .map_err(DownloadError::io("could not remove combined file"))?;
        }
    }

    info!("Relocated {} file to {}", kind.name(), final_path.display());

    Ok(())
}

/// True if `path` is a gzip stream whose first tar entry parses, or a gzip
/// stream holding nothing but the tar end-of-archive blocks.
pub fn is_tar_gz(path: &Path) -> Result<bool> {
    let file = File::open(path).map_err(DownloadError::io("could not open combined file"))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let first = match archive.entries() {
        Ok(mut entries) => entries.next(),
        Err(_) => return Ok(false),
    };

    match first {
        Some(Ok(_)) => Ok(true),
        Some(Err(_)) => Ok(false),
        None => is_empty_tar_gz(path),
    }
}

// An empty tar is at least two zero blocks; tar stops reading at the first one.
fn is_empty_tar_gz(path: &Path) -> Result<bool> {
    let file = File::open(path).map_err(DownloadError::io("could not open combined file"))?;
    let mut decoder = GzDecoder::new(file);
    let mut buffer = [0u8; 8192];
    let mut decoded = 0usize;

    loop {
        let n = match decoder.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => return Ok(false),
        };
        if buffer[..n].iter().any(|byte| *byte != 0) {
            return Ok(false);
        }
        decoded += n;
    }

    Ok(decoded >= 1024)
}

pub fn extract_tar_gz(archive: &Path, destination: &Path) -> Result<()> {
    let file = File::open(archive).map_err(DownloadError::io("could not open combined file"))?;

    std::fs::create_dir_all(destination)
        .map_err(DownloadError::io("could not create extraction directory"))?;

    Archive::new(GzDecoder::new(file))
        .unpack(destination)
        .map_err(DownloadError::io(format!(
            "could not extract archive into {}",
            destination.display()
        )))
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(DownloadError::io("could not create final output directories")),
        _ => Ok(()),
    }
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Err(err) = std::fs::rename(from, to) {
        // rename fails across filesystems
        warn!("Rename into {} failed ({}), copying instead", to.display(), err);

        std::fs::copy(from, to).map_err(DownloadError::io(
            "could not move temporary combined file into final path",
        ))?;
        std::fs::remove_file(from).map_err(DownloadError::io("could not remove combined file"))?;
    }

    Ok(())
}

fn move_dir(from: &Path, to: &Path) -> Result<()> {
    if let Err(err) = std::fs::rename(from, to) {
        // rename fails across filesystems and onto a non-empty directory
        warn!("Rename into {} failed ({}), copying instead", to.display(), err);

        copy_dir(from, to)?;
        std::fs::remove_dir_all(from)
            .map_err(DownloadError::io("could not remove extraction directory"))?;
    }

    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to)
        .map_err(DownloadError::io("could not create final output directories"))?;

    let entries =
        std::fs::read_dir(from).map_err(DownloadError::io("could not read extraction directory"))?;

    for entry in entries {
        let entry = entry.map_err(DownloadError::io("could not read extraction directory"))?;
        let target = to.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(DownloadError::io("could not read extraction directory"))?;

        if file_type.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(DownloadError::io(format!(
                "could not copy extracted file into {}",
                target.display()
            )))?;
        }
    }

    Ok(())
}
