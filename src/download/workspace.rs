use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::error::{DownloadError, Result};

/// Temporary files of one job: a segment per range and the combined file.
///
/// The job id is derived from the final path, so jobs writing to different
/// destinations never share a file name.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
    job_id: String,
}

impl Workspace {
    pub fn new(temp_dir: &Path, final_path: &Path) -> Self {
        Self {
            dir: temp_dir.to_path_buf(),
            job_id: job_id(final_path),
        }
    }

    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.part{}", self.job_id, index))
    }

    pub fn combined_path(&self) -> PathBuf {
        self.dir.join(format!("{}.combined", self.job_id))
    }

    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(DownloadError::io(format!(
                "could not make download directory {}",
                self.dir.display()
            )))
    }
}

// `_` is escaped as well, which keeps the mapping injective.
fn job_id(final_path: &Path) -> String {
    let path = final_path.to_string_lossy();
    let mut id = String::with_capacity(path.len());

    for byte in path.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
            id.push(byte as char);
        } else {
            let _ = write!(id, "_{:02x}", byte);
        }
    }

    id
}
