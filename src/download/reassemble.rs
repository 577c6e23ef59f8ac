use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use super::workspace::Workspace;
use crate::error::{DownloadError, Result};

/// Concatenates the segments `0..segments` of a job into its combined file,
/// deleting each segment once copied. Order comes from the range index alone.
pub fn reassemble(workspace: &Workspace, segments: usize) -> Result<PathBuf> {
    if segments == 0 {
        return Err(DownloadError::InvalidArgument(
            "nothing to reassemble".to_string(),
        ));
    }

    let combined_path = workspace.combined_path();

    if segments == 1 {
        std::fs::rename(workspace.segment_path(0), &combined_path)
            .map_err(DownloadError::io("could not rename segment file"))?;
        return Ok(combined_path);
    }

    let mut combined = File::create(&combined_path)
        .map_err(DownloadError::io("could not create new combined file"))?;

    for index in 0..segments {
        let seg_path = workspace.segment_path(index);
        let mut seg_file = File::open(&seg_path).map_err(DownloadError::io(format!(
            "could not open segment file {}",
            seg_path.display()
        )))?;

        let copied = std::io::copy(&mut seg_file, &mut combined)
            .map_err(DownloadError::io("could not copy segment into combined file"))?;
        drop(seg_file);

        std::fs::remove_file(&seg_path)
            .map_err(DownloadError::io("could not remove segment file"))?;

        debug!(index, copied, "segment appended");
    }

    combined
        .flush()
        .map_err(DownloadError::io("could not flush combined file"))?;

    Ok(combined_path)
}
