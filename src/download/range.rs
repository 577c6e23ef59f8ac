use crate::error::{DownloadError, Result};

/// One contiguous slice of the remote file, identified by its position in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub index: usize,
    pub start: u64,
    pub len: u64,
}

impl RangeSpec {
    /// Inclusive end offset, `None` for an empty range.
    pub fn end(&self) -> Option<u64> {
        if self.len == 0 {
            None
        } else {
            Some(self.start + self.len - 1)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value for the `Range` request header.
    pub fn header_value(&self) -> Option<String> {
        self.end().map(|end| format!("bytes={}-{}", self.start, end))
    }
}

/// Number of ranges actually used for a file.
pub fn effective_concurrency(
    total_length: u64,
    requested: usize,
    accepts_ranges: bool,
) -> Result<usize> {
    if requested == 0 {
        return Err(DownloadError::InvalidArgument(
            "concurrency must be at least 1".to_string(),
        ));
    }

    if !accepts_ranges || total_length == 0 {
        return Ok(1);
    }

    Ok(requested)
}

/// Splits `[0, total_length)` into contiguous ranges. Every range gets
/// `total_length / n` bytes and the last one also takes the remainder.
pub fn plan(total_length: u64, requested: usize, accepts_ranges: bool) -> Result<Vec<RangeSpec>> {
    let count = effective_concurrency(total_length, requested, accepts_ranges)?;

    let subset_length = total_length / count as u64;
    let remainder = total_length % count as u64;

    let ranges = (0..count)
        .map(|index| {
            let mut len = subset_length;
            if index == count - 1 {
                len += remainder;
            }

            RangeSpec {
                index,
                start: index as u64 * subset_length,
                len,
            }
        })
        .collect();

    Ok(ranges)
}
