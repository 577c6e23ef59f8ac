use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use url::Url;

use super::fetcher::RangeFetcher;
use super::progress::ProgressAggregator;
use super::range::RangeSpec;
use super::workspace::Workspace;
use super::DownloadClient;
use crate::error::{DownloadError, Result};

/// Runs one fetcher per range and waits for all of them.
///
/// The first failure cancels every other fetcher; the remaining tasks are
/// still joined before that failure is returned, so no fetcher outlives the
/// call. Segments of a failed job are left in the workspace.
pub async fn fetch_ranges(
    client: &DownloadClient,
    url: &Url,
    total_length: u64,
    ranges: &[RangeSpec],
    workspace: &Workspace,
    progress: Arc<ProgressAggregator>,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let mut tasks = JoinSet::new();

    for range in ranges {
        let fetcher = RangeFetcher {
            client: client.clone(),
            url: url.clone(),
            range: *range,
            total_length,
            segment: workspace.segment_path(range.index),
            progress: Arc::clone(&progress),
            cancel: cancel.clone(),
        };
        tasks.spawn(fetcher.fetch());
    }

    let mut first_error: Option<DownloadError> = None;
    let mut completed = 0;

    while let Some(joined) = tasks.join_next().await {
        let result = joined.map_err(DownloadError::from).and_then(|result| result);

        match result {
            Ok(range) => {
                completed += 1;
                debug!(index = range.index, completed, total = ranges.len(), "range downloaded");
            }
            Err(err) if first_error.is_none() => {
                error!("Error downloading range: {}", err);
                cancel.cancel();
                first_error = Some(err);
            }
            Err(err) => {
                debug!("range stopped after an earlier failure: {}", err);
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    info!(ranges = ranges.len(), "all ranges downloaded");

    Ok(())
}
