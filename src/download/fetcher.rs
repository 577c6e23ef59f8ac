use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::Response;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use super::progress::ProgressAggregator;
use super::range::RangeSpec;
use super::DownloadClient;
use crate::error::{DownloadError, Result};

/// Downloads one range into its own segment file.
pub struct RangeFetcher {
    pub client: DownloadClient,
    pub url: Url,
    pub range: RangeSpec,
    pub total_length: u64,
    pub segment: PathBuf,
    pub progress: Arc<ProgressAggregator>,
    pub cancel: CancellationToken,
}

impl RangeFetcher {
    pub async fn fetch(self) -> Result<RangeSpec> {
        let index = self.range.index;

        if self.cancel.is_cancelled() {
            return Err(DownloadError::Cancelled { index });
        }

        let mut file = File::create(&self.segment)
            .await
            .map_err(DownloadError::io(format!(
                "could not create segment file {}",
                self.segment.display()
            )))?;

        if self.range.is_empty() {
            debug!(index, "empty range, nothing to request");
            return Ok(self.range);
        }

        debug!(
            index,
            start = self.range.start,
            len = self.range.len,
            "fetching range"
        );

        let request = self
            .client
            .get_range(&self.url, &self.range, self.total_length);
        let mut response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DownloadError::Cancelled { index }),
            response = request => response?,
        };

        let expected = self.range.len;
        let mut received = 0u64;

        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(DownloadError::Cancelled { index }),
                chunk = next_chunk(&mut response, index) => chunk?,
            };

            let Some(chunk) = chunk else { break };

            received += chunk.len() as u64;
            if received > expected {
                return Err(DownloadError::Overrun { index, expected });
            }

            file.write_all(&chunk)
                .await
                .map_err(DownloadError::io("could not write segment file"))?;

            self.progress.add(chunk.len() as u64).await;
        }

        file.flush()
            .await
            .map_err(DownloadError::io("could not flush segment file"))?;

        if received < expected {
            return Err(DownloadError::PrematureEnd {
                index,
                expected,
                received,
            });
        }

        debug!(index, received, "range finished");

        Ok(self.range)
    }
}

async fn next_chunk(response: &mut Response, index: usize) -> Result<Option<Bytes>> {
    response
        .chunk()
        .await
        .map_err(|err| DownloadError::transport(index, err))
}
