use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use super::coordinator::fetch_ranges;
use super::progress::{NoProgress, ProgressAggregator, ProgressReporter};
use super::range;
use super::reassemble::reassemble;
use super::workspace::Workspace;
use super::DownloadClient;
use crate::error::{DownloadError, Result};
use crate::options::Options;
use crate::relocate::{relocate, FileKind};

/// A probed download. Fixed once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// url after redirects
    pub source_url: Url,
    pub total_length: u64,
    /// number of ranges actually fetched
    pub concurrency: usize,
    pub final_path: PathBuf,
}

pub struct Downloader {
    url: Url,
    final_path: PathBuf,
    kind: FileKind,
    options: Options,
    client: DownloadClient,
    reporter: Arc<dyn ProgressReporter>,
}

impl Downloader {
    /// Validates the request without touching the network.
    pub fn new(url: &str, final_path: impl Into<PathBuf>, options: Options) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::MissingUrl);
        }

        let url = Url::parse(url).map_err(|source| DownloadError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        if options.routines == 0 {
            return Err(DownloadError::InvalidArgument(
                "routines must be at least 1".to_string(),
            ));
        }

        let kind = FileKind::from_url(&url)?;
        let client = DownloadClient::new(options.timeout)?;

        Ok(Self {
            url,
            final_path: final_path.into(),
            kind,
            options,
            client,
            reporter: Arc::new(NoProgress),
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub async fn probe(&self) -> Result<DownloadJob> {
        let probe = self.client.probe(&self.url).await?;

        if !probe.accepts_ranges {
            warn!("{} does not accept ranges so can not download concurrently", probe.url);
        }

        let accepts_ranges = probe.accepts_ranges && self.kind.supports_ranged_download();
        let concurrency = range::effective_concurrency(
            probe.content_length,
            self.options.routines,
            accepts_ranges,
        )?;

        Ok(DownloadJob {
            source_url: probe.url,
            total_length: probe.content_length,
            concurrency,
            final_path: self.final_path.clone(),
        })
    }

    /// Downloads, reassembles and relocates the file, returning where it ended up.
    pub async fn download(&self) -> Result<PathBuf> {
        let job = self.probe().await?;

        info!(
            "Downloading {} bytes from {} with {} range(s)",
            job.total_length, job.source_url, job.concurrency
        );

        let ranges = range::plan(job.total_length, job.concurrency, true)?;

        let workspace = Workspace::new(&self.options.temp_dir, &job.final_path);
        workspace.prepare().await?;

        let progress = Arc::new(ProgressAggregator::new(
            job.total_length,
            Arc::clone(&self.reporter),
        ));

        fetch_ranges(
            &self.client,
            &job.source_url,
            job.total_length,
            &ranges,
            &workspace,
            Arc::clone(&progress),
        )
        .await?;
        progress.finish();

        let combined = reassemble(&workspace, ranges.len())?;
        relocate(&combined, &job.source_url, &job.final_path)?;

        info!("Finished downloading {} to {}", job.source_url, job.final_path.display());

        Ok(job.final_path)
    }
}
