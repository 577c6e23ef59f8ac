use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

/// Renders aggregate progress of one job.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, _total: u64) {}

    fn update(&self, current: u64);

    fn finish(&self) {}
}

/// Reporter that renders nothing.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn update(&self, _current: u64) {}
}

/// Terminal progress bar on stderr.
pub struct ProgressBarReporter {
    bar: ProgressBar,
}

impl ProgressBarReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{elapsed_precise} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        bar.set_style(style);

        Self { bar }
    }
}

impl Default for ProgressBarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ProgressBarReporter {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn update(&self, current: u64) {
        self.bar.set_position(current);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

/// Bytes received across every fetcher of a job.
pub struct ProgressAggregator {
    current: Mutex<u64>,
    reporter: Arc<dyn ProgressReporter>,
}

impl ProgressAggregator {
    pub fn new(total: u64, reporter: Arc<dyn ProgressReporter>) -> Self {
        reporter.start(total);

        Self {
            current: Mutex::new(0),
            reporter,
        }
    }

    /// Adds `n` bytes and renders the new total, returning it.
    /// The render happens under the lock so the reporter never sees the total go backwards.
    pub async fn add(&self, n: u64) -> u64 {
        let mut current = self.current.lock().await;
        *current += n;
        self.reporter.update(*current);
        *current
    }

    pub async fn current_total(&self) -> u64 {
        *self.current.lock().await
    }

    pub fn finish(&self) {
        self.reporter.finish();
    }
}
