//! Downloads one remote file over HTTP(S) as N concurrent byte ranges,
//! reassembles the ranges in order and moves or extracts the result.

pub mod download;
pub mod error;
pub mod options;
pub mod relocate;

pub use download::downloader::{DownloadJob, Downloader};
pub use download::progress::{NoProgress, ProgressBarReporter, ProgressReporter};
pub use error::{DownloadError, Result, Stage};
pub use options::Options;
