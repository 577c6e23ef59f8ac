use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

pub type Result<T> = std::result::Result<T, DownloadError>;

/// The part of a job a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Precondition,
    Transport,
    Filesystem,
    Format,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("a file url is required to download")]
    MissingUrl,

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("response from {0} has no Content-Length header")]
    MissingContentLength(Url),

    #[error("could not parse Content-Length {0:?}")]
    InvalidContentLength(String),

    #[error("extension {0:?} not supported")]
    UnsupportedFormat(String),

    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("could not get response header from {url}: {source}")]
    Probe {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("range {index} failed: {source}")]
    Transport {
        index: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("range {index} timed out")]
    Timeout { index: usize },

    #[error("{url} answered with status {status}")]
    Status { url: Url, status: StatusCode },

    #[error("server ignored the byte range of range {index}")]
    RangeIgnored { index: usize },

    #[error("range {index} ended after {received} of {expected} bytes")]
    PrematureEnd {
        index: usize,
        expected: u64,
        received: u64,
    },

    #[error("range {index} sent more than the {expected} bytes requested")]
    Overrun { index: usize, expected: u64 },

    #[error("range {index} was cancelled")]
    Cancelled { index: usize },

    #[error("download task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid {kind} file", path.display())]
    Format { path: PathBuf, kind: &'static str },
}

impl DownloadError {
    /// Wraps an io error with what was being attempted, for use with `map_err`.
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }

    pub(crate) fn transport(index: usize, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { index }
        } else {
            Self::Transport { index, source }
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingUrl
            | Self::InvalidUrl { .. }
            | Self::InvalidArgument(_)
            | Self::MissingContentLength(_)
            | Self::InvalidContentLength(_)
            | Self::UnsupportedFormat(_) => Stage::Precondition,
            Self::Client(_)
            | Self::Probe { .. }
            | Self::Transport { .. }
            | Self::Timeout { .. }
            | Self::Status { .. }
            | Self::RangeIgnored { .. }
            | Self::PrematureEnd { .. }
            | Self::Overrun { .. }
            | Self::Cancelled { .. }
            | Self::Task(_) => Stage::Transport,
            Self::Io { .. } => Stage::Filesystem,
            Self::Format { .. } => Stage::Format,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
