pub mod coordinator;
pub mod downloader;
pub mod fetcher;
pub mod progress;
pub mod range;
pub mod reassemble;
pub mod workspace;

use std::time::Duration;

use reqwest::header::{HeaderMap, ACCEPT_ENCODING, ACCEPT_RANGES, CONTENT_LENGTH, RANGE};
use reqwest::{Response, StatusCode};
use tracing::{debug, error};
use url::Url;

use crate::error::{DownloadError, Result};
use range::RangeSpec;

/// What a HEAD request tells us about the remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// final url after redirects
    pub url: Url,
    pub content_length: u64,
    pub accepts_ranges: bool,
}

#[derive(Clone)]
pub struct DownloadClient {
    client: reqwest::Client,
}

impl DownloadClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(DownloadError::Client)?;

        Ok(Self { client })
    }

    pub async fn probe(&self, url: &Url) -> Result<Probe> {
        let response = match self.client.head(url.as_str()).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("Error probing {}: {}", url, err);
                return Err(DownloadError::Probe {
                    url: url.clone(),
                    source: err,
                });
            }
        };

        if !response.status().is_success() {
            return Err(DownloadError::Status {
                url: url.clone(),
                status: response.status(),
            });
        }

        let resolved = response.url().clone();
        let headers = response.headers();

        let probe = Probe {
            content_length: content_length(headers, &resolved)?,
            accepts_ranges: accepts_ranges(headers),
            url: resolved,
        };
        debug!(?probe, "probed remote file");

        Ok(probe)
    }

    /// Sends the GET for one range and checks the status line. Compression is
    /// disabled so the body length matches the range.
    pub async fn get_range(
        &self,
        url: &Url,
        range: &RangeSpec,
        total_length: u64,
    ) -> Result<Response> {
        let mut request = self
            .client
            .get(url.as_str())
            .header(ACCEPT_ENCODING, "identity");

        if let Some(value) = range.header_value() {
            request = request.header(RANGE, value);
        }

        let response = request
            .send()
            .await
            .map_err(|err| DownloadError::transport(range.index, err))?;

        match response.status() {
            StatusCode::PARTIAL_CONTENT => Ok(response),
            StatusCode::OK if range.start == 0 && range.len == total_length => Ok(response),
            StatusCode::OK => Err(DownloadError::RangeIgnored { index: range.index }),
            status => Err(DownloadError::Status {
                url: url.clone(),
                status,
            }),
        }
    }
}

fn content_length(headers: &HeaderMap, url: &Url) -> Result<u64> {
    let value = match headers.get(CONTENT_LENGTH) {
        Some(value) => value,
        None => {
            error!("Response from {} does not have the content length", url);
            return Err(DownloadError::MissingContentLength(url.clone()));
        }
    };

    let value = value.to_str().unwrap_or_default().trim();
    value
        .parse::<u64>()
        .map_err(|_| DownloadError::InvalidContentLength(value.to_string()))
}

fn accepts_ranges(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT_RANGES)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().eq_ignore_ascii_case("bytes"))
        .unwrap_or(false)
}
