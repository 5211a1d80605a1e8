//! Resolving a single feed URI to a parsed feed document.
//!
//! A source URI may be a remote http(s) URL, a `file://` URL, or a bare local
//! path. All failure modes collapse into a [`SourceError`] carrying the URI;
//! the aggregator logs and skips, so no error here ever aborts the batch.

use feed_rs::parser;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Some feed hosts reject empty or default user agents outright.
pub const USER_AGENT: &str = concat!("onefeed/", env!("CARGO_PKG_VERSION"));

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Underlying cause of a failed fetch.
#[derive(Debug, Error)]
pub enum FetchErrorKind {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Local file could not be read
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    /// Document could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A fetch or parse failure, pinned to the feed it came from.
#[derive(Debug, Error)]
#[error("Failed to fetch feed '{uri}'")]
pub struct SourceError {
    pub uri: String,
    #[source]
    pub kind: FetchErrorKind,
}

/// One upstream feed, parsed. Transient — discarded once its entries are
/// extracted by the aggregator.
#[derive(Debug)]
pub struct SourceFeed {
    /// Feed-level title, used for item title prefixing.
    pub title: Option<String>,
    pub entries: Vec<feed_rs::model::Entry>,
}

/// Build the shared HTTP client used for feeds and URL-hosted configs.
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Fetches and parses one source feed.
///
/// # Errors
///
/// Returns a [`SourceError`] on any transport or parse failure. Callers are
/// expected to log and skip rather than propagate.
pub async fn fetch_source(client: &reqwest::Client, uri: &str) -> Result<SourceFeed, SourceError> {
    let bytes = read_uri(client, uri).await.map_err(|kind| SourceError {
        uri: uri.to_string(),
        kind,
    })?;

    let feed = parser::parse(&bytes[..]).map_err(|e| SourceError {
        uri: uri.to_string(),
        kind: FetchErrorKind::Parse(e.to_string()),
    })?;

    tracing::debug!(uri = %uri, entries = feed.entries.len(), "Fetched feed");

    Ok(SourceFeed {
        title: feed.title.map(|t| t.content),
        entries: feed.entries,
    })
}

async fn read_uri(client: &reqwest::Client, uri: &str) -> Result<Vec<u8>, FetchErrorKind> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return read_remote(client, uri).await;
    }

    // file:// URLs and bare paths both read from the local filesystem
    if let Some(path) = uri.strip_prefix("file://") {
        let path = Url::parse(uri)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .unwrap_or_else(|| path.into());
        return Ok(tokio::fs::read(path).await?);
    }

    Ok(tokio::fs::read(uri).await?)
}

async fn read_remote(client: &reqwest::Client, uri: &str) -> Result<Vec<u8>, FetchErrorKind> {
    let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(uri).send())
        .await
        .map_err(|_| FetchErrorKind::Timeout)?
        .map_err(FetchErrorKind::Network)?;

    if !response.status().is_success() {
        return Err(FetchErrorKind::HttpStatus(response.status().as_u16()));
    }

    let bytes = response.bytes().await.map_err(FetchErrorKind::Network)?;
    Ok(bytes.to_vec())
}
