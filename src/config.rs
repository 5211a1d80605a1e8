//! Layered JSON configuration for a single aggregation run.
//!
//! Configuration is supplied as one or more JSON documents, each a local file
//! path or a web URL, merged in order from lowest to highest precedence.
//! Keys are PascalCase (`SourceFeeds`, `CombinedFeed.Title`, ...) so existing
//! config files keep working. Scalar values may arrive as JSON natives or as
//! strings (`"30"`, `"true"`) — both are accepted.

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch config from '{url}'")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid JSON in config '{location}'")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// The argument is neither an existing file nor a well-formed absolute URL.
    #[error("Config location '{0}' is neither a readable file nor a valid web URL")]
    BadLocation(String),

    #[error("Config does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Resolved Configuration
// ============================================================================

/// Output wire format for the combined feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Rss,
    Atom,
}

/// Fully validated configuration for one run.
///
/// Produced by [`load`]; every required field is present and non-empty by the
/// time a `Config` exists. The upload password is held as a [`SecretString`]
/// so `Debug` output never leaks it.
#[derive(Debug)]
pub struct Config {
    /// URIs of the upstream feeds to aggregate. Non-empty.
    pub source_feeds: Vec<String>,
    /// Items older than this many days are dropped. `None` = no age bound.
    pub max_age_days: Option<i64>,
    /// Rewrite item titles to `"<feed title> — <item title>"`.
    pub prefix_feed_title: bool,
    /// Keep at most this many items. `None` = unbounded.
    pub max_item_count: Option<usize>,
    /// Title of the combined feed.
    pub title: String,
    /// Description of the combined feed.
    pub description: String,
    /// Optional image/logo URL for the combined feed.
    pub image_url: Option<String>,
    /// RSS 2.0 or Atom 1.0 output.
    pub format: OutputFormat,
    /// Destination URI (`file://`, `ftp://`, or `ftps://`).
    pub output: String,
    /// FTP username, used when the destination URI carries no userinfo.
    pub upload_username: Option<String>,
    /// FTP password, used when the destination URI carries no userinfo.
    pub upload_password: Option<SecretString>,
}

/// Per-run policy derived from [`Config`], read-only for all fetch tasks.
#[derive(Debug, Clone, Copy)]
pub struct RunPolicy {
    /// Inclusive lower bound on item publish time. `None` = keep any age.
    pub oldest_allowed: Option<DateTime<Utc>>,
    /// Prefix item titles with the source feed title.
    pub prefix_feed_title: bool,
    /// Maximum number of items in the combined feed. `None` = keep all.
    pub max_items: Option<usize>,
}

impl Config {
    /// Derive the run policy, anchoring the age bound at `now`.
    pub fn policy(&self, now: DateTime<Utc>) -> RunPolicy {
        RunPolicy {
            oldest_allowed: self.max_age_days.map(|days| now - Duration::days(days)),
            prefix_feed_title: self.prefix_feed_title,
            max_items: self.max_item_count,
        }
    }
}

// ============================================================================
// Raw (pre-validation) Shape
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RawConfig {
    source_feeds: Option<Vec<String>>,
    combined_feed: RawCombined,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RawCombined {
    #[serde(deserialize_with = "flex::opt_int")]
    item_max_age_in_days: Option<i64>,
    #[serde(deserialize_with = "flex::opt_bool")]
    prefix_feed_title: Option<bool>,
    #[serde(deserialize_with = "flex::opt_int")]
    max_item_count: Option<i64>,
    title: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    format: Option<String>,
    output: Option<String>,
    upload_username: Option<String>,
    upload_password: Option<String>,
}

/// Lenient scalar deserializers. Configs that passed through stringly-typed
/// tooling carry `"30"` and `"true"` where JSON numbers/booleans belong.
mod flex {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn opt_bool<'de, D>(d: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                other => Err(serde::de::Error::custom(format!(
                    "expected 'true' or 'false', got '{other}'"
                ))),
            },
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected a boolean, got {other}"
            ))),
        }
    }

    pub fn opt_int<'de, D>(d: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {n}"))),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("expected an integer, got '{s}'"))),
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected an integer, got {other}"
            ))),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load and merge configuration from one or more locations.
///
/// Each location is a local file path or an absolute http(s) URL. Documents
/// are merged in argument order, later documents overriding earlier ones
/// key-by-key (objects merge recursively, everything else replaces).
///
/// # Errors
///
/// Returns an error if any location cannot be read or parsed, or if the
/// merged result fails validation (missing `SourceFeeds`, `CombinedFeed`
/// `Title`/`Description`/`Output`, or an unknown `Format`).
pub async fn load(client: &reqwest::Client, locations: &[String]) -> Result<Config, ConfigError> {
    let mut merged = Value::Object(serde_json::Map::new());

    for location in locations {
        let content = read_location(client, location).await?;
        let doc: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            location: location.clone(),
            source,
        })?;
        merge_values(&mut merged, doc);
        tracing::debug!(location = %location, "Merged config document");
    }

    let raw: RawConfig = serde_json::from_value(merged)?;
    validate(raw)
}

async fn read_location(client: &reqwest::Client, location: &str) -> Result<String, ConfigError> {
    if Path::new(location).is_file() {
        return tokio::fs::read_to_string(location)
            .await
            .map_err(|source| ConfigError::Io {
                path: location.to_string(),
                source,
            });
    }

    if let Ok(url) = url::Url::parse(location) {
        if matches!(url.scheme(), "http" | "https") {
            let fetch_err = |source| ConfigError::Fetch {
                url: location.to_string(),
                source,
            };
            let response = client.get(url).send().await.map_err(fetch_err)?;
            let response = response.error_for_status().map_err(fetch_err)?;
            return response.text().await.map_err(fetch_err);
        }
    }

    Err(ConfigError::BadLocation(location.to_string()))
}

/// Recursive JSON merge: objects merge key-by-key, anything else replaces.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                merge_values(base_map.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn validate(raw: RawConfig) -> Result<Config, ConfigError> {
    let source_feeds = raw
        .source_feeds
        .filter(|feeds| !feeds.is_empty())
        .ok_or_else(|| {
            ConfigError::Invalid("'SourceFeeds' must list at least one feed URI".into())
        })?;

    let combined = raw.combined_feed;

    let required = |value: Option<String>, key: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::Invalid(format!("'CombinedFeed.{key}' is required")))
    };
    let title = required(combined.title, "Title")?;
    let description = required(combined.description, "Description")?;
    let output = required(combined.output, "Output")?;

    let format = match combined.format.as_deref() {
        None => OutputFormat::Rss,
        Some(f) if f.eq_ignore_ascii_case("rss") => OutputFormat::Rss,
        Some(f) if f.eq_ignore_ascii_case("atom") => OutputFormat::Atom,
        Some(other) => {
            return Err(ConfigError::Invalid(format!(
                "'CombinedFeed.Format' must be 'rss' or 'atom', got '{other}'"
            )))
        }
    };

    // A zero or negative count is treated as "no limit", same as absent.
    let max_item_count = combined
        .max_item_count
        .filter(|n| *n > 0)
        .map(|n| n as usize);

    Ok(Config {
        source_feeds,
        max_age_days: combined.item_max_age_in_days,
        prefix_feed_title: combined.prefix_feed_title.unwrap_or(false),
        max_item_count,
        title,
        description,
        image_url: combined.image_url.filter(|v| !v.trim().is_empty()),
        format,
        output,
        upload_username: combined.upload_username,
        upload_password: combined.upload_password.map(SecretString::from),
    })
}

// ============================================================================
// Tests
// ============================================================================
