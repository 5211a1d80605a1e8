//! The aggregation pipeline: fetch, normalize, collect, order.
//!
//! - [`fetch`] - Resolve one feed URI (local path or URL) to a parsed feed
//! - [`normalize`] - Per-item age filtering and title rewriting
//! - [`aggregate`] - Concurrent fan-out over all sources and the final
//!   merge-sort-truncate
//!
//! Failures below this module's boundary are per-source or per-item: they are
//! logged and skipped, never raised. One unreachable or malformed upstream
//! feed must not abort the batch.

mod aggregate;
mod fetch;
mod normalize;

pub use aggregate::{collect, finalize, Harvest, SourceOutcome, SourceStats};
pub use fetch::{build_client, fetch_source, FetchErrorKind, SourceError, SourceFeed, USER_AGENT};
pub use normalize::{normalize, Decision, FeedItem, SkipReason};
