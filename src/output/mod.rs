//! Assembly and delivery of the combined feed.
//!
//! - [`build`] - Wrap the final item list in feed-level metadata
//! - [`render`] - Serialize to RSS 2.0 or Atom 1.0 XML
//! - [`sink`] - Parse the destination URI and write (file or FTP/FTPS)

mod build;
mod render;
mod sink;

pub use build::{CombinedFeed, FeedMetadata};
pub use render::render;
pub use sink::{Destination, SinkError};
