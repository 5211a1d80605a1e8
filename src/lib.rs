//! onefeed — fetch many RSS/Atom feeds and republish them as one combined feed.
//!
//! A single-shot batch tool: resolve configuration, fetch every source feed
//! concurrently, filter and normalize their entries, merge-sort-truncate, and
//! write the result as RSS 2.0 or Atom 1.0 to a local file or an FTP/FTPS
//! endpoint. No state is kept between runs.

pub mod config;
pub mod feed;
pub mod output;
