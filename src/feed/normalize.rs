//! Per-item filtering and rewriting.
//!
//! Each raw entry is judged against the run policy and either kept (as a
//! [`FeedItem`]) or skipped with a reason. Skips are per-item conditions the
//! aggregator logs; they never fail the source, let alone the run.

use crate::config::RunPolicy;
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use std::fmt;

/// One normalized entry, ready for merging. Immutable after creation.
#[derive(Debug, Clone)]
pub struct FeedItem {
    /// Best-effort identifier from the source feed. May be absent.
    pub id: Option<String>,
    /// Item title, possibly rewritten with the source feed's title.
    pub title: Option<String>,
    pub link: Option<String>,
    /// Effective publish time: `published` falling back to `updated`.
    /// `None` sorts after all dated items.
    pub published: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub author: Option<String>,
}

/// Why an item was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Publish time present and strictly older than the configured bound.
    TooOld,
    /// Title prefixing requested but the item or feed title is unusable.
    UnreadableTitle,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooOld => write!(f, "older than the configured age bound"),
            SkipReason::UnreadableTitle => write!(f, "missing or unreadable title"),
        }
    }
}

/// Outcome of normalizing one entry.
#[derive(Debug)]
pub enum Decision {
    Keep(FeedItem),
    Skip {
        /// Best-effort item identity for logging.
        id: Option<String>,
        reason: SkipReason,
    },
}

/// Filters and rewrites one raw entry.
///
/// Applied in order:
/// 1. Age filter: drop when the effective timestamp is present and strictly
///    older than `policy.oldest_allowed`. Undated items cannot be judged and
///    always pass.
/// 2. Title prefixing: when `policy.prefix_feed_title`, rewrite the title to
///    `"<feed title> — <item title>"`. A missing item or feed title makes the
///    rewrite impossible; the item is skipped rather than emitted malformed.
pub fn normalize(entry: Entry, source_title: Option<&str>, policy: &RunPolicy) -> Decision {
    let id = non_empty(entry.id);
    let published = entry.published.or(entry.updated);

    if let (Some(ts), Some(bound)) = (published, policy.oldest_allowed) {
        if ts < bound {
            return Decision::Skip {
                id,
                reason: SkipReason::TooOld,
            };
        }
    }

    let mut title = entry.title.and_then(|t| non_empty(t.content));

    if policy.prefix_feed_title {
        let feed_title = source_title.map(str::trim).filter(|t| !t.is_empty());
        match (feed_title, title.as_deref()) {
            (Some(feed), Some(item)) => title = Some(format!("{feed} — {item}")),
            _ => {
                return Decision::Skip {
                    id,
                    reason: SkipReason::UnreadableTitle,
                }
            }
        }
    }

    Decision::Keep(FeedItem {
        id,
        title,
        link: entry.links.first().map(|l| l.href.clone()),
        published,
        summary: entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body)),
        author: entry.authors.first().map(|p| p.name.clone()),
    })
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    /// Build entries by parsing a real RSS document rather than hand-rolling
    /// feed-rs model structs.
    fn entries_from(items_xml: &str) -> Vec<Entry> {
        let xml = format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Feed</title>{items_xml}</channel></rss>"#
        );
        feed_rs::parser::parse(xml.as_bytes()).unwrap().entries
    }

    fn unbounded() -> RunPolicy {
        RunPolicy {
            oldest_allowed: None,
            prefix_feed_title: false,
            max_items: None,
        }
    }

    fn keep(decision: Decision) -> FeedItem {
        match decision {
            Decision::Keep(item) => item,
            Decision::Skip { id, reason } => panic!("expected Keep, got Skip({id:?}, {reason})"),
        }
    }

    #[test]
    fn dated_item_within_bound_is_kept() {
        let entries = entries_from(
            r#"<item><guid>a</guid><title>New</title>
               <pubDate>Wed, 03 Jan 2024 00:00:00 GMT</pubDate></item>"#,
        );
        let policy = RunPolicy {
            oldest_allowed: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..unbounded()
        };

        let item = keep(normalize(entries.into_iter().next().unwrap(), None, &policy));
        assert_eq!(item.title.as_deref(), Some("New"));
    }

    #[test]
    fn item_at_exactly_the_bound_is_kept() {
        let entries = entries_from(
            r#"<item><guid>a</guid><title>Edge</title>
               <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate></item>"#,
        );
        let policy = RunPolicy {
            oldest_allowed: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..unbounded()
        };

        let decision = normalize(entries.into_iter().next().unwrap(), None, &policy);
        assert!(matches!(decision, Decision::Keep(_)));
    }

    #[test]
    fn item_strictly_older_than_bound_is_skipped() {
        let entries = entries_from(
            r#"<item><guid>old-guid</guid><title>Old</title>
               <pubDate>Sun, 31 Dec 2023 23:59:59 GMT</pubDate></item>"#,
        );
        let policy = RunPolicy {
            oldest_allowed: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..unbounded()
        };

        match normalize(entries.into_iter().next().unwrap(), None, &policy) {
            Decision::Skip { id, reason } => {
                assert_eq!(id.as_deref(), Some("old-guid"));
                assert_eq!(reason, SkipReason::TooOld);
            }
            Decision::Keep(item) => panic!("expected Skip, kept {item:?}"),
        }
    }

    #[test]
    fn undated_item_passes_any_age_bound() {
        let entries = entries_from(r#"<item><guid>a</guid><title>Undated</title></item>"#);
        let policy = RunPolicy {
            oldest_allowed: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..unbounded()
        };

        let item = keep(normalize(entries.into_iter().next().unwrap(), None, &policy));
        assert!(item.published.is_none());
    }

    #[test]
    fn prefix_rewrites_title_with_em_dash() {
        let entries = entries_from(r#"<item><guid>a</guid><title>Story</title></item>"#);
        let policy = RunPolicy {
            prefix_feed_title: true,
            ..unbounded()
        };

        let item = keep(normalize(
            entries.into_iter().next().unwrap(),
            Some("Daily News"),
            &policy,
        ));
        assert_eq!(item.title.as_deref(), Some("Daily News — Story"));
    }

    #[test]
    fn prefix_with_missing_item_title_skips_the_item() {
        let entries = entries_from(r#"<item><guid>no-title</guid></item>"#);
        let policy = RunPolicy {
            prefix_feed_title: true,
            ..unbounded()
        };

        match normalize(entries.into_iter().next().unwrap(), Some("Feed"), &policy) {
            Decision::Skip { reason, .. } => assert_eq!(reason, SkipReason::UnreadableTitle),
            Decision::Keep(item) => panic!("expected Skip, kept {item:?}"),
        }
    }

    #[test]
    fn prefix_with_missing_feed_title_skips_the_item() {
        let entries = entries_from(r#"<item><guid>a</guid><title>Story</title></item>"#);
        let policy = RunPolicy {
            prefix_feed_title: true,
            ..unbounded()
        };

        match normalize(entries.into_iter().next().unwrap(), None, &policy) {
            Decision::Skip { reason, .. } => assert_eq!(reason, SkipReason::UnreadableTitle),
            Decision::Keep(item) => panic!("expected Skip, kept {item:?}"),
        }
    }

    #[test]
    fn untitled_item_is_kept_when_not_prefixing() {
        let entries = entries_from(r#"<item><guid>a</guid></item>"#);

        let item = keep(normalize(
            entries.into_iter().next().unwrap(),
            Some("Feed"),
            &unbounded(),
        ));
        assert!(item.title.is_none());
    }

    #[test]
    fn payload_fields_pass_through() {
        let entries = entries_from(
            r#"<item>
                <guid>item-1</guid>
                <title>Story</title>
                <link>https://example.com/story</link>
                <description>A summary</description>
                <author>writer@example.com (Writer)</author>
                <pubDate>Wed, 03 Jan 2024 12:00:00 GMT</pubDate>
            </item>"#,
        );

        let item = keep(normalize(
            entries.into_iter().next().unwrap(),
            None,
            &unbounded(),
        ));
        assert_eq!(item.id.as_deref(), Some("item-1"));
        assert_eq!(item.link.as_deref(), Some("https://example.com/story"));
        assert_eq!(item.summary.as_deref(), Some("A summary"));
        assert_eq!(
            item.published,
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap())
        );
    }
}
