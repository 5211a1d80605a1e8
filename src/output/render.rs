//! Serialization of the combined feed to standard wire formats.
//!
//! RSS 2.0 goes through the `rss` crate, Atom 1.0 through `atom_syndication`.
//! Rendering is pure string assembly; all validation happened earlier.

use crate::config::OutputFormat;
use crate::feed::FeedItem;
use crate::output::build::CombinedFeed;

/// Renders the combined feed as XML in the requested format.
pub fn render(feed: &CombinedFeed, format: OutputFormat) -> String {
    match format {
        OutputFormat::Rss => render_rss(feed),
        OutputFormat::Atom => render_atom(feed),
    }
}

fn render_rss(feed: &CombinedFeed) -> String {
    let items: Vec<rss::Item> = feed.items.iter().map(rss_item).collect();

    let mut builder = rss::ChannelBuilder::default();
    builder
        .title(feed.title.clone())
        .description(feed.description.clone())
        .last_build_date(feed.last_updated.to_rfc2822())
        .items(items);

    if let Some(image_url) = &feed.image_url {
        builder.image(
            rss::ImageBuilder::default()
                .url(image_url.clone())
                .title(feed.title.clone())
                .link(image_url.clone())
                .build(),
        );
    }

    let channel = builder.build();
    // rss's Display emits the <rss> element only; add the declaration
    format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n{channel}")
}

fn rss_item(item: &FeedItem) -> rss::Item {
    let mut builder = rss::ItemBuilder::default();
    builder
        .title(item.title.clone())
        .link(item.link.clone())
        .description(item.summary.clone())
        .author(item.author.clone())
        .pub_date(item.published.map(|d| d.to_rfc2822()));

    if let Some(id) = &item.id {
        builder.guid(
            rss::GuidBuilder::default()
                .value(id.clone())
                .permalink(false)
                .build(),
        );
    }

    builder.build()
}

fn render_atom(feed: &CombinedFeed) -> String {
    let mut atom = atom_syndication::Feed::default();
    atom.set_id(feed_id(&feed.title));
    atom.set_title(atom_syndication::Text::plain(feed.title.clone()));
    atom.set_subtitle(Some(atom_syndication::Text::plain(
        feed.description.clone(),
    )));
    atom.set_updated(feed.last_updated);
    atom.set_logo(feed.image_url.clone());
    atom.set_entries(
        feed.items
            .iter()
            .enumerate()
            .map(|(idx, item)| atom_entry(item, idx, feed))
            .collect::<Vec<_>>(),
    );

    // atom_syndication's Display already includes the XML declaration
    atom.to_string()
}

fn atom_entry(
    item: &FeedItem,
    idx: usize,
    feed: &CombinedFeed,
) -> atom_syndication::Entry {
    let mut entry = atom_syndication::Entry::default();

    // Atom requires an id; fall back to the link, then a synthetic one
    let id = item
        .id
        .clone()
        .or_else(|| item.link.clone())
        .unwrap_or_else(|| format!("{}:{idx}", feed_id(&feed.title)));
    entry.set_id(id);

    entry.set_title(atom_syndication::Text::plain(
        item.title.clone().unwrap_or_default(),
    ));
    // Atom requires updated; use the item's own time when it has one
    entry.set_updated(item.published.unwrap_or(feed.last_updated));
    entry.set_published(item.published.map(atom_syndication::FixedDateTime::from));

    if let Some(href) = &item.link {
        let mut link = atom_syndication::Link::default();
        link.set_href(href.clone());
        entry.set_links(vec![link]);
    }
    entry.set_summary(item.summary.clone().map(atom_syndication::Text::plain));
    if let Some(name) = &item.author {
        let mut person = atom_syndication::Person::default();
        person.set_name(name.clone());
        entry.set_authors(vec![person]);
    }

    entry
}

fn feed_id(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    format!("urn:onefeed:{slug}")
}
