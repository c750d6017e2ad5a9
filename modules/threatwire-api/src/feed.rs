//! RSS rendering: a pure formatter over the store's normalized items.
//! Title decoration (kind prefix, bracketed country name) happens here, not
//! in the query surface.

use chrono::Utc;
use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use threatwire_common::{country_display_name, Config, NewsItem};

/// Feed entry title: kind-specific prefix, plus a bracketed country display
/// name for victims when one is known.
pub fn entry_title(item: &NewsItem) -> String {
    if item.kind == "victim" {
        match item.country.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => format!(
                "[Ransomware] [{}] {}",
                country_display_name(code),
                item.title
            ),
            None => format!("[Ransomware] {}", item.title),
        }
    } else {
        format!("[Cyber Incident] {}", item.title)
    }
}

/// Build the RSS 2.0 channel. Items are expected newest-first, as the store
/// returns them.
pub fn build_channel(items: &[NewsItem], config: &Config) -> Channel {
    let entries: Vec<Item> = items
        .iter()
        .map(|item| {
            ItemBuilder::default()
                .title(Some(entry_title(item)))
                .link(Some(item.url.clone()))
                .description(Some(item.summary.clone()))
                .guid(Some(
                    GuidBuilder::default()
                        .value(item.url.clone())
                        .permalink(true)
                        .build(),
                ))
                .pub_date(Some(item.created_at.to_rfc2822()))
                .build()
        })
        .collect();

    ChannelBuilder::default()
        .title(config.feed_title.clone())
        .link(format!("http://{}:{}/", config.host, config.port))
        .description(config.feed_description.clone())
        .language(Some("en-us".to_string()))
        .generator(Some("Threatwire".to_string()))
        .last_build_date(Some(Utc::now().to_rfc2822()))
        .items(entries)
        .build()
}

/// Full feed document with the XML declaration some readers insist on.
pub fn render_feed(items: &[NewsItem], config: &Config) -> String {
    let channel = build_channel(items, config);
    format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>{channel}")
}
