// src/feed/mod.rs
//! Tolerant RSS 2.0 / Atom parsing into a normalized item list. This is
//! pattern extraction over a pull-event stream, not strict XML validation:
//! real-world feeds carry unclosed tags, stray entities and HTML-stuffed
//! descriptions, and a malformed block must cost one item at most.

pub mod reltime;

use metrics::{counter, histogram};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::extract::strip_html;
use crate::net;

/// Cap per feed; the dashboard renders a short list.
const MAX_ITEMS: usize = 20;
const DESCRIPTION_CAP: usize = 500;

/// Normalized news entry. Constructed fresh per fetch, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Absolute URL, or empty when the item has no usable image.
    pub image: String,
    /// Hostname of the link, `www.`-stripped.
    pub source: String,
    /// Relative age ("3h ago"), empty when the pubdate didn't parse.
    pub time: String,
}

/// Try feed URLs strictly in order; first non-empty parse wins. All-fail
/// returns an empty list plus an error indicator, never an Err.
pub async fn fetch_first(urls: &[String]) -> (Vec<FeedItem>, Option<String>) {
    for url in urls {
        match net::get_text(url).await {
            Some(body) => {
                let t0 = std::time::Instant::now();
                let items = parse_feed(&body);
                histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                if !items.is_empty() {
                    counter!("feed_items_total").increment(items.len() as u64);
                    return (items, None);
                }
                tracing::debug!(url, "feed parsed to zero items, trying next");
            }
            None => {
                tracing::debug!(url, "feed fetch failed, trying next");
            }
        }
    }
    (Vec::new(), Some("all feeds failed".to_string()))
}

#[derive(Default)]
struct RawItem {
    title: String,
    link_text: String,
    atom_link: Option<String>,
    description: String,
    content: String,
    // (priority, raw timestamp), lower priority wins
    date: Option<(u8, String)>,
    media_image: Option<String>,
    enclosure: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Target {
    Title,
    Link,
    Description,
    Content,
    Date(u8),
    None,
}

/// Parse one XML body into items. `<item>` blocks first; a feed without any
/// falls back to Atom `<entry>` blocks (both shapes share this single pass).
pub fn parse_feed(xml: &str) -> Vec<FeedItem> {
    let mut reader = Reader::from_str(xml);
    {
        let cfg = reader.config_mut();
        cfg.check_end_names = false;
        cfg.trim_text_start = true;
        cfg.trim_text_end = true;
    }

    let mut items: Vec<FeedItem> = Vec::new();
    let mut pending: Option<RawItem> = None;
    let mut target = Target::None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                if is_item_tag(&name) {
                    pending = Some(RawItem::default());
                    target = Target::None;
                    continue;
                }
                if let Some(item) = pending.as_mut() {
                    match field_target(&name) {
                        Target::Link => {
                            // Atom links carry the URL in an href attribute;
                            // RSS links carry it as element text.
                            if !take_atom_href(item, &e) {
                                target = Target::Link;
                            }
                        }
                        Target::None => take_media_attrs(item, &name, &e),
                        t => target = t,
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name().as_ref().to_vec();
                if let Some(item) = pending.as_mut() {
                    if field_target(&name) == Target::Link {
                        take_atom_href(item, &e);
                    } else {
                        take_media_attrs(item, &name, &e);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(item) = pending.as_mut() {
                    let text = t
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(t.as_ref()).into_owned());
                    append_text(item, target, &text);
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(item) = pending.as_mut() {
                    let text = String::from_utf8_lossy(t.as_ref()).into_owned();
                    append_text(item, target, &text);
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name().as_ref().to_vec();
                if is_item_tag(&name) {
                    if let Some(raw) = pending.take() {
                        if let Some(done) = finalize(raw) {
                            items.push(done);
                            if items.len() >= MAX_ITEMS {
                                break;
                            }
                        }
                    }
                    target = Target::None;
                } else if field_target(&name) != Target::None {
                    target = Target::None;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            // Tolerance: skip past malformed stretches instead of aborting
            // the whole feed.
            Err(_) => {
                if pending.take().is_some() {
                    target = Target::None;
                    continue;
                }
                break;
            }
        }
    }

    items
}

fn is_item_tag(name: &[u8]) -> bool {
    name == b"item" || name == b"entry"
}

fn field_target(name: &[u8]) -> Target {
    if name == b"title" {
        Target::Title
    } else if name == b"link" {
        Target::Link
    } else if name == b"description" || name == b"summary" {
        Target::Description
    } else if name == b"content:encoded" || name == b"content" {
        Target::Content
    } else if name == b"pubDate" {
        Target::Date(0)
    } else if name == b"published" {
        Target::Date(1)
    } else if name == b"updated" {
        Target::Date(2)
    } else if name == b"dc:date" {
        Target::Date(3)
    } else {
        Target::None
    }
}

fn append_text(item: &mut RawItem, target: Target, text: &str) {
    let buf = match target {
        Target::Title => &mut item.title,
        Target::Link => &mut item.link_text,
        Target::Description => &mut item.description,
        Target::Content => &mut item.content,
        Target::Date(prio) => {
            match &item.date {
                Some((kept, _)) if *kept <= prio => {}
                _ => item.date = Some((prio, text.trim().to_string())),
            }
            return;
        }
        Target::None => return,
    };
    buf.push_str(text);
}

/// Returns true when an href was consumed (Atom-style link element).
fn take_atom_href(item: &mut RawItem, e: &BytesStart) -> bool {
    let mut href = None;
    let mut rel = None;
    for attr in e.attributes().with_checks(false).flatten() {
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        if attr.key.as_ref() == b"href" {
            href = Some(value);
        } else if attr.key.as_ref() == b"rel" {
            rel = Some(value);
        }
    }
    let Some(href) = href else { return false };
    // Prefer the alternate (or unqualified) link; never the self link.
    match rel.as_deref() {
        None | Some("alternate") => item.atom_link = Some(href),
        Some("self") => {}
        _ => {
            if item.atom_link.is_none() {
                item.atom_link = Some(href);
            }
        }
    }
    true
}

fn take_media_attrs(item: &mut RawItem, name: &[u8], e: &BytesStart) {
    let slot = if name == b"media:thumbnail" || name == b"media:content" {
        &mut item.media_image
    } else if name == b"enclosure" {
        &mut item.enclosure
    } else {
        return;
    };
    if slot.is_some() {
        return;
    }
    for attr in e.attributes().with_checks(false).flatten() {
        if attr.key.as_ref() == b"url" {
            let url = String::from_utf8_lossy(&attr.value).into_owned();
            if !url.is_empty() {
                *slot = Some(url);
            }
            return;
        }
    }
}

fn finalize(raw: RawItem) -> Option<FeedItem> {
    let title = strip_html(&raw.title, 300);
    let link = match raw.link_text.trim() {
        "" => raw.atom_link.clone().unwrap_or_default(),
        t => t.to_string(),
    };
    // An item needs at least one of title/link to be renderable.
    if title.is_empty() && link.is_empty() {
        return None;
    }

    let body_html = if !raw.description.trim().is_empty() {
        raw.description
    } else {
        raw.content
    };

    let image = raw
        .media_image
        .or(raw.enclosure)
        .or_else(|| first_img_src(&body_html))
        .map(|u| absolutize(&u))
        .unwrap_or_default();

    let time = raw
        .date
        .map(|(_, ts)| reltime::format_relative(&ts))
        .unwrap_or_default();

    Some(FeedItem {
        description: strip_html(&body_html, DESCRIPTION_CAP),
        source: net::short_host(&link),
        title,
        link,
        image,
        time,
    })
}

/// First `<img src>` inside an HTML fragment.
fn first_img_src(html: &str) -> Option<String> {
    static IMG_RE: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
        regex::Regex::new(r#"(?is)<img[^>]+src=["']?([^"'\s>]+)"#).expect("img regex")
    });
    IMG_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Protocol-relative URLs normalize to https.
fn absolutize(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        url.to_string()
    }
}
