// src/tile.rs
//! The tile descriptor: the single unit the planner produces and the
//! dashboard renders. A closed, tagged union so validation of untrusted
//! planner input is an exhaustive `match`, not a field-bag inspection.

use serde::{Deserialize, Serialize};

use crate::net;

/// One dashboard tile. Exactly one variant, and only that variant's fields,
/// is ever meaningful. `title` is always non-empty after planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Tile {
    Web {
        title: String,
        url: String,
    },
    Maps {
        title: String,
        q: String,
    },
    Rss {
        title: String,
        feeds: Vec<String>,
    },
    News {
        title: String,
        feeds: Vec<String>,
    },
    Youtube {
        title: String,
        playlist: Vec<String>,
    },
    Stocks {
        title: String,
        symbols: Vec<String>,
    },
    Gallery {
        title: String,
        images: Vec<String>,
    },
    Spotify {
        title: String,
        #[serde(rename = "spotifyUrl")]
        spotify_url: String,
    },
    Discover {
        title: String,
        q: String,
    },
}

impl Tile {
    /// The guaranteed-valid fallback: a web search for the raw query.
    /// Used whenever every richer planning path has failed.
    pub fn safe_default(query: &str) -> Tile {
        Tile::Web {
            title: format!("Search — {}", query),
            url: search_url(query),
        }
    }

    /// Fixed per-type label, used to synthesize missing titles.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Tile::Web { .. } => "Web",
            Tile::Maps { .. } => "Map",
            Tile::Rss { .. } => "Feed",
            Tile::News { .. } => "News",
            Tile::Youtube { .. } => "Video",
            Tile::Stocks { .. } => "Stocks",
            Tile::Gallery { .. } => "Gallery",
            Tile::Spotify { .. } => "Music",
            Tile::Discover { .. } => "Discover",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Tile::Web { title, .. }
            | Tile::Maps { title, .. }
            | Tile::Rss { title, .. }
            | Tile::News { title, .. }
            | Tile::Youtube { title, .. }
            | Tile::Stocks { title, .. }
            | Tile::Gallery { title, .. }
            | Tile::Spotify { title, .. }
            | Tile::Discover { title, .. } => title,
        }
    }

    /// Backfill an empty title with `"<Label> — <query>"`.
    pub fn ensure_title(mut self, query: &str) -> Tile {
        let synth = format!("{} — {}", self.kind_label(), query);
        let t = match &mut self {
            Tile::Web { title, .. }
            | Tile::Maps { title, .. }
            | Tile::Rss { title, .. }
            | Tile::News { title, .. }
            | Tile::Youtube { title, .. }
            | Tile::Stocks { title, .. }
            | Tile::Gallery { title, .. }
            | Tile::Spotify { title, .. }
            | Tile::Discover { title, .. } => title,
        };
        if t.trim().is_empty() {
            *t = synth;
        }
        self
    }
}

/// Web-search URL for a raw query (the safe-default target).
pub fn search_url(query: &str) -> String {
    net::url_with_params("https://duckduckgo.com/", &[("q", query)])
}

/// Google News RSS search URL for a raw query, UK locale bias.
pub fn news_search_feed(query: &str) -> String {
    net::url_with_params(
        "https://news.google.com/rss/search",
        &[("q", query), ("hl", "en-GB"), ("gl", "GB"), ("ceid", "GB:en")],
    )
}

/// Spotify site-search URL used when a plan wants music but has no embed URL.
/// Filler words around the artist/track are dropped before encoding.
pub fn spotify_search_url(query: &str) -> String {
    let cleaned = query
        .split_whitespace()
        .filter(|t| {
            !matches!(
                t.to_ascii_lowercase().as_str(),
                "spotify" | "play" | "listen" | "on" | "to"
            )
        })
        .collect::<Vec<_>>()
        .join(" ");
    let q = if cleaned.is_empty() { query } else { &cleaned };
    format!(
        "https://open.spotify.com/search/{}",
        percent_path_segment(q)
    )
}

pub(crate) fn percent_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
