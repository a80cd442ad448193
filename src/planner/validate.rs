// src/planner/validate.rs
//! Validation of untrusted model output against the closed tile enumeration.
//! Unknown types are rejected outright; known types get their required
//! fields backfilled from the original query so the renderer never sees a
//! half-formed tile.

use serde_json::Value;

use crate::planner::heuristics::extract_video_id;
use crate::tile::{self, Tile};

/// Symbols used when a stocks plan arrives without any.
const DEFAULT_SYMBOLS: [&str; 3] = ["AAPL", "MSFT", "NVDA"];

/// Build exactly one validated tile from a model-produced JSON value.
/// `None` means the value is unusable (unknown type, not an object) and the
/// caller must fall back to its heuristic tile.
pub fn tile_from_value(v: &Value, query: &str) -> Option<Tile> {
    let obj = v.as_object()?;
    let kind = obj.get("type")?.as_str()?.to_ascii_lowercase();
    let title = str_field(v, "title").unwrap_or_default();

    let tile = match kind.as_str() {
        "web" => Tile::Web {
            title,
            url: str_field(v, "url").unwrap_or_else(|| tile::search_url(query)),
        },
        "maps" => Tile::Maps {
            title,
            q: str_field(v, "q").unwrap_or_else(|| query.to_string()),
        },
        "rss" => Tile::Rss {
            title,
            feeds: feeds_or_default(v, query),
        },
        "news" => Tile::News {
            title,
            feeds: feeds_or_default(v, query),
        },
        "youtube" => Tile::Youtube {
            title,
            playlist: match vec_field(v, "playlist") {
                Some(ids) if !ids.is_empty() => ids,
                _ => extract_video_id(query).into_iter().collect(),
            },
        },
        "stocks" => Tile::Stocks {
            title,
            symbols: match vec_field(v, "symbols") {
                Some(syms) if !syms.is_empty() => {
                    syms.iter().map(|s| s.to_ascii_uppercase()).collect()
                }
                _ => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            },
        },
        "gallery" => Tile::Gallery {
            title,
            images: match vec_field(v, "images") {
                Some(imgs) if !imgs.is_empty() => imgs,
                _ => default_gallery(query),
            },
        },
        "spotify" => {
            // Type-changing fallback: a spotify tile without an embeddable
            // URL is rewritten to a web tile on Spotify's search page.
            match str_field(v, "spotifyUrl")
                .or_else(|| str_field(v, "spotify_url"))
                .filter(|u| u.starts_with("https://open.spotify.com/"))
            {
                Some(u) => Tile::Spotify {
                    title,
                    spotify_url: u,
                },
                None => Tile::Web {
                    title,
                    url: tile::spotify_search_url(query),
                },
            }
        }
        "discover" => Tile::Discover {
            title,
            q: str_field(v, "q").unwrap_or_else(|| query.to_string()),
        },
        _ => return None,
    };

    Some(tile.ensure_title(query))
}

/// Multi-tile variant: accepts `{"tiles": [...]}`, a bare array, or a single
/// object; drops invalid entries; caps the result at 3, order-preserved.
pub fn tiles_from_value(v: &Value, query: &str) -> Vec<Tile> {
    let entries: Vec<&Value> = if let Some(arr) = v.get("tiles").and_then(Value::as_array) {
        arr.iter().collect()
    } else if let Some(arr) = v.as_array() {
        arr.iter().collect()
    } else {
        vec![v]
    };

    entries
        .into_iter()
        .filter_map(|e| tile_from_value(e, query))
        .take(3)
        .collect()
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn vec_field(v: &Value, key: &str) -> Option<Vec<String>> {
    let arr = v.get(key)?.as_array()?;
    Some(
        arr.iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

fn feeds_or_default(v: &Value, query: &str) -> Vec<String> {
    match vec_field(v, "feeds") {
        Some(feeds) if !feeds.is_empty() => feeds,
        _ => vec![tile::news_search_feed(query)],
    }
}

/// Small deterministic set of generated search-image URLs.
fn default_gallery(query: &str) -> Vec<String> {
    let enc = tile::percent_path_segment(query);
    (1..=4)
        .map(|i| format!("https://source.unsplash.com/800x600/?{}&sig={}", enc, i))
        .collect()
}
