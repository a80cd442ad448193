// src/planner/mod.rs
//! The query -> tile planning pipeline.
//!
//! Stage 1 is heuristic classification (`heuristics`): zero-latency and
//! always correct. Stage 2 consults the AI provider only when Stage 1 lands
//! in the generic default bucket, and its output is forced through the
//! validator (`validate`) before anyone sees it. `plan` is total: every
//! failure path terminates in a renderable tile.

pub mod heuristics;
pub mod validate;

use metrics::counter;
use tracing::debug;

use crate::ai::AiClient;
use crate::jsonx;
use crate::tile::Tile;

pub use heuristics::{Classified, PlannerEngine};

const PLAN_SYSTEM_PROMPT: &str = r#"You convert a user's free-text query into exactly ONE dashboard tile.
Respond with STRICT JSON only: a single object, no prose, no code fences.

The object must have a "type" field from this closed set, a short "title",
and the fields listed for that type:
  "web"     -> "url" (https URL to open)
  "maps"    -> "q" (place search string)
  "rss"     -> "feeds" (array of RSS/Atom feed URLs)
  "news"    -> "feeds" (array of news feed URLs)
  "youtube" -> "playlist" (array of YouTube video ids)
  "stocks"  -> "symbols" (array of ticker symbols, uppercase)
  "gallery" -> "images" (array of image URLs)
  "spotify" -> "spotifyUrl" (full https://open.spotify.com/... URL)
  "discover"-> "q" (topic string)

Guidance:
- Shopping, products, recipes and how-to queries: "web" with a relevant URL.
  Never answer a recipe or how-to query with "rss".
- Travel, lodging, places, "near me": "maps".
- Broad news topics: "rss" or "news" with real feed URLs.
- Music, artists, playlists: "spotify" only when you can give a full
  open.spotify.com URL, otherwise "web".
- Video queries: "youtube" with concrete video ids when known.
- Tickers or market queries: "stocks".
- Visual inspiration, moodboards: "gallery".
Return exactly one object. No extra keys, no commentary."#;

const TILES_SYSTEM_PROMPT: &str = r#"You convert a user's free-text query into up to THREE dashboard tiles,
ranked most relevant first. Respond with STRICT JSON only, shaped as
{"tiles": [ ... ]} with at most 3 entries and no prose.

Each entry follows the same closed schema:
  "web" -> "url"; "maps" -> "q"; "rss"/"news" -> "feeds";
  "youtube" -> "playlist"; "stocks" -> "symbols"; "gallery" -> "images";
  "spotify" -> "spotifyUrl"; "discover" -> "q".
Every entry needs a short "title". Prefer complementary tile types over
three of a kind. No commentary outside the JSON."#;

/// Plan exactly one tile for a query. Total: never fails, never errors.
pub async fn plan(engine: &PlannerEngine, ai: &dyn AiClient, query: &str) -> Tile {
    match engine.classify(query) {
        Classified::Confident(tile) => {
            counter!("plan_heuristic_total").increment(1);
            log_plan(query, "heuristic", &tile);
            tile
        }
        Classified::Default(fallback) => match plan_with_ai(ai, query).await {
            Some(tile) => {
                counter!("plan_ai_total").increment(1);
                log_plan(query, "ai", &tile);
                tile
            }
            None => {
                counter!("plan_fallback_total").increment(1);
                log_plan(query, "fallback", &fallback);
                fallback
            }
        },
    }
}

/// Plan 1..=3 ranked tiles, primary first. The primary is always the same
/// tile `plan` would return; AI supplements only extend the list.
pub async fn plan_many(engine: &PlannerEngine, ai: &dyn AiClient, query: &str) -> Vec<Tile> {
    let primary = plan(engine, ai, query).await;

    let mut tiles = vec![primary];
    if let Some(raw) = ai.complete(TILES_SYSTEM_PROMPT, query).await {
        if let Some(v) = jsonx::loose_parse(&raw) {
            for t in validate::tiles_from_value(&v, query) {
                if tiles.len() >= 3 {
                    break;
                }
                // Skip supplements that duplicate an already-chosen type.
                if tiles.iter().all(|kept| kept.kind_label() != t.kind_label()) {
                    tiles.push(t);
                }
            }
        }
    }
    tiles
}

async fn plan_with_ai(ai: &dyn AiClient, query: &str) -> Option<Tile> {
    let raw = ai.complete(PLAN_SYSTEM_PROMPT, query).await?;
    let v = jsonx::loose_parse(&raw)?;
    validate::tile_from_value(&v, query)
}

/// Dev-only diagnostics. Queries are user text; log a short hash, never the
/// raw string.
fn log_plan(query: &str, stage: &'static str, tile: &Tile) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(query);
    debug!(target: "planner", %id, stage, kind = tile.kind_label(), "planned tile");
}

fn dev_logging_enabled() -> bool {
    let on = std::env::var("TILECAST_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
