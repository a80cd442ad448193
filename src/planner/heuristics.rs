// src/planner/heuristics.rs
//! Stage-1 intent classification: fast, deterministic, network-free.
//! Vocabulary (travel words, trip words, demonyms, UK nations) comes from
//! `config/planner.toml`, compiled once into regexes at load time. Fixed
//! structural patterns (URLs, tickers, video ids) are static.

use std::collections::HashMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::tile::{self, Tile};

pub const DEFAULT_PLANNER_CONFIG_PATH: &str = "config/planner.toml";
pub const ENV_PLANNER_CONFIG_PATH: &str = "PLANNER_CONFIG_PATH";

/// Built-in vocabulary, used when no config file is present so the service
/// boots with zero files on disk.
const BUILTIN_PLANNER_TOML: &str = include_str!("../../config/planner.toml");

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://\S+$").expect("url regex"));
static SPOTIFY_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://open\.spotify\.com/\S+").expect("spotify url regex"));
static YT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([A-Za-z0-9_-]{6,20})")
        .expect("youtube id regex")
});
static TICKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$?[A-Z]{1,5}(?:[./-][A-Z0-9]{1,4})?$").expect("ticker regex")
});
static PLACE_HINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:in|near|at)\s+\S").expect("place hint regex"));

/// How confident Stage 1 is about its answer. `Default` is the generic
/// news-search terminal state; Stage 2 may improve on it but never has to.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Confident(Tile),
    Default(Tile),
}

impl Classified {
    pub fn into_tile(self) -> Tile {
        match self {
            Classified::Confident(t) | Classified::Default(t) => t,
        }
    }
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerRoot {
    pub planner: PlannerSection,
    #[serde(default)]
    pub demonyms: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerSection {
    pub default_locale: String,
    pub trip_qualifier: String,
    pub travel_words: Vec<String>,
    pub trip_words: Vec<String>,
    pub uk_nations: Vec<String>,
}

/* ----------------------------
Compiled engine
---------------------------- */

#[derive(Debug)]
pub struct PlannerEngine {
    pub cfg: PlannerRoot,
    travel_re: Regex,
    trip_re: Regex,
    nation_re: Regex,
    uk_mention_re: Regex,
    // (pattern, country), longest demonym first to avoid prefix collisions
    demonyms: Vec<(Regex, String)>,
}

impl PlannerEngine {
    /// Load from `PLANNER_CONFIG_PATH` / `config/planner.toml`, falling back
    /// to the built-in vocabulary when the file is missing or malformed.
    pub fn load() -> Self {
        let path = std::env::var(ENV_PLANNER_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PLANNER_CONFIG_PATH));
        match std::fs::read_to_string(&path) {
            Ok(s) => Self::from_toml_str(&s).unwrap_or_else(|e| {
                tracing::warn!(error = ?e, path = %path.display(), "bad planner config, using builtin");
                Self::builtin()
            }),
            Err(_) => Self::builtin(),
        }
    }

    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_PLANNER_TOML).expect("builtin planner config")
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: PlannerRoot = toml::from_str(toml_str)?;

        let travel_re = word_alternation(&cfg.planner.travel_words)?;
        let trip_re = word_alternation(&cfg.planner.trip_words)?;
        let nation_re = word_alternation(&cfg.planner.uk_nations)?;
        let uk_mention_re = Regex::new(r"(?i)\b(?:united kingdom|uk)\b")?;

        let mut demonyms: Vec<(String, String)> = cfg
            .demonyms
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        demonyms.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
        let demonyms = demonyms
            .into_iter()
            .map(|(d, country)| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&d)))?;
                Ok((re, country))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            cfg,
            travel_re,
            trip_re,
            nation_re,
            uk_mention_re,
            demonyms,
        })
    }

    /// Stage-1 classification in fixed priority order.
    pub fn classify(&self, query: &str) -> Classified {
        let q = query.trim();

        // 1) Literal URL. Spotify/YouTube URLs keep their richer tile type.
        if URL_RE.is_match(q) {
            if SPOTIFY_URL_RE.is_match(q) {
                return Classified::Confident(
                    Tile::Spotify {
                        title: String::new(),
                        spotify_url: q.to_string(),
                    }
                    .ensure_title(q),
                );
            }
            if let Some(id) = extract_video_id(q) {
                return Classified::Confident(
                    Tile::Youtube {
                        title: String::new(),
                        playlist: vec![id],
                    }
                    .ensure_title(q),
                );
            }
            let host = crate::net::short_host(q);
            let title = if host.is_empty() { q.to_string() } else { host };
            return Classified::Confident(Tile::Web {
                title,
                url: q.to_string(),
            });
        }

        // 2) Travel / lodging vocabulary, including generic trip words.
        if self.travel_re.is_match(q) || self.trip_re.is_match(q) {
            let place = self.normalize_travel_query(q);
            return Classified::Confident(
                Tile::Maps {
                    title: String::new(),
                    q: place,
                }
                .ensure_title(q),
            );
        }

        // 3) Music. An embeddable URL keeps the spotify type; a bare keyword
        //    degrades straight to a web tile on Spotify's search page.
        if let Some(m) = SPOTIFY_URL_RE.find(q) {
            return Classified::Confident(
                Tile::Spotify {
                    title: String::new(),
                    spotify_url: m.as_str().to_string(),
                }
                .ensure_title(q),
            );
        }
        if contains_word(q, "spotify") {
            return Classified::Confident(
                Tile::Web {
                    title: String::new(),
                    url: tile::spotify_search_url(q),
                }
                .ensure_title(q),
            );
        }

        // 4) Ticker-like tokens, or an explicit "stocks" prefix.
        if let Some(symbols) = parse_symbols(q) {
            return Classified::Confident(
                Tile::Stocks {
                    title: String::new(),
                    symbols,
                }
                .ensure_title(q),
            );
        }

        // 5) YouTube URL fragment or keyword. An unparseable id leaves the
        //    playlist empty for the renderer to recover from.
        if YT_ID_RE.is_match(q) || contains_word(q, "youtube") {
            let playlist = extract_video_id(q).into_iter().collect();
            return Classified::Confident(
                Tile::Youtube {
                    title: String::new(),
                    playlist,
                }
                .ensure_title(q),
            );
        }

        // 6) Explicit news prefix.
        if let Some(rest) = strip_keyword_prefix(q, "news") {
            let topic = if rest.is_empty() { q } else { rest };
            return Classified::Confident(
                Tile::News {
                    title: String::new(),
                    feeds: vec![tile::news_search_feed(topic)],
                }
                .ensure_title(topic),
            );
        }

        // 7) Deterministic terminal default: news search feed over the query.
        Classified::Default(
            Tile::Rss {
                title: String::new(),
                feeds: vec![tile::news_search_feed(q)],
            }
            .ensure_title(q),
        )
    }

    /// Travel search-string normalization. Demonym substitution runs first;
    /// the generic default-locale append applies only when no demonym matched
    /// and the query carries no explicit place reference.
    fn normalize_travel_query(&self, query: &str) -> String {
        let mut s = query.trim().to_string();

        let mut demonym_hit = false;
        for (re, country) in &self.demonyms {
            if re.is_match(&s) {
                s = re.replace(&s, country.as_str()).to_string();
                demonym_hit = true;
                break;
            }
        }

        if self.nation_re.is_match(&s) {
            if !self.uk_mention_re.is_match(&s) {
                s = format!("{}, {}", s, self.cfg.planner.default_locale);
            }
        } else if !demonym_hit && !PLACE_HINT_RE.is_match(&s) && self.trip_re.is_match(&s) {
            s = format!("{} {}", s, self.cfg.planner.default_locale);
        }

        if !self.trip_re.is_match(&s) {
            s = format!("{} {}", s, self.cfg.planner.trip_qualifier);
        }
        s
    }
}

/// Compile a case-insensitive whole-word alternation from a word list.
fn word_alternation(words: &[String]) -> anyhow::Result<Regex> {
    let escaped = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Regex::new(&format!(r"(?i)\b(?:{})\b", escaped))?)
}

fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|t| t.eq_ignore_ascii_case(word))
}

/// "news brexit" -> Some("brexit"); "news" -> Some(""); "newsroom" -> None.
fn strip_keyword_prefix<'a>(q: &'a str, keyword: &str) -> Option<&'a str> {
    let lower = q.to_ascii_lowercase();
    if lower == keyword {
        return Some("");
    }
    lower
        .strip_prefix(keyword)
        .filter(|rest| rest.starts_with([' ', ':']))
        .map(|_| q[keyword.len()..].trim_start_matches([' ', ':']).trim())
}

/// Extract a video id from `watch?v=` / `youtu.be/` URL shapes.
pub fn extract_video_id(text: &str) -> Option<String> {
    YT_ID_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse a query as a list of ticker symbols. Accepts an explicit "stocks"
/// prefix over anything, or a query whose every token is ticker-shaped
/// (bare uppercase 1-5 letters, optional `$` prefix, optional suffix).
pub fn parse_symbols(q: &str) -> Option<Vec<String>> {
    let (body, explicit) = match strip_keyword_prefix(q, "stocks") {
        Some(rest) if !rest.is_empty() => (rest, true),
        Some(_) => return None,
        None => (q, false),
    };

    let tokens: Vec<&str> = body
        .split([',', ' ', '\t'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() || tokens.len() > 8 {
        return None;
    }
    if !explicit && !tokens.iter().all(|t| TICKER_RE.is_match(t)) {
        return None;
    }

    let symbols = tokens
        .iter()
        .map(|t| t.trim_start_matches('$').to_ascii_uppercase())
        .collect();
    Some(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eng() -> PlannerEngine {
        PlannerEngine::builtin()
    }

    #[test]
    fn literal_url_becomes_web_tile_titled_by_host() {
        let c = eng().classify("https://www.theguardian.com/uk");
        match c {
            Classified::Confident(Tile::Web { title, url }) => {
                assert_eq!(title, "theguardian.com");
                assert_eq!(url, "https://www.theguardian.com/uk");
            }
            other => panic!("expected web tile, got {:?}", other),
        }
    }

    #[test]
    fn youtube_url_keeps_video_type() {
        let c = eng().classify("https://youtu.be/dQw4w9WgXcQ");
        match c {
            Classified::Confident(Tile::Youtube { playlist, .. }) => {
                assert_eq!(playlist, vec!["dQw4w9WgXcQ".to_string()]);
            }
            other => panic!("expected youtube tile, got {:?}", other),
        }
    }

    #[test]
    fn travel_query_with_place_is_left_alone() {
        let c = eng().classify("weekend retreat in Bath");
        match c {
            Classified::Confident(Tile::Maps { q, .. }) => {
                assert!(q.contains("Bath"));
                assert!(!q.contains("United Kingdom"));
            }
            other => panic!("expected maps tile, got {:?}", other),
        }
    }

    #[test]
    fn travel_query_with_uk_suffix_is_not_duplicated() {
        let c = eng().classify("weekend retreat in Bath, UK");
        match c {
            Classified::Confident(Tile::Maps { q, .. }) => {
                assert_eq!(q.matches("United Kingdom").count(), 0);
                assert_eq!(q.to_lowercase().matches("uk").count(), 1);
            }
            other => panic!("expected maps tile, got {:?}", other),
        }
    }

    #[test]
    fn placeless_trip_query_gets_default_locale() {
        let c = eng().classify("spa weekend");
        match c {
            Classified::Confident(Tile::Maps { q, .. }) => {
                assert!(q.contains("United Kingdom"), "got {q}");
            }
            other => panic!("expected maps tile, got {:?}", other),
        }
    }

    #[test]
    fn demonym_resolves_to_country() {
        let c = eng().classify("Thai beach holiday");
        match c {
            Classified::Confident(Tile::Maps { q, .. }) => {
                assert!(q.contains("Thailand"), "got {q}");
                assert!(!q.contains("Thai "), "demonym should be substituted: {q}");
            }
            other => panic!("expected maps tile, got {:?}", other),
        }
    }

    #[test]
    fn scottish_demonym_lands_in_uk() {
        let c = eng().classify("Scottish staycation ideas");
        match c {
            Classified::Confident(Tile::Maps { q, .. }) => {
                assert!(q.contains("Scotland"), "got {q}");
                assert_eq!(q.matches("United Kingdom").count(), 1, "got {q}");
            }
            other => panic!("expected maps tile, got {:?}", other),
        }
    }

    #[test]
    fn qualifier_appended_when_no_trip_word_remains() {
        let c = eng().classify("spa in Bath");
        match c {
            Classified::Confident(Tile::Maps { q, .. }) => {
                assert!(q.ends_with("holiday ideas"), "got {q}");
            }
            other => panic!("expected maps tile, got {:?}", other),
        }
    }

    #[test]
    fn ticker_tokens_parse_into_stocks_tile() {
        let c = eng().classify("$AAPL, MSFT BTC-USD");
        match c {
            Classified::Confident(Tile::Stocks { symbols, .. }) => {
                assert_eq!(symbols, vec!["AAPL", "MSFT", "BTC-USD"]);
            }
            other => panic!("expected stocks tile, got {:?}", other),
        }
    }

    #[test]
    fn stocks_prefix_forces_symbol_parse() {
        let c = eng().classify("stocks aapl, tsla");
        match c {
            Classified::Confident(Tile::Stocks { symbols, .. }) => {
                assert_eq!(symbols, vec!["AAPL", "TSLA"]);
            }
            other => panic!("expected stocks tile, got {:?}", other),
        }
    }

    #[test]
    fn lowercase_words_are_not_tickers() {
        let c = eng().classify("apple pie recipe");
        assert!(matches!(c, Classified::Default(Tile::Rss { .. })));
    }

    #[test]
    fn spotify_keyword_degrades_to_web_search() {
        let c = eng().classify("play oasis on spotify");
        match c {
            Classified::Confident(Tile::Web { url, .. }) => {
                assert!(url.starts_with("https://open.spotify.com/search/"), "got {url}");
            }
            other => panic!("expected web tile, got {:?}", other),
        }
    }

    #[test]
    fn news_prefix_builds_search_feed() {
        let c = eng().classify("news premier league");
        match c {
            Classified::Confident(Tile::News { feeds, title }) => {
                assert_eq!(feeds.len(), 1);
                assert!(feeds[0].starts_with("https://news.google.com/rss/search?q="));
                assert!(title.contains("premier league"));
            }
            other => panic!("expected news tile, got {:?}", other),
        }
    }

    #[test]
    fn default_is_deterministic_rss_search() {
        let a = eng().classify("interesting things about bees");
        let b = eng().classify("interesting things about bees");
        assert_eq!(a, b);
        assert!(matches!(a, Classified::Default(Tile::Rss { .. })));
    }
}
