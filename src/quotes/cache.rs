// src/quotes/cache.rs
//! Process-lifetime advisory caches for symbol resolution. Monotonic and
//! best-effort: a lost update under concurrent writers only costs a
//! redundant provider call, never a wrong quote. Injected into the resolver
//! so tests can observe hits and reset state between runs.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
pub struct CoinId {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct ResolverCache {
    // crypto: symbol -> provider coin id, grows monotonically
    coin_ids: RwLock<HashMap<String, CoinId>>,
    // equities: base symbol -> working exchange suffix
    suffix_hits: RwLock<HashMap<String, String>>,
    // equities: symbols known to resolve nowhere
    dead: RwLock<HashSet<String>>,
}

impl ResolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coin_id(&self, symbol: &str) -> Option<CoinId> {
        self.coin_ids
            .read()
            .ok()
            .and_then(|m| m.get(symbol).cloned())
    }

    pub fn remember_coin(&self, symbol: &str, coin: CoinId) {
        if let Ok(mut m) = self.coin_ids.write() {
            m.insert(symbol.to_string(), coin);
        }
    }

    pub fn suffix_for(&self, symbol: &str) -> Option<String> {
        self.suffix_hits
            .read()
            .ok()
            .and_then(|m| m.get(symbol).cloned())
    }

    pub fn remember_suffix(&self, symbol: &str, suffix: &str) {
        if let Ok(mut m) = self.suffix_hits.write() {
            m.insert(symbol.to_string(), suffix.to_string());
        }
    }

    pub fn is_dead(&self, symbol: &str) -> bool {
        self.dead
            .read()
            .map(|s| s.contains(symbol))
            .unwrap_or(false)
    }

    pub fn mark_dead(&self, symbol: &str) {
        if let Ok(mut s) = self.dead.write() {
            s.insert(symbol.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_ids_round_trip() {
        let c = ResolverCache::new();
        assert!(c.coin_id("BTC").is_none());
        c.remember_coin(
            "BTC",
            CoinId {
                id: "bitcoin".into(),
                name: "Bitcoin".into(),
            },
        );
        assert_eq!(c.coin_id("BTC").unwrap().id, "bitcoin");
    }

    #[test]
    fn suffixes_and_dead_set() {
        let c = ResolverCache::new();
        assert!(c.suffix_for("AAPL").is_none());
        c.remember_suffix("AAPL", ".us");
        assert_eq!(c.suffix_for("AAPL").as_deref(), Some(".us"));

        assert!(!c.is_dead("ZZZZZ"));
        c.mark_dead("ZZZZZ");
        assert!(c.is_dead("ZZZZZ"));
    }
}
