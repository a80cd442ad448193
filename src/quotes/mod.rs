// src/quotes/mod.rs
//! Quote resolution: ticker-like symbols in, one quote (or one error
//! variant) per symbol out. Crypto resolves through a coin-id search;
//! equities and indices resolve through suffix probing against a CSV quote
//! provider. Per-symbol failures never abort the batch.

pub mod cache;
pub mod crypto;
pub mod equity;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use metrics::counter;
use serde::Serialize;

use cache::{CoinId, ResolverCache};
use equity::CsvRow;

/// Coin search + simple-price provider (CoinGecko in production).
#[async_trait]
pub trait CoinLookup: Send + Sync {
    async fn search(&self, symbol: &str) -> Option<CoinId>;
    /// Returns (price, 24h percent change) in the `vs` currency.
    async fn price(&self, id: &str, vs: &str) -> Option<(f64, f64)>;
}

/// CSV quote-row provider (Stooq in production).
#[async_trait]
pub trait EquityCsv: Send + Sync {
    async fn quote_row(&self, provider_symbol: &str) -> Option<CsvRow>;
}

/// One resolved symbol: either a full quote or the symbol's error variant,
/// never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Quote {
    Priced {
        symbol: String,
        name: String,
        price: f64,
        change: f64,
        change_pct: f64,
        currency: String,
        provider: &'static str,
        as_of: String,
    },
    Failed {
        symbol: String,
        error: String,
    },
}

impl Quote {
    pub fn symbol(&self) -> &str {
        match self {
            Quote::Priced { symbol, .. } | Quote::Failed { symbol, .. } => symbol,
        }
    }
    pub fn is_error(&self) -> bool {
        matches!(self, Quote::Failed { .. })
    }
}

enum SymbolKind {
    /// base/quote pair; `bare` marks a plain short token that may still turn
    /// out to be an equity.
    Crypto {
        base: String,
        quote: String,
        bare: bool,
    },
    Equity,
}

pub struct QuoteService {
    cache: Arc<ResolverCache>,
    coins: Arc<dyn CoinLookup>,
    equities: Arc<dyn EquityCsv>,
}

impl QuoteService {
    pub fn new(
        cache: Arc<ResolverCache>,
        coins: Arc<dyn CoinLookup>,
        equities: Arc<dyn EquityCsv>,
    ) -> Self {
        Self {
            cache,
            coins,
            equities,
        }
    }

    /// Production wiring: CoinGecko + Stooq behind a fresh cache.
    pub fn live() -> Self {
        Self::new(
            Arc::new(ResolverCache::new()),
            Arc::new(crypto::CoinGecko),
            Arc::new(equity::Stooq),
        )
    }

    /// Resolve a batch concurrently. One result per input symbol, order
    /// preserved.
    pub async fn resolve(&self, symbols: &[String]) -> Vec<Quote> {
        join_all(symbols.iter().map(|s| self.resolve_one(s))).await
    }

    async fn resolve_one(&self, raw: &str) -> Quote {
        let symbol = normalize_symbol(raw);
        if symbol.is_empty() {
            return Quote::Failed {
                symbol: raw.to_string(),
                error: "empty symbol".to_string(),
            };
        }

        match classify(&symbol) {
            SymbolKind::Crypto { base, quote, bare } => {
                if let Some(q) = self.crypto_quote(&symbol, &base, &quote).await {
                    return q;
                }
                // A short bare token that isn't a coin may still be a ticker.
                if bare {
                    if let Some(q) = self.equity_quote(&symbol).await {
                        return q;
                    }
                }
                failed(&symbol)
            }
            SymbolKind::Equity => self
                .equity_quote(&symbol)
                .await
                .unwrap_or_else(|| failed(&symbol)),
        }
    }

    async fn crypto_quote(&self, symbol: &str, base: &str, quote: &str) -> Option<Quote> {
        let coin = match self.cache.coin_id(base) {
            Some(c) => {
                counter!("quotes_cache_hits_total").increment(1);
                c
            }
            None => {
                let c = self.coins.search(base).await?;
                self.cache.remember_coin(base, c.clone());
                c
            }
        };

        let (price, pct) = self.coins.price(&coin.id, quote).await?;
        Some(Quote::Priced {
            symbol: symbol.to_string(),
            name: coin.name,
            price,
            change: price * pct / 100.0,
            change_pct: pct,
            currency: quote.to_string(),
            provider: "coingecko",
            as_of: now_rfc3339(),
        })
    }

    async fn equity_quote(&self, symbol: &str) -> Option<Quote> {
        if self.cache.is_dead(symbol) {
            counter!("quotes_cache_hits_total").increment(1);
            return None;
        }

        // Indices skip probing entirely.
        if let Some((provider_symbol, currency)) = equity::index_override(symbol) {
            counter!("quotes_probe_calls_total").increment(1);
            let row = self.equities.quote_row(provider_symbol).await?;
            return Some(priced_from_row(symbol, currency, &row));
        }

        // Known suffix: one direct call, no probing.
        if let Some(suffix) = self.cache.suffix_for(symbol) {
            counter!("quotes_cache_hits_total").increment(1);
            counter!("quotes_probe_calls_total").increment(1);
            let currency = currency_for_suffix(&suffix);
            let row = self
                .equities
                .quote_row(&format!("{}{}", symbol, suffix))
                .await?;
            return Some(priced_from_row(symbol, currency, &row));
        }

        for (suffix, currency) in equity::SUFFIXES {
            counter!("quotes_probe_calls_total").increment(1);
            if let Some(row) = self
                .equities
                .quote_row(&format!("{}{}", symbol, suffix))
                .await
            {
                self.cache.remember_suffix(symbol, suffix);
                return Some(priced_from_row(symbol, currency, &row));
            }
        }

        self.cache.mark_dead(symbol);
        None
    }
}

fn priced_from_row(symbol: &str, currency: &str, row: &CsvRow) -> Quote {
    let (change, pct) = if row.open.is_finite() && row.open != 0.0 {
        (row.close - row.open, (row.close / row.open - 1.0) * 100.0)
    } else {
        (0.0, 0.0)
    };
    Quote::Priced {
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        price: row.close,
        change,
        change_pct: pct,
        currency: currency.to_string(),
        provider: "stooq",
        as_of: now_rfc3339(),
    }
}

fn failed(symbol: &str) -> Quote {
    Quote::Failed {
        symbol: symbol.to_string(),
        error: "unresolved symbol".to_string(),
    }
}

fn currency_for_suffix(suffix: &str) -> &'static str {
    equity::SUFFIXES
        .iter()
        .find(|(s, _)| *s == suffix)
        .map(|(_, c)| *c)
        .unwrap_or("USD")
}

/// Uppercase; whitespace/underscore runs collapse to a single hyphen.
pub fn normalize_symbol(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '_' {
            pending_sep = !out.is_empty();
            continue;
        }
        if pending_sep {
            out.push('-');
            pending_sep = false;
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}

fn classify(symbol: &str) -> SymbolKind {
    if let Some(base) = symbol.strip_suffix("-USD") {
        return SymbolKind::Crypto {
            base: base.to_string(),
            quote: "USD".to_string(),
            bare: false,
        };
    }
    for sep in ['-', '/'] {
        let parts: Vec<&str> = symbol.split(sep).collect();
        if parts.len() == 2 && parts.iter().all(|p| is_bare_token(p)) {
            return SymbolKind::Crypto {
                base: parts[0].to_string(),
                quote: parts[1].to_string(),
                bare: false,
            };
        }
    }
    if is_bare_token(symbol) {
        return SymbolKind::Crypto {
            base: symbol.to_string(),
            quote: "USD".to_string(),
            bare: true,
        };
    }
    SymbolKind::Equity
}

fn is_bare_token(s: &str) -> bool {
    (2..=10).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
