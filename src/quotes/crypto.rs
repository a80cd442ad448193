// src/quotes/crypto.rs
//! CoinGecko path: symbol -> coin-id search, then simple price + 24h change.

use async_trait::async_trait;
use serde::Deserialize;

use crate::net;
use crate::quotes::cache::CoinId;
use crate::quotes::CoinLookup;

pub struct CoinGecko;

#[async_trait]
impl CoinLookup for CoinGecko {
    async fn search(&self, symbol: &str) -> Option<CoinId> {
        #[derive(Deserialize)]
        struct Resp {
            coins: Vec<Hit>,
        }
        #[derive(Deserialize)]
        struct Hit {
            id: String,
            symbol: String,
            name: String,
        }

        let url = net::url_with_params(
            "https://api.coingecko.com/api/v3/search",
            &[("query", symbol)],
        );
        let resp: Resp = net::get_json(&url).await?;

        // Exact symbol match preferred, else the first (best-ranked) result.
        let exact = resp
            .coins
            .iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol));
        let hit = exact.or_else(|| resp.coins.first())?;
        Some(CoinId {
            id: hit.id.clone(),
            name: hit.name.clone(),
        })
    }

    async fn price(&self, id: &str, vs: &str) -> Option<(f64, f64)> {
        let vs_lower = vs.to_ascii_lowercase();
        let change_key = format!("{}_24h_change", vs_lower);
        let url = net::url_with_params(
            "https://api.coingecko.com/api/v3/simple/price",
            &[
                ("ids", id),
                ("vs_currencies", vs_lower.as_str()),
                ("include_24hr_change", "true"),
            ],
        );
        let body: serde_json::Value = net::get_json(&url).await?;
        let entry = body.get(id)?;
        let price = entry.get(&vs_lower)?.as_f64().filter(|p| p.is_finite())?;
        let pct = entry
            .get(&change_key)
            .and_then(serde_json::Value::as_f64)
            .filter(|c| c.is_finite())
            .unwrap_or(0.0);
        Some((price, pct))
    }
}
