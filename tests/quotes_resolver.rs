// tests/quotes_resolver.rs
//
// Resolver behavior against counting stub providers: batch resilience,
// order preservation, and suffix/coin-id memoization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use tilecast::quotes::cache::{CoinId, ResolverCache};
use tilecast::quotes::equity::CsvRow;
use tilecast::quotes::{CoinLookup, EquityCsv, Quote, QuoteService};

/// Knows exactly one coin: BTC -> bitcoin at 65_000, +2% on the day.
#[derive(Default)]
struct StubCoins {
    searches: AtomicUsize,
    prices: AtomicUsize,
}

#[async_trait]
impl CoinLookup for StubCoins {
    async fn search(&self, symbol: &str) -> Option<CoinId> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        (symbol == "BTC").then(|| CoinId {
            id: "bitcoin".into(),
            name: "Bitcoin".into(),
        })
    }

    async fn price(&self, id: &str, vs: &str) -> Option<(f64, f64)> {
        self.prices.fetch_add(1, Ordering::SeqCst);
        (id == "bitcoin" && vs == "USD").then_some((65_000.0, 2.0))
    }
}

/// Serves exactly one listing: AAPL on the `.us` suffix.
#[derive(Default)]
struct StubEquities {
    calls: AtomicUsize,
}

#[async_trait]
impl EquityCsv for StubEquities {
    async fn quote_row(&self, provider_symbol: &str) -> Option<CsvRow> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (provider_symbol == "AAPL.us").then(|| CsvRow {
            symbol: "AAPL.US".into(),
            open: 220.0,
            close: 224.4,
        })
    }
}

fn service() -> (QuoteService, Arc<StubCoins>, Arc<StubEquities>) {
    let coins = Arc::new(StubCoins::default());
    let equities = Arc::new(StubEquities::default());
    let svc = QuoteService::new(
        Arc::new(ResolverCache::new()),
        coins.clone(),
        equities.clone(),
    );
    (svc, coins, equities)
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn batch_is_order_preserving_and_failure_isolated() {
    let (svc, _, _) = service();
    let out = svc
        .resolve(&symbols(&["AAPL", "NOT_A_REAL_SYMBOL", "BTC"]))
        .await;

    assert_eq!(out.len(), 3, "one result per input symbol");
    assert_eq!(out[0].symbol(), "AAPL");
    assert_eq!(out[1].symbol(), "NOT-A-REAL-SYMBOL");
    assert_eq!(out[2].symbol(), "BTC");

    assert_eq!(out.iter().filter(|q| q.is_error()).count(), 1);
    assert!(out[1].is_error());

    match &out[0] {
        Quote::Priced {
            price, provider, ..
        } => {
            assert!(price.is_finite());
            assert_eq!(*provider, "stooq");
        }
        other => panic!("AAPL should price, got {:?}", other),
    }
    match &out[2] {
        Quote::Priced {
            price,
            change,
            change_pct,
            provider,
            name,
            ..
        } => {
            assert_eq!(*price, 65_000.0);
            assert_eq!(*provider, "coingecko");
            assert_eq!(name, "Bitcoin");
            assert!((change_pct - 2.0).abs() < 1e-9);
            assert!((change - 1_300.0).abs() < 1e-6, "change = price * pct/100");
        }
        other => panic!("BTC should price, got {:?}", other),
    }
}

#[tokio::test]
async fn equity_suffix_is_probed_once_per_process() {
    let (svc, _, equities) = service();

    let first = svc.resolve(&symbols(&["AAPL"])).await;
    assert!(matches!(first[0], Quote::Priced { .. }));
    let probes_first = equities.calls.load(Ordering::SeqCst);
    assert_eq!(probes_first, 2, "bare miss then .us hit");

    let second = svc.resolve(&symbols(&["AAPL"])).await;
    assert!(matches!(second[0], Quote::Priced { .. }));
    let probes_second = equities.calls.load(Ordering::SeqCst) - probes_first;
    assert_eq!(probes_second, 1, "cached suffix means a single direct call");
}

#[tokio::test]
async fn dead_symbols_skip_all_probing_on_repeat() {
    let (svc, _, equities) = service();

    let first = svc.resolve(&symbols(&["^UNKNOWN-INDEX"])).await;
    assert!(first[0].is_error());
    let after_first = equities.calls.load(Ordering::SeqCst);
    assert!(after_first > 0);

    let second = svc.resolve(&symbols(&["^UNKNOWN-INDEX"])).await;
    assert!(second[0].is_error());
    assert_eq!(
        equities.calls.load(Ordering::SeqCst),
        after_first,
        "dead set must suppress repeat probing"
    );
}

#[tokio::test]
async fn coin_id_lookup_is_memoized() {
    let (svc, coins, _) = service();

    svc.resolve(&symbols(&["BTC"])).await;
    svc.resolve(&symbols(&["BTC-USD"])).await;
    // BTC and BTC-USD share the base symbol, so one search serves both.
    assert_eq!(coins.searches.load(Ordering::SeqCst), 1);
    assert_eq!(coins.prices.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn pair_symbols_and_normalization() {
    let (svc, _, _) = service();
    let out = svc.resolve(&symbols(&["btc usd", "btc/usd"])).await;
    assert_eq!(out[0].symbol(), "BTC-USD");
    assert!(matches!(out[0], Quote::Priced { .. }));
    assert!(matches!(out[1], Quote::Priced { .. }));
}

#[tokio::test]
async fn unknown_coin_with_equity_shape_falls_through_to_error() {
    let (svc, coins, equities) = service();
    let out = svc.resolve(&symbols(&["ZZZQ"])).await;
    assert!(out[0].is_error());
    // Crypto search tried first, then every equity suffix.
    assert_eq!(coins.searches.load(Ordering::SeqCst), 1);
    assert_eq!(equities.calls.load(Ordering::SeqCst), 7);
}
