use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and describe the crate's series so
    /// they show up on /metrics before first increment.
    pub fn init() -> Self {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!("plan_heuristic_total", "Plans answered by Stage-1 heuristics.");
        describe_counter!("plan_ai_total", "Plans answered by validated AI output.");
        describe_counter!(
            "plan_fallback_total",
            "Plans that fell back to the default tile."
        );
        describe_counter!("feed_items_total", "Feed items parsed and returned.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!(
            "quotes_cache_hits_total",
            "Resolver cache hits (coin ids, suffixes, dead symbols)."
        );
        describe_counter!(
            "quotes_probe_calls_total",
            "Upstream equity quote calls, including suffix probes."
        );

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
