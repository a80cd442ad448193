// src/api.rs
//! Public HTTP surface. Handlers map internal fallbacks to the contract the
//! dashboard relies on: the planner and feed paths answer 200 with a usable
//! (possibly degraded) body, 4xx is reserved for malformed requests, and
//! 502 only ever carries a well-shaped empty payload.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::ai::DynAiClient;
use crate::extract;
use crate::feed::{self, FeedItem};
use crate::planner::{self, PlannerEngine};
use crate::quotes::QuoteService;
use crate::summarize;
use crate::video;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PlannerEngine>,
    pub ai: DynAiClient,
    pub quotes: Arc<QuoteService>,
}

impl AppState {
    pub fn new(engine: Arc<PlannerEngine>, ai: DynAiClient, quotes: Arc<QuoteService>) -> Self {
        Self { engine, ai, quotes }
    }

    /// Production wiring: config from disk, AI from the environment, live
    /// quote providers.
    pub fn live() -> Self {
        Self::new(
            Arc::new(PlannerEngine::load()),
            crate::ai::build_ai_client(),
            Arc::new(QuoteService::live()),
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/plan", get(plan_one))
        .route("/tiles", get(plan_tiles))
        .route("/quotes", get(quotes_batch))
        .route("/feed", get(feed_fetch))
        .route("/video-meta", get(video_meta))
        .route("/preview", get(link_preview))
        .route("/summarize", get(summarize_url).post(summarize_body))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct QueryText {
    q: Option<String>,
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

async fn plan_one(State(state): State<AppState>, Query(p): Query<QueryText>) -> Response {
    let Some(q) = non_empty(p.q) else {
        return bad_request("missing query parameter 'q'");
    };
    let tile = planner::plan(&state.engine, state.ai.as_ref(), &q).await;
    Json(json!({ "tile": tile })).into_response()
}

async fn plan_tiles(State(state): State<AppState>, Query(p): Query<QueryText>) -> Response {
    let Some(q) = non_empty(p.q) else {
        return bad_request("missing query parameter 'q'");
    };
    let tiles = planner::plan_many(&state.engine, state.ai.as_ref(), &q).await;
    Json(json!({ "tiles": tiles })).into_response()
}

#[derive(Deserialize)]
struct SymbolsParam {
    symbols: Option<String>,
}

async fn quotes_batch(State(state): State<AppState>, Query(p): Query<SymbolsParam>) -> Response {
    let symbols: Vec<String> = p
        .symbols
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if symbols.is_empty() {
        return Json(json!({ "quotes": [], "note": "no symbols supplied" })).into_response();
    }
    let quotes = state.quotes.resolve(&symbols).await;
    Json(json!({ "quotes": quotes })).into_response()
}

#[derive(Deserialize)]
struct FeedParams {
    url: Option<String>,
    feed: Option<String>,
    feeds: Option<String>,
}

async fn feed_fetch(Query(p): Query<FeedParams>) -> Response {
    let mut urls: Vec<String> = Vec::new();
    if let Some(u) = non_empty(p.url) {
        urls.push(u);
    }
    if let Some(u) = non_empty(p.feed) {
        urls.push(u);
    }
    if let Some(csv) = p.feeds {
        urls.extend(
            csv.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }
    if urls.is_empty() {
        return bad_request("missing feed URL ('url', 'feed' or 'feeds')");
    }

    let (items, error) = feed::fetch_first(&urls).await;
    match error {
        None => Json(json!({ "items": items })).into_response(),
        Some(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "items": [], "error": e })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct IdsParam {
    ids: Option<String>,
}

async fn video_meta(Query(p): Query<IdsParam>) -> Response {
    let ids: Vec<String> = p
        .ids
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return bad_request("missing video ids");
    }
    let items = video::lookup(&ids).await;
    Json(json!({ "items": items })).into_response()
}

#[derive(Deserialize)]
struct UrlParam {
    url: Option<String>,
}

async fn link_preview(Query(p): Query<UrlParam>) -> Response {
    let Some(url) = non_empty(p.url) else {
        return bad_request("missing url");
    };
    match extract::preview(&url).await {
        Some(preview) => Json(json!({ "preview": preview })).into_response(),
        None => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": "fetch failed" })),
        )
            .into_response(),
    }
}

async fn summarize_url(State(state): State<AppState>, Query(p): Query<UrlParam>) -> Response {
    let Some(url) = non_empty(p.url) else {
        return bad_request("missing url");
    };
    match extract::preview(&url).await {
        Some(preview) => {
            let summary = summarize::summarize_text(state.ai.as_ref(), &preview.text).await;
            Json(json!({ "summary": summary })).into_response()
        }
        None => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": "fetch failed" })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct SummarizeReq {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    items: Option<Vec<FeedItem>>,
}

async fn summarize_body(
    State(state): State<AppState>,
    Json(body): Json<SummarizeReq>,
) -> Response {
    if let Some(items) = body.items.filter(|i| !i.is_empty()) {
        let out = summarize::summarize_items(state.ai.as_ref(), &items).await;
        return Json(json!({ "items": out })).into_response();
    }
    if let Some(text) = non_empty(body.text) {
        let summary = summarize::summarize_text(state.ai.as_ref(), &text).await;
        return Json(json!({ "summary": summary })).into_response();
    }
    bad_request("supply 'text' or 'items'")
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
