// tests/planner_pipeline.rs
//
// End-to-end properties of the planning pipeline against simulated AI
// providers: totality, deterministic heuristics, schema rejection, and the
// spotify downgrade rule.

use serde_json::Value;

use tilecast::ai::MockClient;
use tilecast::planner::{plan, plan_many, PlannerEngine};
use tilecast::tile::Tile;

const CLOSED_TYPES: [&str; 9] = [
    "web", "maps", "rss", "news", "youtube", "stocks", "gallery", "spotify", "discover",
];

fn engine() -> PlannerEngine {
    PlannerEngine::builtin()
}

/// Required per-type fields must be non-empty after planning.
fn assert_well_formed(tile: &Tile) {
    let v = serde_json::to_value(tile).expect("serialize tile");
    let kind = v["type"].as_str().expect("type tag");
    assert!(CLOSED_TYPES.contains(&kind), "unknown type {kind}");
    assert!(
        !v["title"].as_str().unwrap_or("").is_empty(),
        "empty title on {kind}"
    );
    match kind {
        "web" => assert!(!v["url"].as_str().unwrap().is_empty()),
        "maps" | "discover" => assert!(!v["q"].as_str().unwrap().is_empty()),
        "rss" | "news" => assert!(!v["feeds"].as_array().unwrap().is_empty()),
        "stocks" => assert!(!v["symbols"].as_array().unwrap().is_empty()),
        "spotify" => assert!(!v["spotifyUrl"].as_str().unwrap().is_empty()),
        // youtube/gallery may legitimately be empty for the renderer to fill
        _ => {}
    }
}

#[tokio::test]
async fn plan_is_total_over_a_query_zoo() {
    let queries = [
        "https://www.example.com/article",
        "weekend retreat in Bath",
        "spa weekend",
        "Thai beach holiday",
        "$AAPL MSFT",
        "stocks btc-usd",
        "https://youtu.be/dQw4w9WgXcQ",
        "youtube lofi mixes",
        "news premier league",
        "play oasis on spotify",
        "absolutely anything else at all",
        "?!",
    ];
    let eng = engine();
    let ai = MockClient::silent();
    for q in queries {
        let tile = plan(&eng, &ai, q).await;
        assert_well_formed(&tile);
    }
}

#[tokio::test]
async fn heuristics_are_deterministic_without_ai() {
    let eng = engine();
    let ai = MockClient::silent();

    let a = plan(&eng, &ai, "weekend retreat in Bath").await;
    let b = plan(&eng, &ai, "weekend retreat in Bath").await;
    assert_eq!(a, b);
    match &a {
        Tile::Maps { q, .. } => {
            assert!(q.contains("Bath"));
            assert!(!q.contains("United Kingdom"));
        }
        other => panic!("expected maps, got {:?}", other),
    }

    match plan(&eng, &ai, "spa weekend").await {
        Tile::Maps { q, .. } => assert!(q.contains("United Kingdom")),
        other => panic!("expected maps, got {:?}", other),
    }
}

#[tokio::test]
async fn no_duplicate_uk_when_already_present() {
    match plan(&engine(), &MockClient::silent(), "spa retreat in Bath, UK").await {
        Tile::Maps { q, .. } => {
            assert!(!q.contains("United Kingdom"), "got {q}");
        }
        other => panic!("expected maps, got {:?}", other),
    }
}

#[tokio::test]
async fn demonym_resolution_reaches_the_country() {
    match plan(&engine(), &MockClient::silent(), "Thai beach holiday").await {
        Tile::Maps { q, .. } => assert!(q.contains("Thailand"), "got {q}"),
        other => panic!("expected maps, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_model_response_never_surfaces() {
    // Unknown type -> safe fallback, never an error and never the bad type.
    let ai = MockClient::with_payload(r#"{"type":"launch_missiles"}"#);
    let tile = plan(&engine(), &ai, "something entirely generic").await;
    assert_well_formed(&tile);
    let v = serde_json::to_value(&tile).unwrap();
    assert_ne!(v["type"], "launch_missiles");

    // Non-JSON garbage behaves the same.
    let ai = MockClient::with_payload("I'd rather chat about the weather.");
    let tile = plan(&engine(), &ai, "something entirely generic").await;
    assert_well_formed(&tile);
}

#[tokio::test]
async fn prose_wrapped_json_is_salvaged() {
    let ai = MockClient::with_payload(
        "Here you go: {\"type\":\"gallery\",\"title\":\"Ideas\",\"images\":[\"https://img.example/1.jpg\"]} enjoy!",
    );
    let tile = plan(&engine(), &ai, "kitchen inspiration").await;
    assert!(matches!(tile, Tile::Gallery { .. }));
}

#[tokio::test]
async fn spotify_without_url_is_never_emitted() {
    let ai = MockClient::with_payload(r#"{"type":"spotify","title":"Tunes"}"#);
    let tile = plan(&engine(), &ai, "some mellow music").await;
    match &tile {
        Tile::Web { url, .. } => {
            assert!(url.starts_with("https://open.spotify.com/search/"))
        }
        Tile::Spotify { spotify_url, .. } => {
            panic!("spotify without url must downgrade, got url {spotify_url:?}")
        }
        _ => {}
    }
    assert_well_formed(&tile);
}

#[tokio::test]
async fn plan_many_emits_one_to_three_well_formed_tiles() {
    let eng = engine();

    let tiles = plan_many(&eng, &MockClient::silent(), "utterly generic question").await;
    assert_eq!(tiles.len(), 1);
    tiles.iter().for_each(assert_well_formed);

    let ai = MockClient::with_payload(
        r#"{"tiles":[
            {"type":"maps","title":"Nearby","q":"bakeries"},
            {"type":"web","title":"Guide","url":"https://guide.example"},
            {"type":"bogus"},
            {"type":"gallery","title":"Looks","images":["https://img.example/1.jpg"]}
        ]}"#,
    );
    let tiles = plan_many(&eng, &ai, "best bakeries").await;
    assert!((1..=3).contains(&tiles.len()));
    tiles.iter().for_each(assert_well_formed);

    // No duplicate tile types in the ranked list.
    let kinds: Vec<Value> = tiles
        .iter()
        .map(|t| serde_json::to_value(t).unwrap()["type"].clone())
        .collect();
    let mut dedup = kinds.clone();
    dedup.dedup();
    assert_eq!(kinds.len(), dedup.len());
}
