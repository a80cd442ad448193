// src/video.rs
//! Per-id video metadata via YouTube's oEmbed endpoint. Each id resolves
//! independently; a failed lookup still yields a renderable entry with a
//! synthesized high-res thumbnail.

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::net;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMeta {
    pub id: String,
    pub title: String,
    pub thumb: String,
}

pub async fn lookup(ids: &[String]) -> Vec<VideoMeta> {
    join_all(ids.iter().map(|id| lookup_one(id))).await
}

async fn lookup_one(id: &str) -> VideoMeta {
    #[derive(Deserialize)]
    struct OEmbed {
        title: String,
        thumbnail_url: Option<String>,
    }

    let watch = format!("https://www.youtube.com/watch?v={}", id);
    let url = net::url_with_params(
        "https://www.youtube.com/oembed",
        &[("url", watch.as_str()), ("format", "json")],
    );

    match net::get_json::<OEmbed>(&url).await {
        Some(meta) => VideoMeta {
            id: id.to_string(),
            title: meta.title,
            thumb: meta.thumbnail_url.unwrap_or_else(|| fallback_thumb(id)),
        },
        None => VideoMeta {
            id: id.to_string(),
            title: id.to_string(),
            thumb: fallback_thumb(id),
        },
    }
}

fn fallback_thumb(id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id)
}
