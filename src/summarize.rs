// src/summarize.rs
//! Summaries over feed items or raw text. The AI path produces structured
//! one-liners / TL;DR + bullets; every failure degrades to deterministic
//! sentence-boundary truncation so the caller always gets usable output.

use serde::Serialize;
use serde_json::Value;

use crate::ai::AiClient;
use crate::feed::FeedItem;
use crate::jsonx;

const ONE_LINER_CAP: usize = 140;

const ITEMS_SYSTEM_PROMPT: &str = r#"You summarize news headlines. Given a numbered list of items, respond
with STRICT JSON only: an array of strings, one per input item, in input
order. Each string is a single neutral sentence of at most 140 characters.
No prose outside the JSON array."#;

const TEXT_SYSTEM_PROMPT: &str = r#"You summarize articles. Respond with STRICT JSON only, shaped as
{"tldr": "...", "bullets": ["...", ...]} with a one-sentence tldr and at
most 5 short bullets. No prose outside the JSON object."#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryItem {
    pub title: String,
    pub summary: String,
    pub image: String,
    pub source: String,
    pub time: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub tldr: String,
    pub bullets: Vec<String>,
}

/// One-liner per item, single batched model call. A short, invalid or
/// missing response falls back to truncation per item.
pub async fn summarize_items(ai: &dyn AiClient, items: &[FeedItem]) -> Vec<SummaryItem> {
    let lines = ai_one_liners(ai, items).await;

    items
        .iter()
        .enumerate()
        .map(|(i, it)| {
            let summary = lines
                .as_ref()
                .and_then(|l| l.get(i))
                .map(|s| truncate_sentence(s, ONE_LINER_CAP))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| fallback_one_liner(it));
            SummaryItem {
                title: it.title.clone(),
                summary,
                image: it.image.clone(),
                source: it.source.clone(),
                time: it.time.clone(),
                link: it.link.clone(),
            }
        })
        .collect()
}

/// TL;DR + bullets for a text body; truncation fallback on any failure.
pub async fn summarize_text(ai: &dyn AiClient, text: &str) -> Summary {
    if let Some(raw) = ai.complete(TEXT_SYSTEM_PROMPT, text).await {
        if let Some(v) = jsonx::loose_parse(&raw) {
            let tldr = v
                .get("tldr")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            let bullets: Vec<String> = v
                .get("bullets")
                .and_then(Value::as_array)
                .map(|a| {
                    a.iter()
                        .filter_map(Value::as_str)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .take(5)
                        .collect()
                })
                .unwrap_or_default();
            if !tldr.is_empty() {
                return Summary { tldr, bullets };
            }
        }
    }
    Summary {
        tldr: truncate_sentence(text, 240),
        bullets: Vec::new(),
    }
}

async fn ai_one_liners(ai: &dyn AiClient, items: &[FeedItem]) -> Option<Vec<String>> {
    if items.is_empty() {
        return None;
    }
    let mut prompt = String::new();
    for (i, it) in items.iter().enumerate() {
        prompt.push_str(&format!("{}. {} - {}\n", i + 1, it.title, it.description));
    }
    let raw = ai.complete(ITEMS_SYSTEM_PROMPT, &prompt).await?;
    let v = jsonx::loose_parse(&raw)?;
    let arr = v.as_array()?;
    Some(
        arr.iter()
            .map(|e| e.as_str().unwrap_or_default().to_string())
            .collect(),
    )
}

fn fallback_one_liner(item: &FeedItem) -> String {
    let base = if !item.description.is_empty() {
        &item.description
    } else {
        &item.title
    };
    truncate_sentence(base, ONE_LINER_CAP)
}

/// Cut at the first sentence boundary, or hard-truncate at `cap` chars.
fn truncate_sentence(text: &str, cap: usize) -> String {
    let t = text.trim();
    if let Some(pos) = t.find(". ") {
        let first = &t[..=pos];
        if first.chars().count() <= cap {
            return first.trim().to_string();
        }
    }
    if t.chars().count() <= cap {
        return t.to_string();
    }
    let mut out: String = t.chars().take(cap.saturating_sub(1)).collect();
    out = out.trim_end().to_string();
    out.push('…');
    out
}
