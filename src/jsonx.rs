// src/jsonx.rs
//! Best-effort structured parse for untrusted model output. Models asked for
//! strict JSON still wrap it in prose or code fences often enough that the
//! salvage path needs to be a real, tested code path rather than an inline
//! afterthought.

use serde_json::Value;

/// Parse `raw` as JSON, salvaging an embedded object/array when the full
/// string does not parse. Returns `None` only when no JSON value can be
/// recovered at all.
pub fn loose_parse(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }

    let unfenced = strip_code_fences(trimmed);
    if let Ok(v) = serde_json::from_str::<Value>(unfenced.trim()) {
        return Some(v);
    }

    // Outermost {...} span, then outermost [...] span.
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(span) = outermost_span(&unfenced, open, close) {
            if let Ok(v) = serde_json::from_str::<Value>(span) {
                return Some(v);
            }
        }
    }
    None
}

/// Strip a leading/trailing markdown code fence (``` or ```json).
fn strip_code_fences(s: &str) -> String {
    let t = s.trim();
    if !t.starts_with("```") {
        return t.to_string();
    }
    let body = t.trim_start_matches("```");
    // Drop an optional language tag on the fence line.
    let body = match body.split_once('\n') {
        Some((_lang, rest)) => rest,
        None => body,
    };
    body.trim_end_matches("```").trim().to_string()
}

fn outermost_span(s: &str, open: char, close: char) -> Option<&str> {
    let start = s.find(open)?;
    let end = s.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&s[start..=end])
}
