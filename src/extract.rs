// src/extract.rs
//! Link previews: fetch a page, scrape Open Graph / Twitter metadata and
//! embedded images, and keep an HTML-stripped plain-text body. Scraping is
//! regex pattern extraction; pages in the wild are rarely valid enough for
//! anything stricter.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::net;

const TEXT_CAP: usize = 5_000;
const MAX_IMAGES: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Preview {
    pub url: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub site_name: String,
    pub text: String,
    pub images: Vec<String>,
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));
static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</\1>").expect("script regex")
});
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex"));
static IMG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<img[^>]+src=["']?([^"'\s>]+)"#).expect("img regex"));

/// Decode entities, drop tags, collapse whitespace, cap length.
pub(crate) fn strip_html(html: &str, cap: usize) -> String {
    let no_scripts = SCRIPT_RE.replace_all(html, " ");
    let no_tags = TAG_RE.replace_all(&no_scripts, "");
    let decoded = html_escape::decode_html_entities(&no_tags).to_string();
    let mut out = WS_RE.replace_all(&decoded, " ").trim().to_string();
    if out.chars().count() > cap {
        out = out.chars().take(cap).collect();
    }
    out
}

/// Fetch and scrape a page. `None` when the fetch itself fails; scraping
/// never fails, it just leaves fields empty.
pub async fn preview(url: &str) -> Option<Preview> {
    let body = net::get_text(url).await?;
    Some(scrape(url, &body))
}

pub fn scrape(url: &str, html: &str) -> Preview {
    let title = meta_content(html, "og:title")
        .or_else(|| meta_content(html, "twitter:title"))
        .or_else(|| {
            TITLE_RE
                .captures(html)
                .and_then(|c| c.get(1))
                .map(|m| strip_html(m.as_str(), 300))
        })
        .unwrap_or_default();

    let description = meta_content(html, "og:description")
        .or_else(|| meta_content(html, "twitter:description"))
        .or_else(|| meta_content(html, "description"))
        .unwrap_or_default();

    let image = meta_content(html, "og:image")
        .or_else(|| meta_content(html, "twitter:image"))
        .unwrap_or_default();

    let mut images: Vec<String> = Vec::new();
    if !image.is_empty() {
        images.push(image.clone());
    }
    let sans_scripts = SCRIPT_RE.replace_all(html, " ");
    for cap in IMG_RE.captures_iter(&sans_scripts) {
        if images.len() >= MAX_IMAGES {
            break;
        }
        let src = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        // Only absolute (or protocol-relative) URLs are usable off-site.
        let abs = if let Some(rest) = src.strip_prefix("//") {
            format!("https://{}", rest)
        } else if src.starts_with("http://") || src.starts_with("https://") {
            src.to_string()
        } else {
            continue;
        };
        if !images.contains(&abs) {
            images.push(abs);
        }
    }

    Preview {
        url: url.to_string(),
        site_name: meta_content(html, "og:site_name").unwrap_or_else(|| net::short_host(url)),
        text: strip_html(html, TEXT_CAP),
        title,
        description,
        image,
        images,
    }
}

/// `<meta property|name="<key>" content="...">` in either attribute order.
fn meta_content(html: &str, key: &str) -> Option<String> {
    let escaped = regex::escape(key);
    let fwd = Regex::new(&format!(
        r#"(?is)<meta[^>]+(?:property|name)=["']{}["'][^>]+content=["']([^"']+)["']"#,
        escaped
    ))
    .ok()?;
    let rev = Regex::new(&format!(
        r#"(?is)<meta[^>]+content=["']([^"']+)["'][^>]+(?:property|name)=["']{}["']"#,
        escaped
    ))
    .ok()?;
    fwd.captures(html)
        .or_else(|| rev.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| {
            html_escape::decode_html_entities(m.as_str())
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
      <title>Fallback &amp; title</title>
      <meta property="og:title" content="A proper title">
      <meta name="og:description" content="What the page is about.">
      <meta content="https://cdn.example.com/hero.jpg" property="og:image">
      <meta property="og:site_name" content="Example Site">
      <script>var x = "<img src='https://nope.example/x.png'>";</script>
    </head><body>
      <p>Hello <b>world</b>, this is body text.</p>
      <img src="/relative.png"><img src="//cdn.example.com/second.jpg">
    </body></html>"#;

    #[test]
    fn og_metadata_wins_over_title_tag() {
        let p = scrape("https://www.example.com/page", PAGE);
        assert_eq!(p.title, "A proper title");
        assert_eq!(p.description, "What the page is about.");
        assert_eq!(p.image, "https://cdn.example.com/hero.jpg");
        assert_eq!(p.site_name, "Example Site");
    }

    #[test]
    fn reversed_attribute_order_is_scraped() {
        // og:image above has content before property
        let p = scrape("https://example.com", PAGE);
        assert_eq!(p.image, "https://cdn.example.com/hero.jpg");
    }

    #[test]
    fn title_tag_is_the_fallback() {
        let html = "<html><head><title>Only &amp; title</title></head><body></body></html>";
        let p = scrape("https://example.com", html);
        assert_eq!(p.title, "Only & title");
    }

    #[test]
    fn body_text_is_stripped_and_collapsed() {
        let p = scrape("https://example.com", PAGE);
        assert!(p.text.contains("Hello world, this is body text."));
        assert!(!p.text.contains("var x"), "script bodies must be dropped");
    }

    #[test]
    fn relative_images_are_skipped_protocol_relative_normalized() {
        let p = scrape("https://example.com", PAGE);
        assert!(p.images.contains(&"https://cdn.example.com/second.jpg".to_string()));
        assert!(!p.images.iter().any(|i| i.contains("relative.png")));
        assert!(!p.images.iter().any(|i| i.contains("nope.example")));
    }

    #[test]
    fn site_name_falls_back_to_host() {
        let p = scrape("https://www.example.org/x", "<html></html>");
        assert_eq!(p.site_name, "example.org");
    }

    #[test]
    fn strip_html_caps_length() {
        let long = format!("<p>{}</p>", "a".repeat(9000));
        assert_eq!(strip_html(&long, 100).len(), 100);
    }
}
