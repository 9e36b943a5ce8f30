//! Tag search and post download against the scraped platform.
//!
//! The platform serves whatever markup it currently serves; everything here
//! is best-effort, bounded by a link cap and request timeouts, and may
//! return fewer posts than asked for. The `PostSource` trait keeps the
//! backend swappable without touching the upload/archive logic downstream.

use crate::error::{Phase, PipelineError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

const BASE_URL: &str = "https://www.instagram.com";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

/// A discovered post: its canonical URL plus the platform shortcode that
/// identifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    pub url: String,
    pub shortcode: String,
}

/// Media and caption downloaded for one post.
#[derive(Debug, Clone)]
pub struct DownloadedPost {
    pub media_path: PathBuf,
    pub caption: String,
}

/// Capability seam: search a tag, get back an ordered sequence of post
/// references.
#[async_trait]
pub trait PostSource {
    async fn search_tag(&self, tag: &str, limit: usize) -> Result<Vec<PostRef>>;
}

pub fn extract_shortcode(url: &str) -> Result<String> {
    for marker in ["/reels/", "/reel/", "/p/"] {
        if let Some(rest) = url.split_once(marker).map(|(_, rest)| rest) {
            let code = rest.split('/').next().unwrap_or("");
            if !code.is_empty() {
                return Ok(code.to_string());
            }
        }
    }
    Err(PipelineError::BadPostUrl(url.to_string()))
}

static POST_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="(/(?:p|reel|reels)/[^/"?#]+)"#).unwrap());

/// Pulls post links out of a tag page, in document order, deduplicated,
/// capped at `limit`.
fn extract_post_links(html: &str, limit: usize) -> Vec<PostRef> {
    let mut seen = HashSet::new();
    let mut posts = Vec::new();

    for cap in POST_LINK_RE.captures_iter(html) {
        let href = cap[1].trim_end_matches('/').to_string();
        if !seen.insert(href.clone()) {
            continue;
        }
        let url = format!("{BASE_URL}{href}/");
        if let Ok(shortcode) = extract_shortcode(&url) {
            posts.push(PostRef { url, shortcode });
        }
        if posts.len() >= limit {
            break;
        }
    }

    posts
}

/// Plain-HTTP post source: fetches the tag page and scrapes post links out
/// of the served markup.
pub struct HttpPostSource {
    client: Client,
}

impl HttpPostSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PostSource for HttpPostSource {
    async fn search_tag(&self, tag: &str, limit: usize) -> Result<Vec<PostRef>> {
        let url = format!("{BASE_URL}/explore/tags/{tag}/");
        let resp = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", "en-US,en;q=0.9")
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(PipelineError::from_response(Phase::TagSearch, resp).await);
        }

        let html = resp.text().await?;
        Ok(extract_post_links(&html, limit))
    }
}

fn meta_content(html: &str, property: &str) -> Option<String> {
    // Attribute order varies between property-first and content-first.
    let prop = regex::escape(property);
    let patterns = [
        format!(r#"<meta[^>]*property="{prop}"[^>]*content="([^"]*)""#),
        format!(r#"<meta[^>]*content="([^"]*)"[^>]*property="{prop}""#),
    ];
    for pattern in &patterns {
        let re = Regex::new(pattern).ok()?;
        if let Some(cap) = re.captures(html) {
            let value = cap[1].to_string();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

fn unescape_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Downloads a post's media (video preferred over image) and caption into
/// `media_dir`, named by shortcode.
pub async fn download_post(client: &Client, post: &PostRef, media_dir: &Path) -> Result<DownloadedPost> {
    let resp = client
        .get(&post.url)
        .header("User-Agent", USER_AGENT)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(PipelineError::from_response(Phase::PostDownload, resp).await);
    }

    let html = resp.text().await?;

    let (media_url, ext) = match meta_content(&html, "og:video") {
        Some(url) => (url, "mp4"),
        None => match meta_content(&html, "og:image") {
            Some(url) => (url, "jpg"),
            None => return Err(PipelineError::NoMedia(post.shortcode.clone())),
        },
    };

    let caption = meta_content(&html, "og:title")
        .map(|t| unescape_entities(&t))
        .unwrap_or_else(|| "Untitled Post".to_string());

    let media_resp = client
        .get(unescape_entities(&media_url))
        .header("User-Agent", USER_AGENT)
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await?;

    if !media_resp.status().is_success() {
        return Err(PipelineError::from_response(Phase::PostDownload, media_resp).await);
    }

    let bytes = media_resp.bytes().await?;
    fs::create_dir_all(media_dir).await?;
    let media_path = media_dir.join(format!("{}.{}", post.shortcode, ext));
    fs::write(&media_path, &bytes).await?;

    Ok(DownloadedPost {
        media_path,
        caption,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcode_from_post_url() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/p/Cxyz123/").unwrap(),
            "Cxyz123"
        );
    }

    #[test]
    fn shortcode_from_reel_url() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/reel/Babc456/?igsh=1").unwrap(),
            "Babc456"
        );
        assert_eq!(
            extract_shortcode("https://www.instagram.com/reels/Cdef789/").unwrap(),
            "Cdef789"
        );
    }

    #[test]
    fn shortcode_rejects_unrelated_url() {
        assert!(extract_shortcode("https://example.com/watch?v=abc").is_err());
    }

    #[test]
    fn extracts_links_in_order_without_duplicates() {
        let html = r#"
            <a href="/p/AAA/">one</a>
            <a href="/reel/BBB/">two</a>
            <a href="/p/AAA/">dup</a>
            <a href="/p/CCC/">three</a>
        "#;
        let posts = extract_post_links(html, 20);
        let codes: Vec<&str> = posts.iter().map(|p| p.shortcode.as_str()).collect();
        assert_eq!(codes, vec!["AAA", "BBB", "CCC"]);
        assert_eq!(posts[0].url, "https://www.instagram.com/p/AAA/");
    }

    #[test]
    fn link_cap_is_respected() {
        let html: String = (0..30)
            .map(|i| format!(r#"<a href="/p/CODE{i}/">x</a>"#))
            .collect();
        let posts = extract_post_links(&html, 20);
        assert_eq!(posts.len(), 20);
    }

    #[test]
    fn meta_content_handles_both_attribute_orders() {
        let a = r#"<meta property="og:video" content="https://cdn/v.mp4" />"#;
        let b = r#"<meta content="https://cdn/i.jpg" property="og:image" />"#;
        assert_eq!(
            meta_content(a, "og:video").as_deref(),
            Some("https://cdn/v.mp4")
        );
        assert_eq!(
            meta_content(b, "og:image").as_deref(),
            Some("https://cdn/i.jpg")
        );
        assert!(meta_content(a, "og:image").is_none());
    }

    #[test]
    fn caption_entities_are_unescaped() {
        assert_eq!(
            unescape_entities("rise &amp; shine &#39;today&#39;"),
            "rise & shine 'today'"
        );
    }
}
