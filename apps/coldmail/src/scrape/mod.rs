//! Page loading for the HTTP and CLI entry points.
//!
//! Fetches a careers page, flattens its HTML to text and cleans it. The pipeline never
//! fetches anything itself; it only sees the cleaned string.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};

const FETCH_TIMEOUT_SECS: u64 = 30;
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Fetching {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("No content could be loaded from the URL.")]
    NoContent,
}

pub struct PageLoader {
    client: Client,
}

impl PageLoader {
    pub fn new(user_agent: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(ScrapeError::Client)?;
        Ok(Self { client })
    }

    /// Fetches `url` and returns its cleaned text. Empty pages are `NoContent`.
    pub async fn load(&self, url: &str) -> Result<String, ScrapeError> {
        info!(url, "Starting scrape");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ScrapeError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Page returned an error status");
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        })?;

        let raw_text = html_to_text(&html);
        debug!(length = raw_text.len(), "Raw text length");

        let cleaned = clean_text(&raw_text);
        debug!(length = cleaned.len(), "Cleaned text length");

        if cleaned.is_empty() {
            warn!(url, "No content returned from page");
            return Err(ScrapeError::NoContent);
        }
        Ok(cleaned)
    }
}

/// Visible text of the document body, one space between text nodes.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name()))
            .map(|name| SKIPPED_TAGS.contains(&name))
            .unwrap_or(false);
        if hidden {
            continue;
        }
        let text = text.trim();
        if !text.is_empty() {
            parts.push(text);
        }
    }
    parts.join(" ")
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*?>").expect("valid regex"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+")
            .expect("valid regex")
    })
}

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9 ]").expect("valid regex"))
}

/// Strips leftover tags, URLs and punctuation, then collapses whitespace.
///
/// Line breaks count as punctuation and vanish, so words separated only by a newline
/// are joined. Page text from `html_to_text` is already space-separated.
pub fn clean_text(text: &str) -> String {
    let text = tag_re().replace_all(text, "");
    let text = url_re().replace_all(&text, "");
    let text = non_word_re().replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
