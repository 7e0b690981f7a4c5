//! Portfolio — the skill-tag → link corpus that backs every outreach email.
//!
//! `LinkStore` is the seam the pipeline talks to. `PortfolioStore` is the default
//! implementation: an in-memory inverted index over a CSV file or an inline record list.

pub mod store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use store::PortfolioStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Portfolio corpus unavailable ({source_name}): {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("Portfolio store has not been loaded")]
    NotLoaded,
}

/// Which path a `load` call took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This call built the index.
    Loaded { records: usize },
    /// The index already existed; nothing was done.
    AlreadyLoaded,
}

/// Retrieval seam between the pipeline and the portfolio corpus.
///
/// Carried as `Arc<dyn LinkStore>`. `load` must be idempotent and atomic: a concurrent
/// `query` sees either no index (`NotLoaded`) or the complete one.
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn load(&self) -> Result<LoadOutcome, StoreError>;

    /// Links ranked by how many of `skills` their record is tagged with.
    /// Deduplicated. Empty when nothing overlaps.
    fn query(&self, skills: &[String]) -> Result<Vec<String>, StoreError>;

    fn is_loaded(&self) -> bool;

    /// Number of indexed records, zero before load.
    fn record_count(&self) -> usize;
}

/// One portfolio entry: the tech stack it demonstrates and where to see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioRecord {
    /// Trimmed, non-empty, unique ignoring case. Keeps first-seen spelling and order.
    pub skill_tags: Vec<String>,
    pub link: String,
}

impl PortfolioRecord {
    pub fn new<I, S>(tags: I, link: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut skill_tags: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.as_ref().trim();
            if tag.is_empty() {
                continue;
            }
            let folded = tag.to_lowercase();
            if !skill_tags.iter().any(|t| t.to_lowercase() == folded) {
                skill_tags.push(tag.to_string());
            }
        }

        Self {
            skill_tags,
            link: link.into().trim().to_string(),
        }
    }

    /// Builds a record from a comma-separated stack such as `"React, Node.js, MongoDB"`.
    pub fn from_techstack(techstack: &str, link: impl Into<String>) -> Self {
        Self::new(techstack.split(','), link)
    }
}

/// Lowercases, trims, drops blanks and repeats. Order of first appearance is kept.
pub fn normalize_skills(skills: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim().to_lowercase();
        if !skill.is_empty() && !normalized.contains(&skill) {
            normalized.push(skill);
        }
    }
    normalized
}
