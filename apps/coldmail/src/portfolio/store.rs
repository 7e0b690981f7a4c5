//! PortfolioStore — overlap-ranked link retrieval over a once-built inverted index.
//!
//! Algorithm:
//! 1. `load` reads the corpus once into `PortfolioIndex` (records + lowercase tag → record ids)
//! 2. `query` counts, per record, how many normalized skills hit one of its tags
//! 3. Records with at least one hit are sorted by hit count desc, then corpus order
//! 4. Links are emitted in that order, skipping any link already emitted

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::portfolio::{normalize_skills, LinkStore, LoadOutcome, PortfolioRecord, StoreError};

/// Where the corpus comes from.
#[derive(Debug, Clone)]
pub enum CorpusSource {
    /// CSV with a header row containing `Techstack` and `Links` columns.
    Csv(PathBuf),
    Records(Vec<PortfolioRecord>),
}

impl CorpusSource {
    fn name(&self) -> String {
        match self {
            CorpusSource::Csv(path) => path.display().to_string(),
            CorpusSource::Records(_) => "inline records".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Techstack")]
    techstack: String,
    #[serde(rename = "Links")]
    links: String,
}

#[derive(Debug)]
struct PortfolioIndex {
    records: Vec<PortfolioRecord>,
    by_tag: HashMap<String, Vec<usize>>,
}

impl PortfolioIndex {
    fn build(records: Vec<PortfolioRecord>) -> Self {
        let mut by_tag: HashMap<String, Vec<usize>> = HashMap::new();
        for (id, record) in records.iter().enumerate() {
            for tag in &record.skill_tags {
                let ids = by_tag.entry(tag.to_lowercase()).or_default();
                // A record counts once per tag, however its tags were spelled
                if ids.last() != Some(&id) {
                    ids.push(id);
                }
            }
        }
        Self { records, by_tag }
    }

    fn rank_links(&self, skills: &[String], max_links: Option<usize>) -> Vec<String> {
        let wanted = normalize_skills(skills);
        if wanted.is_empty() {
            return Vec::new();
        }

        let mut overlap: HashMap<usize, usize> = HashMap::new();
        for skill in &wanted {
            if let Some(ids) = self.by_tag.get(skill) {
                for &id in ids {
                    *overlap.entry(id).or_default() += 1;
                }
            }
        }

        let mut ranked: Vec<(usize, usize)> = overlap.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let limit = max_links.unwrap_or(usize::MAX);
        let mut seen: HashSet<&str> = HashSet::new();
        let mut links = Vec::new();
        for (id, _) in ranked {
            if links.len() >= limit {
                break;
            }
            let link = self.records[id].link.as_str();
            if seen.insert(link) {
                links.push(link.to_string());
            }
        }
        links
    }
}

/// Default `LinkStore`. Construct once in `main` and share through an `Arc`.
#[derive(Debug)]
pub struct PortfolioStore {
    source: CorpusSource,
    max_links: Option<usize>,
    index: OnceCell<PortfolioIndex>,
}

impl PortfolioStore {
    pub fn new(source: CorpusSource) -> Self {
        Self {
            source,
            max_links: None,
            index: OnceCell::new(),
        }
    }

    pub fn from_csv(path: impl Into<PathBuf>) -> Self {
        Self::new(CorpusSource::Csv(path.into()))
    }

    #[allow(dead_code)]
    pub fn from_records(records: Vec<PortfolioRecord>) -> Self {
        Self::new(CorpusSource::Records(records))
    }

    /// Caps each query result. A cap can drop links a narrower query returned.
    pub fn with_max_links(mut self, max_links: Option<usize>) -> Self {
        self.max_links = max_links;
        self
    }

    async fn read_records(&self) -> Result<Vec<PortfolioRecord>, StoreError> {
        match &self.source {
            CorpusSource::Records(records) => Ok(records.clone()),
            CorpusSource::Csv(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| self.unavailable(e.to_string()))?;
                parse_portfolio_csv(&bytes).map_err(|e| self.unavailable(e.to_string()))
            }
        }
    }

    fn unavailable(&self, reason: String) -> StoreError {
        StoreError::Unavailable {
            source_name: self.source.name(),
            reason,
        }
    }
}

#[async_trait]
impl LinkStore for PortfolioStore {
    async fn load(&self) -> Result<LoadOutcome, StoreError> {
        if self.index.initialized() {
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        // Concurrent callers wait on the same initialization; only one of them builds.
        let mut built_here = false;
        let built_flag = &mut built_here;
        let index = self
            .index
            .get_or_try_init(|| async move {
                *built_flag = true;
                let records = self.read_records().await?;
                Ok::<_, StoreError>(PortfolioIndex::build(records))
            })
            .await?;

        if built_here {
            info!(
                records = index.records.len(),
                tags = index.by_tag.len(),
                source = %self.source.name(),
                "Portfolio index built"
            );
            Ok(LoadOutcome::Loaded {
                records: index.records.len(),
            })
        } else {
            Ok(LoadOutcome::AlreadyLoaded)
        }
    }

    fn query(&self, skills: &[String]) -> Result<Vec<String>, StoreError> {
        let index = self.index.get().ok_or(StoreError::NotLoaded)?;
        Ok(index.rank_links(skills, self.max_links))
    }

    fn is_loaded(&self) -> bool {
        self.index.initialized()
    }

    fn record_count(&self) -> usize {
        self.index.get().map(|i| i.records.len()).unwrap_or(0)
    }
}

/// Parses the portfolio CSV. Rows with a blank link are skipped.
fn parse_portfolio_csv(bytes: &[u8]) -> Result<Vec<PortfolioRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        if row.links.is_empty() {
            warn!(row = line + 1, "Skipping portfolio row without a link");
            continue;
        }
        records.push(PortfolioRecord::from_techstack(&row.techstack, row.links));
    }
    Ok(records)
}
