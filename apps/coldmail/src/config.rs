use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::llm_client::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::outreach::prompts::DEFAULT_COMPANY_PITCH;
use crate::outreach::{FailurePolicy, Persona};

const DEFAULT_PORTFOLIO_FILE: &str = "resource/my_portfolio.csv";
const DEFAULT_USER_AGENT: &str = "cold-email-generator/1.0 (+contact: example@example.com)";

/// Application configuration loaded from environment variables.
///
/// Nothing here is required. A missing `GROQ_API_KEY` only shows up as an
/// authentication error on the first model call.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub groq_model: String,
    pub groq_api_url: String,
    pub portfolio_path: PathBuf,
    pub portfolio_max_links: Option<usize>,
    pub user_agent: String,
    pub persona: Persona,
    pub failure_policy: FailurePolicy,
    pub compose_concurrency: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Persona::default();

        Ok(Config {
            groq_api_key: std::env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env_or("GROQ_MODEL", DEFAULT_MODEL),
            groq_api_url: env_or("GROQ_API_URL", DEFAULT_API_URL),
            portfolio_path: portfolio_path(std::env::var("PORTFOLIO_PATH").ok()),
            portfolio_max_links: parse_max_links(std::env::var("PORTFOLIO_MAX_LINKS").ok())?,
            user_agent: env_or("USER_AGENT", DEFAULT_USER_AGENT),
            persona: Persona {
                sender_name: env_or("SENDER_NAME", &defaults.sender_name),
                sender_title: env_or("SENDER_TITLE", &defaults.sender_title),
                company_name: env_or("COMPANY_NAME", &defaults.company_name),
                company_pitch: env_or("COMPANY_PITCH", DEFAULT_COMPANY_PITCH),
            },
            failure_policy: env_or("FAILURE_POLICY", "fail_fast")
                .parse::<FailurePolicy>()
                .map_err(|e| anyhow!(e))
                .context("FAILURE_POLICY is invalid")?,
            compose_concurrency: parse_concurrency(&env_or("COMPOSE_CONCURRENCY", "1"))?,
            port: env_or("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// `true` when a model credential is present. Only used for startup logging.
    pub fn has_api_key(&self) -> bool {
        !self.groq_api_key.is_empty()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// An explicit `PORTFOLIO_PATH` is used as given. The default is looked up in the working
/// directory first, then next to this crate's manifest.
fn portfolio_path(configured: Option<String>) -> PathBuf {
    if let Some(path) = configured.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path.trim());
    }
    let local = PathBuf::from(DEFAULT_PORTFOLIO_FILE);
    if local.exists() {
        return local;
    }
    Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_PORTFOLIO_FILE)
}

/// Unset, blank or `0` means no cap.
fn parse_max_links(raw: Option<String>) -> Result<Option<usize>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            let limit = value
                .parse::<usize>()
                .context("PORTFOLIO_MAX_LINKS must be a non-negative integer")?;
            Ok((limit > 0).then_some(limit))
        }
    }
}

fn parse_concurrency(raw: &str) -> Result<usize> {
    let value = raw
        .trim()
        .parse::<usize>()
        .context("COMPOSE_CONCURRENCY must be a positive integer")?;
    if value == 0 {
        anyhow::bail!("COMPOSE_CONCURRENCY must be at least 1");
    }
    Ok(value)
}
