//! Job Extractor — turns scraped careers-page text into structured `JobPosting`s.
//!
//! One model call per page, no retry. The reply must be JSON: either an array of
//! posting objects or a single posting object, which is wrapped into a one-element list.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{preview, strip_json_fences, ChatModel};
use crate::outreach::models::JobPosting;
use crate::outreach::prompts::EXTRACT_JOBS_PROMPT_TEMPLATE;
use crate::outreach::ExtractionError;

const LOG_PREVIEW_CHARS: usize = 300;

pub struct JobExtractor {
    llm: Arc<dyn ChatModel>,
}

impl JobExtractor {
    pub fn new(llm: Arc<dyn ChatModel>) -> Self {
        Self { llm }
    }

    /// Extracts every posting on the page, in the order the model lists them.
    pub async fn extract(&self, text: &str) -> Result<Vec<JobPosting>, ExtractionError> {
        info!(text_length = text.len(), "Invoking job extraction");

        let prompt = build_extraction_prompt(text);
        let raw = self
            .llm
            .complete(&prompt)
            .await
            .map_err(ExtractionError::Model)?;
        debug!(
            content_preview = %preview(&raw, LOG_PREVIEW_CHARS),
            "LLM raw response for job extraction"
        );

        let jobs = parse_postings(&raw)?;
        info!(jobs_count = jobs.len(), "Job extraction parsed results");
        Ok(jobs)
    }
}

pub fn build_extraction_prompt(text: &str) -> String {
    EXTRACT_JOBS_PROMPT_TEMPLATE
        .replace("{json_only_instruction}", JSON_ONLY_INSTRUCTION)
        .replace("{page_data}", text)
}

/// Decodes model output into postings.
///
/// Array → each element must be a posting object. Object → one posting.
/// Anything else, or text that is not JSON at all, is `Unparseable`.
pub fn parse_postings(raw: &str) -> Result<Vec<JobPosting>, ExtractionError> {
    let body = strip_json_fences(raw);
    let value: Value = serde_json::from_str(body).map_err(|e| {
        warn!(
            error = %e,
            content_preview = %preview(body, LOG_PREVIEW_CHARS),
            "Failed to parse jobs from LLM output"
        );
        ExtractionError::Unparseable
    })?;

    match value {
        Value::Array(items) => items.into_iter().map(decode_posting).collect(),
        Value::Object(_) => Ok(vec![decode_posting(value)?]),
        other => {
            warn!(
                json_type = json_type(&other),
                "LLM output is JSON but neither a posting nor a list of postings"
            );
            Err(ExtractionError::Unparseable)
        }
    }
}

fn decode_posting(value: Value) -> Result<JobPosting, ExtractionError> {
    if !value.is_object() {
        warn!(
            json_type = json_type(&value),
            "Posting list contains a non-object element"
        );
        return Err(ExtractionError::Unparseable);
    }

    serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "Posting object has fields of the wrong shape");
        ExtractionError::Unparseable
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
