// Outreach: job extraction, portfolio retrieval, email composition.
// All LLM calls go through llm_client::ChatModel.

pub mod composer;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod prompts;

use thiserror::Error;

use crate::llm_client::LlmError;
use crate::portfolio::StoreError;

pub use composer::{EmailComposer, Persona};
pub use extractor::JobExtractor;
pub use pipeline::{FailurePolicy, Pipeline, PipelineReport};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Job extraction call failed: {0}")]
    Model(#[source] LlmError),

    /// The parser diagnostic is logged where it happens, never carried here.
    #[error("Context too big. Unable to parse jobs.")]
    Unparseable,
}

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("Email composition failed for {role}: {source}")]
    Model {
        role: String,
        #[source]
        source: LlmError,
    },

    #[error("Could not serialize posting {role} for the email prompt: {source}")]
    Serialize {
        role: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CompositionError {
    pub fn role(&self) -> &str {
        match self {
            CompositionError::Model { role, .. } | CompositionError::Serialize { role, .. } => role,
        }
    }
}

/// Anything that stops a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Composition(#[from] CompositionError),
}
