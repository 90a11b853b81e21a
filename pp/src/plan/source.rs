//! External plan source trait
//!
//! An external source turns symptoms and context into a candidate plan, or
//! fails. Candidates are never trusted: the orchestrator validates them.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CandidatePlan, DiagnoseContext};
use crate::llm::LlmError;

/// Why an external source produced no candidate
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("completion request failed: {0}")]
    Transport(#[from] LlmError),

    #[error("completion had no content")]
    EmptyCompletion,

    #[error("completion contained no JSON object")]
    NoJsonObject,

    #[error("completion JSON did not match the plan shape: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to render prompt: {0}")]
    Prompt(String),
}

/// Produces candidate plans from a generative text service
#[async_trait]
pub trait ExternalPlanSource: Send + Sync {
    /// One request/response exchange; no partial results
    async fn generate(&self, symptoms: &str, context: Option<&DiagnoseContext>) -> Result<CandidatePlan, SourceError>;
}
