//! Plan orchestrator
//!
//! Composes the fallback builder, an optional external source, the validator
//! and the safety guard. The fallback is computed first, every time, so an
//! external failure of any kind only ever costs the richer plan.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::fallback;
use super::llm_source::LlmPlanSource;
use super::request::{DiagnoseRequest, RequestError};
use super::safety;
use super::source::{ExternalPlanSource, SourceError};
use super::validator::{self, PlanRejection};
use crate::config::ResolvedLlmConfig;
use crate::domain::{DiagnoseContext, DiagnosePlan, PlanSource};
use crate::llm::{self, LlmError};
use crate::prompts::PromptLoader;

/// Attached to every response where an external plan was wanted but not used
pub const FALLBACK_WARNING: &str = "LLM response unavailable or invalid; returned conservative fallback plan.";

/// Why an external plan was not used; logged, never returned to the caller
#[derive(Debug, Error)]
pub enum ExternalFailure {
    #[error("external source failed: {0}")]
    Source(#[from] SourceError),

    #[error("external source timed out after {0:?}")]
    Timeout(Duration),

    #[error("external plan rejected: {0}")]
    Rejected(#[from] PlanRejection),

    #[error("external plan contains unsafe instruction: {0:?}")]
    Unsafe(String),
}

/// Result of one diagnose operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseOutcome {
    pub plan: DiagnosePlan,
    pub source: PlanSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub safety_adjustments: Vec<String>,
}

impl DiagnoseOutcome {
    fn fallback(plan: DiagnosePlan, warning: Option<String>) -> Self {
        Self {
            plan,
            source: PlanSource::Fallback,
            warning,
            safety_adjustments: Vec::new(),
        }
    }
}

/// Produces a plan for each diagnose request
pub struct PlanOrchestrator {
    source: Option<Arc<dyn ExternalPlanSource>>,
    timeout: Duration,
}

impl PlanOrchestrator {
    pub fn new(source: Option<Arc<dyn ExternalPlanSource>>, timeout: Duration) -> Self {
        debug!(has_source = source.is_some(), ?timeout, "PlanOrchestrator::new: called");
        Self { source, timeout }
    }

    /// Orchestrator that never calls out
    pub fn fallback_only() -> Self {
        debug!("PlanOrchestrator::fallback_only: called");
        Self::new(None, Duration::ZERO)
    }

    /// Build from resolved configuration
    ///
    /// An absent API key means fallback-only; an unusable provider is an error.
    pub fn from_config(config: &ResolvedLlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "PlanOrchestrator::from_config: called");
        if !config.has_api_key() {
            debug!("PlanOrchestrator::from_config: no API key, fallback only");
            return Ok(Self::fallback_only());
        }

        let client = llm::create_client(config)?;
        let prompts = PromptLoader::new(config.prompts_dir.clone());
        let source = LlmPlanSource::new(client, prompts, config.max_tokens);
        info!(model = %config.model, "External plan source configured");
        Ok(Self::new(Some(Arc::new(source)), config.timeout()))
    }

    pub fn has_external_source(&self) -> bool {
        self.source.is_some()
    }

    /// Produce a plan for a request
    ///
    /// Only request-shape problems are errors; everything past that resolves
    /// to a plan.
    pub async fn produce(&self, request: &DiagnoseRequest) -> Result<DiagnoseOutcome, RequestError> {
        debug!(pool_id = %request.pool_id, "PlanOrchestrator::produce: called");
        request.validate()?;

        let context = request.context.as_ref();
        let fallback = fallback::build(&request.symptoms, context);
        if let Err(rejection) = validator::check(&fallback) {
            error!(%rejection, "Fallback plan failed validation");
        }

        let Some(source) = &self.source else {
            debug!("PlanOrchestrator::produce: no external source, returning fallback");
            return Ok(DiagnoseOutcome::fallback(fallback, None));
        };

        match self.external_plan(source.as_ref(), &request.symptoms, context).await {
            Ok((plan, safety_adjustments)) => {
                info!(adjustments = safety_adjustments.len(), "Using external plan");
                Ok(DiagnoseOutcome {
                    plan,
                    source: PlanSource::Llm,
                    warning: None,
                    safety_adjustments,
                })
            }
            Err(failure) => {
                warn!(%failure, "External plan unavailable, returning fallback");
                Ok(DiagnoseOutcome::fallback(fallback, Some(FALLBACK_WARNING.to_string())))
            }
        }
    }

    async fn external_plan(
        &self,
        source: &dyn ExternalPlanSource,
        symptoms: &str,
        context: Option<&DiagnoseContext>,
    ) -> Result<(DiagnosePlan, Vec<String>), ExternalFailure> {
        debug!(?self.timeout, "PlanOrchestrator::external_plan: called");
        let candidate = tokio::time::timeout(self.timeout, source.generate(symptoms, context))
            .await
            .map_err(|_| ExternalFailure::Timeout(self.timeout))??;

        let mut plan = validator::validate(&candidate)?;
        safety::screen(&plan).map_err(ExternalFailure::Unsafe)?;
        let adjustments = safety::enforce(&mut plan, context);
        Ok((plan, adjustments))
    }
}
