//! Plan source backed by a chat-completion LLM

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::schema::{SCHEMA_NAME, plan_schema};
use super::source::{ExternalPlanSource, SourceError};
use crate::domain::{CandidatePlan, DiagnoseContext};
use crate::llm::{CompletionRequest, LlmClient, Message, ResponseFormat, StopReason};
use crate::prompts::{DiagnosePromptContext, PromptLoader};

/// Slice from the first `{` to the last `}`, if there is one
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Asks an LLM for a plan using the diagnose prompts and the plan schema
pub struct LlmPlanSource {
    client: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    max_tokens: u32,
}

impl LlmPlanSource {
    pub fn new(client: Arc<dyn LlmClient>, prompts: PromptLoader, max_tokens: u32) -> Self {
        debug!(%max_tokens, "LlmPlanSource::new: called");
        Self {
            client,
            prompts,
            max_tokens,
        }
    }

    fn build_request(&self, symptoms: &str, context: Option<&DiagnoseContext>) -> Result<CompletionRequest, SourceError> {
        debug!("LlmPlanSource::build_request: called");
        let system_prompt = self
            .prompts
            .diagnose_system()
            .map_err(|e| SourceError::Prompt(e.to_string()))?;
        let user_prompt = self
            .prompts
            .diagnose_user(&DiagnosePromptContext::new(symptoms, context))
            .map_err(|e| SourceError::Prompt(e.to_string()))?;

        Ok(CompletionRequest {
            system_prompt,
            messages: vec![Message::user(user_prompt)],
            max_tokens: self.max_tokens,
            response_format: Some(ResponseFormat::JsonSchema {
                name: SCHEMA_NAME.to_string(),
                schema: plan_schema(),
            }),
        })
    }
}

#[async_trait]
impl ExternalPlanSource for LlmPlanSource {
    async fn generate(&self, symptoms: &str, context: Option<&DiagnoseContext>) -> Result<CandidatePlan, SourceError> {
        debug!(symptoms_len = symptoms.len(), "LlmPlanSource::generate: called");
        let request = self.build_request(symptoms, context)?;

        let response = self.client.complete(request).await?;
        info!(
            total_tokens = response.usage.total(),
            stop_reason = ?response.stop_reason,
            "LLM completion received"
        );
        if response.stop_reason == StopReason::MaxTokens {
            debug!("LlmPlanSource::generate: completion truncated at max tokens");
        }

        let content = response.content.ok_or(SourceError::EmptyCompletion)?;
        let json = extract_json_object(&content).ok_or(SourceError::NoJsonObject)?;
        let candidate: CandidatePlan = serde_json::from_str(json)?;
        debug!(diagnosis = %candidate.diagnosis, "LlmPlanSource::generate: parsed candidate");
        Ok(candidate)
    }
}
