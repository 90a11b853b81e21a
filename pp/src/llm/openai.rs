//! OpenAI API client implementation
//!
//! Implements the LlmClient trait for OpenAI's Chat Completions API. One
//! request per call, no retries: a failed call is the caller's cue to fall
//! back, not to try again.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, ResponseFormat, StopReason, TokenUsage};
use crate::config::ResolvedLlmConfig;

/// OpenAI API client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl OpenAIClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedLlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "from_config: called");
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let timeout = config.timeout();

        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
        })
    }

    /// GPT-5.x and o1/o3 models take max_completion_tokens and reject temperature
    fn is_reasoning_model(&self) -> bool {
        self.model.starts_with("gpt-5") || self.model.starts_with("o1") || self.model.starts_with("o3")
    }

    /// Build the request body for the OpenAI API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];

        messages.extend(convert_messages(&request.messages));

        let max_tokens = request.max_tokens.min(self.max_tokens);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        if self.is_reasoning_model() {
            debug!("build_request_body: reasoning model, using max_completion_tokens");
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
            body["temperature"] = serde_json::json!(self.temperature);
        }

        match &request.response_format {
            Some(ResponseFormat::JsonSchema { name, schema }) => {
                debug!(%name, "build_request_body: adding json_schema response_format");
                body["response_format"] = serde_json::json!({
                    "type": "json_schema",
                    "json_schema": {
                        "name": name,
                        "strict": true,
                        "schema": schema,
                    }
                });
            }
            None => {
                debug!("build_request_body: no response_format");
            }
        }

        body
    }

    /// Parse the OpenAI API response
    fn parse_response(&self, api_response: OpenAIResponse) -> CompletionResponse {
        debug!(choice_count = %api_response.choices.len(), "parse_response: called");
        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let Some(choice) = api_response.choices.into_iter().next() else {
            debug!("parse_response: no choices");
            return CompletionResponse {
                content: None,
                stop_reason: StopReason::EndTurn,
                usage,
            };
        };

        if let Some(refusal) = &choice.message.refusal {
            warn!(%refusal, "parse_response: model refused");
        }

        let content = choice.message.content.filter(|c| !c.trim().is_empty());

        CompletionResponse {
            content,
            stop_reason: StopReason::from_openai(choice.finish_reason.as_deref()),
            usage,
        }
    }
}

fn convert_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    debug!(message_count = %messages.len(), "convert_messages: called");
    messages
        .iter()
        .map(|msg| {
            serde_json::json!({
                "role": msg.role.as_str(),
                "content": msg.content,
            })
        })
        .collect()
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    debug!("complete: request timed out");
                    LlmError::Timeout(self.timeout)
                } else {
                    debug!(error = %e, "complete: network error");
                    LlmError::Network(e)
                }
            })?;

        let status = response.status().as_u16();

        if !response.status().is_success() {
            debug!(%status, "complete: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        debug!("complete: success");
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout)
            } else {
                LlmError::Network(e)
            }
        })?;
        let api_response: OpenAIResponse = serde_json::from_str(&text)?;
        let response = self.parse_response(api_response);
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "complete: parsed response"
        );
        Ok(response)
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(model: &str, max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            model: model.to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            http: Client::new(),
            max_tokens,
            temperature: 0.2,
            timeout: Duration::from_secs(30),
        }
    }

    fn request(max_tokens: u32) -> CompletionRequest {
        CompletionRequest {
            system_prompt: "You are helpful".to_string(),
            messages: vec![Message::user("Hello")],
            max_tokens,
            response_format: None,
        }
    }

    #[test]
    fn test_build_request_body_basic() {
        let body = client("gpt-4o", 8192).build_request_body(&request(1000));

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert!(body["messages"].is_array());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are helpful");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello");
        assert!(body["temperature"].is_number());
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_max_tokens_capped() {
        let body = client("gpt-4o", 1000).build_request_body(&request(5000));
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_reasoning_model_uses_completion_tokens() {
        let body = client("gpt-5-mini", 1200).build_request_body(&request(1200));
        assert_eq!(body["max_completion_tokens"], 1200);
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("temperature").is_none());

        let body = client("o3-mini", 1200).build_request_body(&request(1200));
        assert!(body.get("max_completion_tokens").is_some());
    }

    #[test]
    fn test_json_schema_response_format() {
        let mut req = request(1000);
        req.response_format = Some(ResponseFormat::JsonSchema {
            name: "pool_diagnose_plan".to_string(),
            schema: serde_json::json!({"type": "object"}),
        });
        let body = client("gpt-4o-mini", 1200).build_request_body(&req);

        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "pool_diagnose_plan");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(body["response_format"]["json_schema"]["schema"]["type"], "object");
    }

    #[test]
    fn test_parse_response_content_and_usage() {
        let raw = r#"{
            "choices": [{"message": {"content": "{\"a\":1}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let parsed: OpenAIResponse = serde_json::from_str(raw).unwrap();
        let resp = client("gpt-4o", 1000).parse_response(parsed);
        assert_eq!(resp.content.as_deref(), Some("{\"a\":1}"));
        assert_eq!(resp.stop_reason, StopReason::EndTurn);
        assert_eq!(resp.usage.total(), 15);
    }

    #[test]
    fn test_parse_response_without_choices_or_usage() {
        let parsed: OpenAIResponse = serde_json::from_str("{}").unwrap();
        let resp = client("gpt-4o", 1000).parse_response(parsed);
        assert!(resp.content.is_none());
        assert_eq!(resp.usage, TokenUsage::default());
    }

    #[test]
    fn test_parse_response_refusal_has_no_content() {
        let raw = r#"{"choices": [{"message": {"content": null, "refusal": "no"}, "finish_reason": "stop"}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(raw).unwrap();
        let resp = client("gpt-4o", 1000).parse_response(parsed);
        assert!(resp.content.is_none());
    }

    #[test]
    fn test_from_config_requires_key() {
        let resolved = crate::config::LlmConfig::default().resolve_with(|_| None);
        assert!(matches!(
            OpenAIClient::from_config(&resolved),
            Err(LlmError::MissingApiKey(env)) if env == "OPENAI_API_KEY"
        ));
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let resolved = crate::config::LlmConfig::default().resolve_with(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "OPENAI_BASE_URL" => Some("http://localhost:1/v1/".to_string()),
            _ => None,
        });
        let client = OpenAIClient::from_config(&resolved).unwrap();
        assert_eq!(client.base_url, "http://localhost:1/v1");
    }
}
