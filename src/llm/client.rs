//! LLM adapter: the generation half of the orchestrator (§4.2).
//!
//! [`LlmClient`] is the uniform interface the planner and orchestrator call
//! against. [`OpenAiLlmClient`] wires an `async-openai` chat-completions
//! client through the rate limiter and retry policy, extracting a JSON value
//! from whatever text the model returns.

use crate::error::{Error, LlmError, Result};
use crate::llm::json_extract::extract_json;
use crate::llm::rate_limiter::RateLimiter;
use crate::llm::retry::RetryPolicy;
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, FinishReason,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A single sub-request sent to the LLM: a system/user prompt pair plus the
/// generation parameters that bound its response.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// System prompt (role, tone, output-shape instructions).
    pub system_prompt: String,
    /// User prompt, including the partitioned context piece.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Hard cap on output tokens for this call.
    pub max_output_tokens: u32,
}

/// Token accounting for a single LLM call, aggregated across pieces into a
/// generation's [`GenerationMetadata`](crate::core::GenerationMetadata).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    /// Prompt-side tokens consumed.
    pub prompt_tokens: u32,
    /// Candidate/completion-side tokens consumed.
    pub completion_tokens: u32,
    /// Total tokens consumed (usually `prompt_tokens + completion_tokens`).
    pub total_tokens: u32,
}

/// The extracted JSON value plus token accounting for one LLM call.
#[derive(Debug, Clone)]
pub struct LlmOutcome {
    /// Strictly-parsed JSON value extracted from the model's text output.
    pub json: Value,
    /// Token usage reported by the provider for this call.
    pub usage: TokenUsage,
}

/// Uniform interface over an LLM provider for the orchestrator's generation step.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends `request` and returns the strictly-parsed JSON value extracted
    /// from the model's text output, plus token usage.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Truncated`] if the model hit `max_output_tokens`,
    /// [`LlmError::SafetyBlocked`] if a content filter fired,
    /// [`LlmError::InvalidJson`] if no valid JSON could be extracted, or
    /// [`LlmError::RetriesExhausted`] if transient failures persisted past
    /// the retry budget.
    async fn generate_json(&self, request: LlmRequest) -> Result<LlmOutcome>;
}

/// `async-openai`-backed [`LlmClient`], rate-limited and retried.
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    model: String,
    rate_limiter: Arc<RateLimiter>,
    retry_policy: RetryPolicy,
}

impl OpenAiLlmClient {
    /// Builds a client against `model`, sharing `rate_limiter` with any
    /// other client instances drawing from the same provider quota.
    #[must_use]
    pub fn new(model: impl Into<String>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            rate_limiter,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Overrides the default retry policy (mainly for tests).
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn call_once(&self, request: &LlmRequest) -> Result<LlmOutcome> {
        self.rate_limiter.acquire().await;

        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.clone())
            .build()
            .map_err(|e| LlmError::RequestRejected(e.to_string()))?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_prompt.clone())
            .build()
            .map_err(|e| LlmError::RequestRejected(e.to_string()))?;

        let completion_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(request.temperature)
            .max_tokens(request.max_output_tokens)
            .messages(vec![system.into(), user.into()])
            .build()
            .map_err(|e| LlmError::RequestRejected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(completion_request)
            .await
            .map_err(|e| classify_provider_error(&e))?;

        let usage = response.usage.as_ref().map_or(TokenUsage::default(), |u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Transient("provider returned zero choices".to_string()))?;

        if matches!(choice.finish_reason, Some(FinishReason::ContentFilter)) {
            return Err(LlmError::SafetyBlocked {
                reason: "content_filter".to_string(),
            }
            .into());
        }
        if matches!(choice.finish_reason, Some(FinishReason::Length)) {
            return Err(LlmError::Truncated {
                max_output_tokens: request.max_output_tokens,
                consumed: if usage.completion_tokens > 0 {
                    usage.completion_tokens
                } else {
                    request.max_output_tokens
                },
            }
            .into());
        }

        let text = choice
            .message
            .content
            .ok_or_else(|| LlmError::Transient("provider returned empty message content".to_string()))?;

        debug!(chars = text.len(), "received LLM response");
        let json = extract_json(&text)?;
        Ok(LlmOutcome { json, usage })
    }
}

#[async_trait]
impl LlmClient for OpenAiLlmClient {
    async fn generate_json(&self, request: LlmRequest) -> Result<LlmOutcome> {
        self.retry_policy.run(|| self.call_once(&request)).await
    }
}

/// Maps an `async-openai` transport error to the orchestrator's LLM error
/// taxonomy. Rate limits and server/network errors are transient; anything
/// else (bad request, auth) is not retried.
fn classify_provider_error(err: &async_openai::error::OpenAIError) -> Error {
    use async_openai::error::OpenAIError;
    match err {
        OpenAIError::ApiError(api_err) => match api_err.code.as_deref() {
            Some("rate_limit_exceeded") => LlmError::Transient(api_err.message.clone()).into(),
            _ => LlmError::RequestRejected(api_err.message.clone()).into(),
        },
        OpenAIError::Reqwest(_) | OpenAIError::StreamError(_) => {
            LlmError::Transient(err.to_string()).into()
        }
        other => LlmError::RequestRejected(other.to_string()).into(),
    }
}
