//! LLM adapter module: client trait, rate limiting, retry policy, and JSON
//! extraction from model output (§4.2).

pub mod client;
pub mod json_extract;
pub mod rate_limiter;
pub mod retry;

pub use client::{LlmClient, LlmOutcome, LlmRequest, OpenAiLlmClient, TokenUsage};
pub use json_extract::extract_json;
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
