//! LLM client abstractions: a provider-agnostic [`LlmClient`] trait, an
//! OpenAI-compatible implementation, and the retry/concurrency wrappers
//! composed by [`build_llm_client`].

pub mod client;
pub mod config;
pub mod mock;
pub mod openai;
pub mod retry;

pub use client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, Role};
pub use config::{build_llm_client, LlmConfig, SemaphoredClient};
pub use mock::MockLlm;
pub use openai::OpenAiClient;
pub use retry::{RetryConfig, RetryingClient};
