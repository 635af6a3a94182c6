//! LLM Clients and Abstractions
//!
//! - [`LLMClient`] - The core trait the agent runner and model-backed guardrails use
//! - [`OpenAIClient`] - Any OpenAI-compatible `/chat/completions` endpoint over `reqwest`
//!
//! # Example
//!
//! ```ignore
//! use aerodesk::llm::{CompletionRequest, LLMClient, OpenAIClient, OpenAIConfig};
//!
//! let client = OpenAIClient::new(config)?;
//! let response = client
//!     .complete(CompletionRequest::new("You are helpful.", vec![TranscriptItem::user("Hi")]))
//!     .await?;
//! println!("{}", response.content);
//! ```

/// Core LLM client trait and request/response types.
pub mod client;
/// OpenAI-compatible HTTP client.
pub mod openai;

pub use client::{CompletionRequest, LLMClient, LLMResponse};
pub use openai::{OpenAIClient, OpenAIConfig};
