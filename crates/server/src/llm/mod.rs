//! Chat-completion client for OpenAI-compatible APIs.
//!
//! Used by the advisor to draft product descriptions and summarize store
//! figures. The default provider is Groq; any endpoint that implements
//! `POST {base}/chat/completions` works.
//!
//! # Example
//!
//! ```rust,ignore
//! use campus_mart_server::llm::{LlmClient, Message};
//!
//! let client = LlmClient::new(&ai_config)?;
//! let reply = client.complete(vec![Message::user("Say hi")]).await?;
//! ```

mod client;
mod error;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use types::{ChatRequest, ChatResponse, Choice, Message, Role};

#[cfg(test)]
pub(crate) use client::tests as test_support;
