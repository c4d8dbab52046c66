//! Model boundary: a blocking `complete(system, user)` call and the prompts
//! sent through it.

pub mod anthropic;
pub mod prompts;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected content from model provider: {0}")]
    UnexpectedContent(String),
    #[error("unexpected payload shape from {stage}: {detail}")]
    UnexpectedShape { stage: &'static str, detail: String },
}

/// A language model that turns a system prompt and a user message into text.
pub trait Completion {
    fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, UpstreamError>;
}
