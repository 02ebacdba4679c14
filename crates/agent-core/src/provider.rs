//! Chat-completion backends
//!
//! [`LlmReasoningEngine`](crate::reasoning::LlmReasoningEngine) talks to a
//! model only through [`LlmProvider`]. Backends live in `agent-runtime`.

use async_trait::async_trait;

use crate::error::Result;
use crate::message::Message;

const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TOP_P: f32 = 0.9;

/// Sampling parameters sent with every completion request
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    pub top_p: f32,
    /// Generation halts before any of these strings
    pub stop_sequences: Vec<String>,
}

impl GenerationOptions {
    /// Defaults with another model
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Cut `content` at the earliest stop sequence.
    ///
    /// Not every backend honors stop sequences, so replies are clipped again
    /// on our side.
    pub fn clip<'a>(&self, content: &'a str) -> &'a str {
        self.stop_sequences
            .iter()
            .filter(|s| !s.is_empty())
            .filter_map(|s| content.find(s.as_str()))
            .min()
            .map_or(content, |end| &content[..end])
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
            stop_sequences: Vec::new(),
        }
    }
}

/// One model reply
#[derive(Clone, Debug)]
pub struct Completion {
    pub content: String,
    /// Model that actually answered, which may differ from the one requested
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub const fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    /// Hit `max_tokens`; the reply is probably cut off
    Length,
    ContentFilter,
    Other,
}

/// A chat-completion backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Whether the backend answers at all
    async fn health_check(&self) -> Result<bool>;

    async fn complete(&self, messages: &[Message], options: &GenerationOptions)
    -> Result<Completion>;

    /// Model identifiers the backend can serve
    async fn list_models(&self) -> Result<Vec<String>>;
}
