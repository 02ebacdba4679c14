//! Errors of the agent runtime
//!
//! Tool failures are not errors here: the loop turns them into observations
//! and keeps going. An `AgentError` ends the turn it occurs in, never the
//! session.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {
    /// Backend answered with something other than a completion
    #[error("Provider error: {0}")]
    Provider(String),

    /// Backend could not be reached
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Duplicate tool name: {0}")]
    DuplicateToolName(String),

    /// Empty tool name or description
    #[error("Invalid tool spec: {0}")]
    InvalidToolSpec(String),

    #[error("No final answer after {0} iterations")]
    IterationsExhausted(usize),

    /// Engine timed out or otherwise failed to decide
    #[error("Reasoning engine failure: {0}")]
    EngineFailure(String),

    /// Model reply carried an action blob that could not be read
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Whether the same request may succeed if simply sent again
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_) | Self::RateLimited(_))
    }

    /// Text shown to the user when a turn fails
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service returned an error: {msg}"),
            Self::ProviderUnavailable(_) => "The AI service is unreachable right now.".into(),
            Self::RateLimited(_) => "The AI service is busy.".into(),
            Self::Auth(_) => "The AI service rejected our credentials. Check the API key.".into(),
            Self::UnknownTool(name) => format!("The tool '{name}' is not available."),
            Self::DuplicateToolName(name) => {
                format!("More than one plugin provides a tool named '{name}'.")
            }
            Self::IterationsExhausted(n) => format!(
                "I couldn't finish that request within {n} steps. Please try rephrasing or breaking it up."
            ),
            Self::EngineFailure(msg) | Self::Parse(msg) => {
                format!("The assistant could not decide what to do: {msg}")
            }
            Self::InvalidToolSpec(msg) | Self::Config(msg) => format!("Setup problem: {msg}"),
        }
    }
}
