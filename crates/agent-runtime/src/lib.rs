//! # agent-runtime
//!
//! Concrete LLM providers for the shopping agent.
//!
//! ## Providers
//!
//! - **Ollama** (feature `ollama`): local inference through the Ollama daemon
//! - **OpenAI** (feature `openai`): any OpenAI-compatible chat completions API
//!
//! Both features are on by default.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{OllamaConfig, OllamaProvider};
//!
//! let provider = Arc::new(OllamaProvider::from_config(OllamaConfig::default()));
//! let engine = LlmReasoningEngine::new(provider, GenerationOptions::default());
//! let agent = AgentBuilder::new()
//!     .engine(Arc::new(engine))
//!     .build()?;
//! ```

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmProvider, Message, Result, Role};
