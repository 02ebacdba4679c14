//! # agent-core
//!
//! Tool-calling agent loop with a provider-agnostic reasoning boundary.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SessionLoop                           │
//! │  ┌─────────────┐   ┌─────────────┐   ┌────────────────────┐  │
//! │  │    Agent    │───│    Tool     │───│   ToolProvider(s)  │  │
//! │  │    Loop     │   │  Registry   │   │   (wallet, erc20,  │  │
//! │  └──────┬──────┘   └─────────────┘   │    checkout, ...)  │  │
//! │         │                            └────────────────────┘  │
//! │  ┌──────┴──────────┐   ┌─────────────────────┐               │
//! │  │ ReasoningEngine │───│    LlmProvider      │               │
//! │  │   (Strategy)    │   │    (Strategy)       │               │
//! │  └─────────────────┘   └─────────────────────┘               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ReasoningEngine` trait is the only thing the loop asks for decisions;
//! `LlmReasoningEngine` implements it over any `LlmProvider`, so swapping
//! Ollama for OpenAI changes no agent logic.

pub mod agent;
pub mod error;
pub mod message;
pub mod observer;
pub mod provider;
pub mod reasoning;
pub mod schema;
pub mod scratchpad;
pub mod session;
pub mod tool;

pub use agent::{Agent, AgentBuilder, AgentConfig, AgentOutcome};
pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use observer::{NoopObserver, Observer};
pub use provider::LlmProvider;
pub use reasoning::{Decision, LlmReasoningEngine, ReasoningEngine, ReasoningRequest};
pub use schema::{InputSchema, ParamType, ParameterSchema, SchemaViolation, ToolArgs};
pub use scratchpad::{Action, Observation, Scratchpad, ScratchpadEntry};
pub use session::{Session, SessionCommand, SessionEvent, SessionLoop, TurnFailure};
pub use tool::{Tool, ToolError, ToolOutput, ToolProvider, ToolRegistry, ToolSpec};
