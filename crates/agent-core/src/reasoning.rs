//! Reasoning Engine Boundary
//!
//! The agent loop asks a [`ReasoningEngine`] for exactly one [`Decision`] per
//! iteration: answer now, or run one tool. [`LlmReasoningEngine`] implements
//! the boundary on top of any [`LlmProvider`] using a structured-chat prompt
//! in which the model replies with a fenced JSON blob.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::message::{Message, Role};
use crate::provider::{FinishReason, GenerationOptions, LlmProvider};
use crate::scratchpad::Scratchpad;
use crate::tool::{ToolSpec, render_catalog};

/// Everything the engine may look at to make one decision
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReasoningRequest {
    /// System instructions
    pub instructions: String,

    /// Tool catalog, in registry order
    pub tools: Vec<ToolSpec>,

    /// Prior completed turns of the session
    pub history: Vec<Message>,

    /// Actions and observations so far in this turn
    pub scratchpad: Scratchpad,

    /// The current utterance
    pub input: String,
}

/// One decision of the reasoning engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Respond to the user and end the turn
    Final { text: String },

    /// Invoke one tool
    Action {
        tool: String,
        #[serde(default)]
        args: serde_json::Value,
    },
}

impl Decision {
    pub fn final_answer(text: impl Into<String>) -> Self {
        Self::Final { text: text.into() }
    }

    pub fn action(tool: impl Into<String>, args: serde_json::Value) -> Self {
        Self::Action {
            tool: tool.into(),
            args,
        }
    }
}

/// The external decision-making collaborator
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Return exactly one decision for the request
    async fn decide(&self, request: &ReasoningRequest) -> Result<Decision>;
}

/// Action name the model uses to answer the user directly
pub const FINAL_ANSWER_ACTION: &str = "Final Answer";

const FORMAT_INSTRUCTIONS: &str = r#"## Response Format

Use a JSON blob to specify a tool by providing an "action" key (tool name) and an "action_input" key (tool input).

Valid "action" values: "Final Answer" or one of the tool names listed above.

Provide only ONE action per JSON blob, like this:

```json
{
  "action": $TOOL_NAME,
  "action_input": $INPUT
}
```

After each action you will receive an observation. When you know what to tell the user, respond with:

```json
{
  "action": "Final Answer",
  "action_input": "Final response to the user"
}
```

Always respond with a single valid JSON blob."#;

/// Reasoning engine backed by a chat-completion provider
pub struct LlmReasoningEngine {
    provider: Arc<dyn LlmProvider>,
    generation: GenerationOptions,
}

impl LlmReasoningEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, generation: GenerationOptions) -> Self {
        Self {
            provider,
            generation,
        }
    }

    pub const fn generation(&self) -> &GenerationOptions {
        &self.generation
    }

    /// Render a request as chat messages
    pub fn render(request: &ReasoningRequest) -> Vec<Message> {
        let mut system = request.instructions.trim().to_string();
        system.push_str("\n\n");
        system.push_str(&render_catalog(&request.tools));
        system.push_str(FORMAT_INSTRUCTIONS);

        let mut messages = Vec::with_capacity(request.history.len() + request.scratchpad.len() * 2 + 2);
        messages.push(Message::system(system));
        messages.extend(
            request
                .history
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned(),
        );
        messages.push(Message::user(request.input.clone()));

        for entry in &request.scratchpad {
            let blob = serde_json::json!({
                "action": entry.action.tool,
                "action_input": entry.action.input,
            });
            messages.push(Message::assistant(format!("```json\n{blob:#}\n```")));

            messages.push(Message::user(format!("Observation: {}", entry.observation)));
        }

        messages
    }
}

#[async_trait]
impl ReasoningEngine for LlmReasoningEngine {
    async fn decide(&self, request: &ReasoningRequest) -> Result<Decision> {
        let messages = Self::render(request);
        let completion = self.provider.complete(&messages, &self.generation).await?;

        if let Some(usage) = completion.usage {
            tracing::debug!(
                provider = self.provider.name(),
                model = %completion.model,
                tokens = usage.total(),
                "Completion received"
            );
        }
        if completion.finish_reason == Some(FinishReason::Length) {
            tracing::warn!(model = %completion.model, "Model reply hit the token limit");
        }
        tracing::trace!(content = %completion.content, "Model reply");

        parse_decision(self.generation.clip(&completion.content))
    }
}

#[derive(Deserialize)]
struct ActionBlob {
    action: String,
    #[serde(default)]
    action_input: serde_json::Value,
}

/// Parse a model reply into a decision.
///
/// A reply without an action blob is a final answer. A reply that carries a
/// blob which cannot be parsed is an error, not an answer.
pub fn parse_decision(content: &str) -> Result<Decision> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AgentError::Parse("empty model response".into()));
    }

    let Some(json_str) = extract_blob(content) else {
        return Ok(Decision::final_answer(content));
    };

    let blob: ActionBlob = serde_json::from_str(json_str)
        .map_err(|e| AgentError::Parse(format!("invalid action blob: {e}")))?;

    if blob.action == FINAL_ANSWER_ACTION {
        let text = match blob.action_input {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        return Ok(Decision::final_answer(text));
    }

    let args = match blob.action_input {
        // Models sometimes double-encode the input object
        serde_json::Value::String(s) if s.trim_start().starts_with('{') => {
            serde_json::from_str(&s).unwrap_or(serde_json::Value::String(s))
        }
        other => other,
    };

    Ok(Decision::action(blob.action, args))
}

/// Locate the JSON text of an action blob, fenced or inline
fn extract_blob(content: &str) -> Option<&str> {
    let mut rest = content;
    while let Some(start) = rest.find("```") {
        let after_fence = &rest[start + 3..];
        let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
        let body = &after_fence[body_start..];
        let Some(end) = body.find("```") else {
            break;
        };
        let candidate = body[..end].trim();
        if candidate.contains("\"action\"") {
            return Some(candidate);
        }
        rest = &body[end + 3..];
    }

    // Fallback: bare JSON object with an "action" key
    if !content.contains("\"action\"") {
        return None;
    }
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}
