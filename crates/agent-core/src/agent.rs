//! Agent Loop
//!
//! Resolves one user utterance into one [`AgentOutcome`] by alternating
//! reasoning-engine decisions and tool executions (the ReAct pattern).
//!
//! Per turn the loop:
//! - asks the engine for a decision at most `max_iterations` times;
//! - executes exactly the action chosen in each iteration, one at a time,
//!   never retrying on its own;
//! - turns unknown tools, bad arguments and tool failures into observations
//!   the engine can react to, instead of ending the turn.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::observer::Observer;
use crate::reasoning::{Decision, ReasoningEngine, ReasoningRequest};
use crate::scratchpad::{Action, Observation, Scratchpad};
use crate::tool::{ToolError, ToolRegistry, ToolSpec};

/// Instructions used when none are configured
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant that can use tools to act on the user's behalf.
Use a tool only when it is needed to answer; answer directly otherwise.
Once a tool returns a result, DO NOT call the same tool again with the same parameters.";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System instructions for the reasoning engine
    pub instructions: String,

    /// Maximum reasoning iterations per turn
    pub max_iterations: usize,

    /// Limit on a single tool execution
    pub tool_timeout: Option<Duration>,

    /// Limit on a single reasoning-engine call
    pub engine_timeout: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.into(),
            max_iterations: 10,
            tool_timeout: None,
            engine_timeout: None,
        }
    }
}

/// Result of one agent-loop invocation
#[derive(Debug)]
pub enum AgentOutcome {
    /// The engine answered
    FinalAnswer(String),

    /// The iteration budget ran out; carries every action taken
    Exhausted(Scratchpad),

    /// The engine could not produce a decision
    Faulted(AgentError),
}

impl AgentOutcome {
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::FinalAnswer(_))
    }

    /// Collapse into a `Result`, exhaustion becoming `IterationsExhausted`
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::FinalAnswer(text) => Ok(text),
            // every non-final iteration leaves exactly one entry
            Self::Exhausted(scratchpad) => Err(AgentError::IterationsExhausted(scratchpad.len())),
            Self::Faulted(err) => Err(err),
        }
    }
}

/// The main Agent struct
pub struct Agent {
    engine: Arc<dyn ReasoningEngine>,
    tools: Arc<ToolRegistry>,
    catalog: Vec<ToolSpec>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent; fails when `config` allows no iterations
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Result<Self> {
        if config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }
        let catalog = tools.specs();
        Ok(Self {
            engine,
            tools,
            catalog,
            config,
        })
    }

    /// Run one turn
    pub async fn run(
        &self,
        input: &str,
        history: &[Message],
        observer: &dyn Observer,
    ) -> AgentOutcome {
        let mut scratchpad = Scratchpad::new();

        for iteration in 1..=self.config.max_iterations {
            let request = ReasoningRequest {
                instructions: self.config.instructions.clone(),
                tools: self.catalog.clone(),
                history: history.to_vec(),
                scratchpad: scratchpad.clone(),
                input: input.to_string(),
            };

            let decision = match self.decide(&request).await {
                Ok(decision) => decision,
                Err(e) => {
                    tracing::warn!(iteration, error = %e, "Reasoning engine failed");
                    return AgentOutcome::Faulted(match e {
                        AgentError::EngineFailure(_) => e,
                        other => AgentError::EngineFailure(other.to_string()),
                    });
                }
            };

            let action = match decision {
                Decision::Final { text } => {
                    tracing::debug!(iteration, actions = scratchpad.len(), "Final answer");
                    return AgentOutcome::FinalAnswer(text);
                }
                Decision::Action { tool, args } => Action::new(tool, args),
            };

            tracing::debug!(iteration, tool = %action.tool, input = %action.input, "Action");
            observer.on_action(iteration, &action);

            let observation = self.observe(&action).await;
            match &observation {
                Observation::Output { output } => {
                    tracing::debug!(tool = %action.tool, "Tool succeeded");
                    observer.on_observation(&action, output);
                }
                failure => {
                    tracing::warn!(tool = %action.tool, kind = failure.kind(), "{failure}");
                    observer.on_failure(&action, failure);
                }
            }

            scratchpad.push(action, observation);
        }

        tracing::warn!(
            max_iterations = self.config.max_iterations,
            "Iteration budget exhausted"
        );
        AgentOutcome::Exhausted(scratchpad)
    }

    async fn decide(&self, request: &ReasoningRequest) -> Result<Decision> {
        match self.config.engine_timeout {
            Some(limit) => tokio::time::timeout(limit, self.engine.decide(request))
                .await
                .map_err(|_| {
                    AgentError::EngineFailure(format!(
                        "no decision within {:.1}s",
                        limit.as_secs_f64()
                    ))
                })?,
            None => self.engine.decide(request).await,
        }
    }

    /// Resolve, validate and execute one action
    async fn observe(&self, action: &Action) -> Observation {
        let Ok(tool) = self.tools.lookup(&action.tool) else {
            return Observation::UnknownTool {
                tool: action.tool.clone(),
                available: self.tools.names().into_iter().map(String::from).collect(),
            };
        };

        let args = match tool.spec().input_schema.validate(&action.input) {
            Ok(args) => args,
            Err(violation) => {
                return Observation::SchemaViolation {
                    tool: action.tool.clone(),
                    violation,
                };
            }
        };

        let execution = AssertUnwindSafe(tool.execute(&args)).catch_unwind();
        let result = match self.config.tool_timeout {
            Some(limit) => tokio::time::timeout(limit, execution)
                .await
                .unwrap_or_else(|_| {
                    Ok(Err(ToolError::new(
                        "timeout",
                        format!("no result within {:.1}s", limit.as_secs_f64()),
                    )))
                }),
            None => execution.await,
        };

        match result {
            Ok(Ok(output)) => Observation::Output { output },
            Ok(Err(error)) => Observation::ToolExecutionError {
                tool: action.tool.clone(),
                error,
            },
            Err(panic) => Observation::ToolExecutionError {
                tool: action.tool.clone(),
                error: ToolError::new("panic", panic_message(panic.as_ref())),
            },
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "tool panicked".into())
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    engine: Option<Arc<dyn ReasoningEngine>>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            engine: None,
            tools: Arc::new(ToolRegistry::new()),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn ReasoningEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.instructions = instructions.into();
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub const fn tool_timeout(mut self, limit: Duration) -> Self {
        self.config.tool_timeout = Some(limit);
        self
    }

    #[must_use]
    pub const fn engine_timeout(mut self, limit: Duration) -> Self {
        self.config.engine_timeout = Some(limit);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let engine = self
            .engine
            .ok_or_else(|| AgentError::Config("Reasoning engine is required".into()))?;

        Agent::new(engine, self.tools, self.config)
    }
}
