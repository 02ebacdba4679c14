//! Actions, observations and the per-turn scratchpad.

use serde::{Deserialize, Serialize};

use crate::schema::SchemaViolation;
use crate::tool::{ToolError, ToolOutput};

/// A tool invocation proposed by the reasoning engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub tool: String,
    pub input: serde_json::Value,
}

impl Action {
    pub fn new(tool: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            tool: tool.into(),
            input,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.tool, self.input)
    }
}

/// What came of an action
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// The tool ran and returned a result
    Output { output: ToolOutput },

    /// No tool by that name is registered; nothing was executed
    UnknownTool {
        tool: String,
        available: Vec<String>,
    },

    /// Arguments were rejected before execution
    SchemaViolation {
        tool: String,
        violation: SchemaViolation,
    },

    /// The tool body (or its backend) failed
    ToolExecutionError { tool: String, error: ToolError },
}

impl Observation {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Output { .. })
    }

    /// Stable identifier of the observation kind
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Output { .. } => "output",
            Self::UnknownTool { .. } => "unknown_tool",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::ToolExecutionError { .. } => "tool_execution_error",
        }
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Output { output } => write!(f, "{output}"),
            Self::UnknownTool { tool, available } => write!(
                f,
                "Error [unknown_tool]: '{tool}' is not a valid tool. Available tools: {}",
                available.join(", ")
            ),
            Self::SchemaViolation { tool, violation } => {
                write!(f, "Error [schema_violation]: invalid input for '{tool}': {violation}")
            }
            Self::ToolExecutionError { tool, error } => {
                write!(f, "Error [{}]: '{tool}' failed: {}", error.code, error.message)
            }
        }
    }
}

/// One action and its observation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScratchpadEntry {
    pub action: Action,
    pub observation: Observation,
}

/// Ordered action/observation history of a single turn
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scratchpad {
    entries: Vec<ScratchpadEntry>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action, observation: Observation) {
        self.entries.push(ScratchpadEntry {
            action,
            observation,
        });
    }

    pub fn entries(&self) -> &[ScratchpadEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ScratchpadEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScratchpadEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Scratchpad {
    type Item = &'a ScratchpadEntry;
    type IntoIter = std::slice::Iter<'a, ScratchpadEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
