//! Observer hooks
//!
//! Called synchronously by the agent loop, in order, as actions are taken.
//! Observers only watch; they cannot change what the loop does.

use crate::scratchpad::{Action, Observation};
use crate::tool::ToolOutput;

pub trait Observer: Send + Sync {
    /// The engine chose an action (before lookup or validation)
    fn on_action(&self, _iteration: usize, _action: &Action) {}

    /// The tool ran successfully
    fn on_observation(&self, _action: &Action, _output: &ToolOutput) {}

    /// The action produced an unknown-tool, schema or execution failure
    fn on_failure(&self, _action: &Action, _observation: &Observation) {}
}

/// Observer that ignores everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}
