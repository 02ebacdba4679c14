//! Scripted engines, fake tools and providers shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_core::{
    Action, AgentError, Decision, InputSchema, Observation, Observer, ParamType, ParameterSchema,
    ReasoningEngine, ReasoningRequest, Result, Tool, ToolArgs, ToolError, ToolOutput, ToolProvider,
    ToolSpec,
};
use async_trait::async_trait;

/// Engine that replays a fixed script of decisions, then keeps answering
/// with the last entry. Records every request it sees.
pub struct ScriptedEngine {
    script: Mutex<VecDeque<Result<Decision>>>,
    fallback: Decision,
    pub requests: Mutex<Vec<ReasoningRequest>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Result<Decision>>, fallback: Decision) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always proposes the same decision
    pub fn repeating(decision: Decision) -> Arc<Self> {
        Self::new(Vec::new(), decision)
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    async fn decide(&self, request: &ReasoningRequest) -> Result<Decision> {
        self.requests.lock().unwrap().push(request.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(next) => next,
            None => Ok(self.fallback.clone()),
        }
    }
}

/// Engine that never answers in time
pub struct StalledEngine;

#[async_trait]
impl ReasoningEngine for StalledEngine {
    async fn decide(&self, _request: &ReasoningRequest) -> Result<Decision> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(AgentError::EngineFailure("unreachable".into()))
    }
}

pub type CallLog = Arc<Mutex<Vec<(String, ToolArgs)>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub enum Behavior {
    Reply(ToolOutput),
    Fail(ToolError),
    Panic,
    Hang,
}

/// Tool with a scripted behavior that records each execution
pub struct FakeTool {
    pub name: &'static str,
    pub schema: InputSchema,
    pub behavior: Behavior,
    pub log: CallLog,
}

impl FakeTool {
    pub fn replying(name: &'static str, output: impl Into<ToolOutput>, log: &CallLog) -> Arc<dyn Tool> {
        Arc::new(Self {
            name,
            schema: InputSchema::empty(),
            behavior: Behavior::Reply(output.into()),
            log: Arc::clone(log),
        })
    }

    pub fn failing(name: &'static str, error: ToolError, log: &CallLog) -> Arc<dyn Tool> {
        Arc::new(Self {
            name,
            schema: InputSchema::empty(),
            behavior: Behavior::Fail(error),
            log: Arc::clone(log),
        })
    }

    pub fn with_behavior(
        name: &'static str,
        schema: InputSchema,
        behavior: Behavior,
        log: &CallLog,
    ) -> Arc<dyn Tool> {
        Arc::new(Self {
            name,
            schema,
            behavior,
            log: Arc::clone(log),
        })
    }
}

#[async_trait]
impl Tool for FakeTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name, format!("Fake {} tool", self.name), self.schema.clone())
    }

    async fn execute(&self, args: &ToolArgs) -> std::result::Result<ToolOutput, ToolError> {
        self.log
            .lock()
            .unwrap()
            .push((self.name.to_string(), args.clone()));
        match &self.behavior {
            Behavior::Reply(output) => Ok(output.clone()),
            Behavior::Fail(error) => Err(error.clone()),
            Behavior::Panic => panic!("{} exploded", self.name),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ToolOutput::from("late"))
            }
        }
    }
}

pub struct ListProvider {
    pub name: &'static str,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl ToolProvider for ListProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }
}

pub fn provider(name: &'static str, tools: Vec<Arc<dyn Tool>>) -> Arc<dyn ToolProvider> {
    Arc::new(ListProvider { name, tools })
}

pub fn address_schema() -> InputSchema {
    InputSchema::empty().param(ParameterSchema::required(
        "address",
        ParamType::String,
        "Wallet address",
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Action(usize, String),
    Output(String),
    Failure(String, &'static str),
}

/// Observer that records the callbacks it receives, in order
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl Observer for RecordingObserver {
    fn on_action(&self, iteration: usize, action: &Action) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Action(iteration, action.tool.clone()));
    }

    fn on_observation(&self, _action: &Action, output: &ToolOutput) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Output(output.to_string()));
    }

    fn on_failure(&self, action: &Action, observation: &Observation) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Failure(action.tool.clone(), observation.kind()));
    }
}
