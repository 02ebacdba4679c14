//! Session Management
//!
//! Turn-taking around the agent loop. A [`SessionLoop`] owns the session's
//! conversation history and is its only writer: one utterance is resolved
//! completely before the next is accepted, and only answered turns are
//! recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{Agent, AgentOutcome};
use crate::error::AgentError;
use crate::message::Conversation;
use crate::observer::Observer;
use crate::scratchpad::Scratchpad;
use crate::tool::ToolSpec;

/// Identifies one REPL session in logs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub conversation: Conversation,
    pub started_at: DateTime<Utc>,
    /// When the last answered turn was recorded
    pub last_answer_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: SessionId::random(),
            conversation: Conversation::new(),
            started_at: Utc::now(),
            last_answer_at: None,
        }
    }

    fn record(&mut self, utterance: &str, answer: &str) {
        self.conversation.record_turn(utterance, answer);
        self.last_answer_at = Some(Utc::now());
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// How a line of input is interpreted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCommand<'a> {
    /// `tools`: enumerate the registry
    ListTools,
    /// `exit`: end the session
    Exit,
    /// Blank input
    Empty,
    /// Anything else goes to the agent
    Utterance(&'a str),
}

impl<'a> SessionCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Empty
        } else if line.eq_ignore_ascii_case("tools") {
            Self::ListTools
        } else if line.eq_ignore_ascii_case("exit") {
            Self::Exit
        } else {
            Self::Utterance(line)
        }
    }
}

/// A turn that ended without an answer
#[derive(Debug)]
pub enum TurnFailure {
    /// The iteration budget ran out
    Exhausted {
        iterations: usize,
        scratchpad: Scratchpad,
    },
    /// The reasoning engine failed
    Faulted(AgentError),
}

impl TurnFailure {
    /// Whether sending the same utterance again may succeed
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Exhausted { .. } => false,
            Self::Faulted(err) => err.is_retryable(),
        }
    }

    /// Labeled, user-facing description
    pub fn notice(&self) -> String {
        let message = match self {
            Self::Exhausted { iterations, .. } => {
                AgentError::IterationsExhausted(*iterations).user_message()
            }
            Self::Faulted(err) => err.user_message(),
        };
        if self.is_retryable() {
            format!("Request failed: {message} Please send your message again in a moment.")
        } else {
            format!("Request failed: {message}")
        }
    }
}

impl std::fmt::Display for TurnFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted { iterations, .. } => {
                write!(f, "{}", AgentError::IterationsExhausted(*iterations))
            }
            Self::Faulted(err) => write!(f, "{err}"),
        }
    }
}

/// What the session did with one line of input
#[derive(Debug)]
pub enum SessionEvent {
    /// The tool catalog, in registry order
    Tools(Vec<ToolSpec>),
    /// The session is over
    Exit,
    /// Nothing to do
    Ignored,
    /// The agent answered; the turn was recorded
    Answer(String),
    /// The turn failed; nothing was recorded
    Failed(TurnFailure),
}

/// Session loop contract around an [`Agent`]
pub struct SessionLoop {
    agent: Agent,
    session: Session,
    ended: bool,
}

impl SessionLoop {
    pub fn new(agent: Agent) -> Self {
        Self::with_session(agent, Session::new())
    }

    pub const fn with_session(agent: Agent, session: Session) -> Self {
        Self {
            agent,
            session,
            ended: false,
        }
    }

    /// Handle one line of input.
    ///
    /// Per-turn failures are returned as [`SessionEvent::Failed`]; nothing
    /// here ends the session except `exit`.
    pub async fn handle(&mut self, line: &str, observer: &dyn Observer) -> SessionEvent {
        if self.ended {
            return SessionEvent::Exit;
        }

        let utterance = match SessionCommand::parse(line) {
            SessionCommand::Empty => return SessionEvent::Ignored,
            SessionCommand::ListTools => return SessionEvent::Tools(self.agent.tools().specs()),
            SessionCommand::Exit => {
                tracing::info!(session = %self.session.id, turns = self.turns(), "Session ended");
                self.ended = true;
                return SessionEvent::Exit;
            }
            SessionCommand::Utterance(text) => text,
        };

        let outcome = self
            .agent
            .run(utterance, self.session.conversation.messages(), observer)
            .await;

        match outcome {
            AgentOutcome::FinalAnswer(answer) => {
                self.session.record(utterance, &answer);
                tracing::info!(session = %self.session.id, "Turn answered");
                SessionEvent::Answer(answer)
            }
            AgentOutcome::Exhausted(scratchpad) => {
                tracing::warn!(session = %self.session.id, actions = scratchpad.len(), "Turn exhausted");
                SessionEvent::Failed(TurnFailure::Exhausted {
                    iterations: scratchpad.len(),
                    scratchpad,
                })
            }
            AgentOutcome::Faulted(err) => {
                tracing::warn!(
                    session = %self.session.id,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Turn faulted"
                );
                SessionEvent::Failed(TurnFailure::Faulted(err))
            }
        }
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub const fn history(&self) -> &Conversation {
        &self.session.conversation
    }

    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    pub const fn is_ended(&self) -> bool {
        self.ended
    }

    /// Number of answered turns
    pub fn turns(&self) -> usize {
        self.session.conversation.turns()
    }
}
