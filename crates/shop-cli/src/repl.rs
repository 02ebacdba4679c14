//! Interactive shopping REPL

use std::fmt::Write as _;
use std::path::PathBuf;

use agent_core::{Action, Observation, Observer, SessionEvent, SessionLoop, ToolOutput, ToolSpec};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

const PROMPT: &str = "You: ";
const FAREWELL: &str = "👋 Have a great day!";

/// Prints tool activity as it happens
pub struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn on_action(&self, _iteration: usize, action: &Action) {
        println!("\n🛠️  Using tool: {}", action.tool);
        println!("With input: {}", action.input);
    }

    fn on_observation(&self, _action: &Action, output: &ToolOutput) {
        println!("Tool output: {output}");
    }

    fn on_failure(&self, _action: &Action, observation: &Observation) {
        eprintln!("\n⚠️  Tool Error: {observation}");
    }
}

pub struct Repl {
    session: SessionLoop,
    history_path: Option<PathBuf>,
}

impl Repl {
    pub fn new(session: SessionLoop) -> Self {
        let history_path = dirs::data_dir().map(|p| p.join("shop-cli").join("history.txt"));
        Self {
            session,
            history_path,
        }
    }

    fn print_welcome(&self) {
        println!("👋 Hey, there!");
        println!("🛍️  I can help you buy products from around the world.");
        println!("💡 Type 'tools' to see what I can do, 'exit' to end our conversation.\n");
        tracing::debug!(session = %self.session.session().id, "Session started");
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.trim());
                    }

                    let event = self.session.handle(&line, &ConsoleObserver).await;
                    if let Some(text) = render(&event) {
                        println!("{text}");
                    }
                    if self.session.is_ended() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C clears the line
                    println!("^C");
                }
                Err(ReadlineError::Eof) => {
                    println!("{FAREWELL}");
                    break;
                }
                Err(e) => {
                    tracing::error!("Readline error: {e}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = rl.save_history(path);
        }

        tracing::info!(turns = self.session.turns(), "Session ended");
        Ok(())
    }
}

fn render_tools(specs: &[ToolSpec]) -> String {
    let mut out = String::from("\n🔧 Available Tools:\n");
    for spec in specs {
        let _ = writeln!(out, "- {}: {}", spec.name, spec.description);
    }
    out
}

/// Console text for a session event, if any
pub fn render(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Tools(specs) => Some(render_tools(specs)),
        SessionEvent::Exit => Some(FAREWELL.to_string()),
        SessionEvent::Ignored => None,
        SessionEvent::Answer(text) => Some(format!("\n🤖 Agent: {text}\n")),
        SessionEvent::Failed(failure) => Some(format!("\n❌ {}\n", failure.notice())),
    }
}
