mod common;

use std::sync::Arc;

use agent_core::{
    AgentBuilder, AgentError, Decision, NoopObserver, Role, SessionEvent, SessionLoop, ToolError,
    ToolRegistry, TurnFailure,
};
use common::{Event, FakeTool, RecordingObserver, ScriptedEngine, call_log, provider};
use serde_json::json;

#[tokio::test]
async fn test_balance_question_end_to_end() {
    let log = call_log();
    let engine = ScriptedEngine::new(
        vec![Ok(Decision::action("get_balance", json!({})))],
        Decision::final_answer("You have 100 USDC"),
    );
    let tools = ToolRegistry::from_providers(&[provider(
        "wallet",
        vec![FakeTool::replying("get_balance", "100 USDC", &log)],
    )])
    .unwrap();
    let agent = AgentBuilder::new()
        .engine(engine.clone())
        .tools(Arc::new(tools))
        .build()
        .unwrap();
    let mut session = SessionLoop::new(agent);
    let observer = RecordingObserver::default();

    let event = session.handle("What's my balance?", &observer).await;

    assert!(matches!(event, SessionEvent::Answer(ref text) if text == "You have 100 USDC"));
    let history = session.history().messages();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "What's my balance?");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "You have 100 USDC");
    assert_eq!(
        observer.events(),
        vec![
            Event::Action(1, "get_balance".into()),
            Event::Output("100 USDC".into()),
        ]
    );
    assert_eq!(engine.calls(), 2);
}

#[tokio::test]
async fn test_exhausted_turn_is_reported_and_not_recorded() {
    let log = call_log();
    let engine = ScriptedEngine::repeating(Decision::action("create_order", json!({})));
    let tools = ToolRegistry::from_providers(&[provider(
        "checkout",
        vec![FakeTool::failing(
            "create_order",
            ToolError::new("network", "network down"),
            &log,
        )],
    )])
    .unwrap();
    let agent = AgentBuilder::new()
        .engine(engine)
        .tools(Arc::new(tools))
        .max_iterations(10)
        .build()
        .unwrap();
    let mut session = SessionLoop::new(agent);

    let event = session.handle("buy it", &NoopObserver).await;

    let SessionEvent::Failed(failure) = event else {
        panic!("expected a failed turn");
    };
    assert!(matches!(failure, TurnFailure::Exhausted { iterations: 10, .. }));
    assert!(failure.notice().starts_with("Request failed:"));
    assert_eq!(log.lock().unwrap().len(), 10);
    assert!(session.history().is_empty());
    assert!(!session.is_ended());

    // the session keeps accepting input
    let next = session.handle("tools", &NoopObserver).await;
    assert!(matches!(next, SessionEvent::Tools(ref specs) if specs.len() == 1));
}

#[tokio::test]
async fn test_faulted_turn_is_not_recorded() {
    let engine = ScriptedEngine::new(
        vec![Err(AgentError::Provider("503".into()))],
        Decision::final_answer("second try works"),
    );
    let agent = AgentBuilder::new().engine(engine).build().unwrap();
    let mut session = SessionLoop::new(agent);

    let first = session.handle("hello", &NoopObserver).await;
    assert!(matches!(first, SessionEvent::Failed(TurnFailure::Faulted(_))));
    assert!(session.history().is_empty());

    let second = session.handle("hello again", &NoopObserver).await;
    assert!(matches!(second, SessionEvent::Answer(_)));
    assert_eq!(session.turns(), 1);
    assert_eq!(session.history().messages()[0].content, "hello again");
}

#[tokio::test]
async fn test_commands_bypass_agent() {
    let log = call_log();
    let engine = ScriptedEngine::repeating(Decision::final_answer("unused"));
    let tools = ToolRegistry::from_providers(&[
        provider("wallet", vec![FakeTool::replying("get_address", "0x1", &log)]),
        provider("checkout", vec![FakeTool::replying("create_order", "ok", &log)]),
    ])
    .unwrap();
    let agent = AgentBuilder::new()
        .engine(engine.clone())
        .tools(Arc::new(tools))
        .build()
        .unwrap();
    let mut session = SessionLoop::new(agent);

    let SessionEvent::Tools(specs) = session.handle("Tools", &NoopObserver).await else {
        panic!("expected tool listing");
    };
    let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["get_address", "create_order"]);

    assert!(matches!(session.handle("  ", &NoopObserver).await, SessionEvent::Ignored));
    assert!(matches!(session.handle("EXIT", &NoopObserver).await, SessionEvent::Exit));
    assert!(session.is_ended());
    assert!(matches!(session.handle("hi", &NoopObserver).await, SessionEvent::Exit));

    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_history_carries_into_later_turns() {
    let engine = ScriptedEngine::new(
        vec![
            Ok(Decision::final_answer("What is your email?")),
            Ok(Decision::final_answer("Thanks")),
        ],
        Decision::final_answer("unused"),
    );
    let agent = AgentBuilder::new().engine(engine.clone()).build().unwrap();
    let mut session = SessionLoop::new(agent);

    session.handle("buy amazon:B08SVZ775L", &NoopObserver).await;
    session.handle("me@example.com", &NoopObserver).await;

    let requests = engine.requests.lock().unwrap();
    assert!(requests[0].history.is_empty());
    assert_eq!(requests[1].history.len(), 2);
    assert_eq!(requests[1].history[1].content, "What is your email?");
    assert_eq!(session.history().len(), 4);
}

#[test]
fn test_duplicate_transfer_blocks_startup() {
    let log = call_log();
    let result = ToolRegistry::from_providers(&[
        provider("erc20", vec![FakeTool::replying("transfer", "ok", &log)]),
        provider("native", vec![FakeTool::replying("transfer", "ok", &log)]),
    ]);

    assert!(matches!(result, Err(AgentError::DuplicateToolName(ref n)) if n == "transfer"));
}
