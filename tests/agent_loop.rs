//! Integration tests for the agent loop.
//!
//! A scripted completion client stands in for the endpoint; the built-in
//! tools run for real against a temporary workspace.

use async_trait::async_trait;
use dind_agent::prelude::*;
use dind_agent::search::SearchHit;
use dind_agent::tools::schema::ArgumentSchema;
use dind_agent::tools::{ToolErrorCode, ToolExecutionFuture, ToolExecutor, ToolOutput, ToolSpec};
use futures::StreamExt;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

/// Replays queued responses, then falls back to `fallback` for every request.
#[derive(Debug)]
struct ScriptedClient {
    script: Mutex<VecDeque<Result<Completion, LLMError>>>,
    fallback: Option<Completion>,
    requests: Mutex<Vec<Vec<Message>>>,
    delay: Option<Duration>,
}

impl ScriptedClient {
    fn new(script: Vec<Result<Completion, LLMError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    fn always(completion: Completion) -> Self {
        Self {
            fallback: Some(completion),
            ..Self::new(Vec::new())
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(Vec::new())
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, index: usize) -> Vec<Message> {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[dind_agent::messages::ToolDefinition],
    ) -> Result<Completion, LLMError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => Ok(self
                .fallback
                .clone()
                .unwrap_or_else(|| Completion::text("done"))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

#[derive(Debug)]
struct NoSearch;

#[async_trait]
impl SearchProvider for NoSearch {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchHit>, ToolError> {
        Ok(Vec::new())
    }
}

/// Counts its executions.
#[derive(Debug, Default)]
struct CounterTool {
    runs: Arc<AtomicUsize>,
}

impl ToolExecutor for CounterTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("counter", "Counts calls", ArgumentSchema::new())
    }

    fn execute(&self, _args: Value) -> ToolExecutionFuture {
        let runs = Arc::clone(&self.runs);
        Box::pin(async move {
            let n = runs.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ToolOutput::text(n.to_string()))
        })
    }
}

fn builtin_agent(client: Arc<ScriptedClient>, dir: &TempDir, max_turns: u32) -> Agent {
    let shim = ExecutionShim::new(ShimConfig::new(dir.path()).with_shell("sh"));
    let registry = builtin_registry(Arc::new(shim), Arc::new(NoSearch));
    let config = AgentConfig::new(dir.path()).with_max_turns(max_turns).with_retry(
        dind_agent::llm::RetryConfig::new(2).with_initial_backoff(Duration::from_millis(1)),
    );
    Agent::new(client, Arc::new(registry), config)
}

fn shell(id: &str, command: &str) -> ToolCall {
    ToolCall::new(id, "run_shell", json!({ "command": command }))
}

fn tool_results(outcome: &SessionOutcome) -> Vec<ToolResult> {
    outcome
        .transcript
        .messages()
        .iter()
        .filter_map(|msg| match msg {
            Message::ToolResult(result) => Some(result.clone()),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Loop properties
// =============================================================================

#[tokio::test]
async fn every_tool_call_gets_exactly_one_result() {
    for batch in 0..5 {
        let dir = TempDir::new().unwrap();
        let calls: Vec<ToolCall> = (0..batch)
            .map(|i| shell(&format!("call_{i}"), &format!("echo {i}")))
            .collect();
        let client = Arc::new(ScriptedClient::new(vec![Ok(Completion::with_tool_calls(
            "",
            calls,
        ))]));
        let agent = builtin_agent(Arc::clone(&client), &dir, 10);

        let outcome = agent.run("echo some numbers").await;

        assert!(outcome.is_done(), "batch {batch}: {:?}", outcome.status);
        assert_eq!(outcome.transcript.tool_call_count(), batch);
        assert_eq!(outcome.transcript.tool_result_count(), batch);
        assert!(outcome.transcript.pending_calls().is_empty());
    }
}

#[tokio::test]
async fn batched_calls_run_in_emitted_order() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![Ok(Completion::with_tool_calls(
        "",
        vec![
            shell("a", "echo first >> order.txt"),
            shell("b", "echo second >> order.txt"),
            shell("c", "echo third >> order.txt"),
        ],
    ))]));
    let agent = builtin_agent(client, &dir, 5);

    let outcome = agent.run("append lines").await;

    assert!(outcome.is_done());
    let ids: Vec<String> = tool_results(&outcome).into_iter().map(|r| r.call_id).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    let written = std::fs::read_to_string(dir.path().join("order.txt")).unwrap();
    assert_eq!(written, "first\nsecond\nthird\n");
}

#[tokio::test]
async fn final_answer_without_tools_takes_one_round_trip() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![Ok(Completion::text(
        "Nothing to do.",
    ))]));
    let agent = builtin_agent(Arc::clone(&client), &dir, 40);

    let outcome = agent.run("say hi").await;

    assert_eq!(outcome.state(), LoopState::Done);
    assert_eq!(outcome.answer(), Some("Nothing to do."));
    assert_eq!(outcome.turns, 1);
    assert_eq!(client.request_count(), 1);
    assert_eq!(outcome.transcript.tool_call_count(), 0);
}

#[tokio::test]
async fn budget_allows_exactly_n_round_trips() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::always(Completion::with_tool_calls(
        "still working",
        vec![shell("", "true")],
    )));
    let agent = builtin_agent(Arc::clone(&client), &dir, 3);

    let outcome = agent.run("never finish").await;

    assert_eq!(client.request_count(), 3);
    assert_eq!(outcome.turns, 3);
    let reason = outcome.failure().expect("session should fail");
    assert_eq!(*reason, FailureReason::BudgetExceeded { turns: 3 });
    assert!(reason.is_soft_stop());
    // The last batch was still answered.
    assert_eq!(outcome.transcript.tool_call_count(), 3);
    assert_eq!(outcome.transcript.tool_result_count(), 3);
    assert!(outcome.transcript.pending_calls().is_empty());
}

#[tokio::test]
async fn unknown_tool_is_reported_and_nothing_runs() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CounterTool {
        runs: Arc::clone(&runs),
    }));
    let client = Arc::new(ScriptedClient::new(vec![Ok(Completion::with_tool_calls(
        "",
        vec![ToolCall::new("x", "countr", json!({}))],
    ))]));
    let agent = Agent::new(
        client.clone(),
        Arc::new(registry),
        AgentConfig::new("/workdir"),
    );

    let outcome = agent.run("count once").await;

    assert!(outcome.is_done());
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    let results = tool_results(&outcome);
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].status,
        ToolStatus::Error {
            code: ToolErrorCode::UnknownTool
        }
    );
    assert!(results[0].output.contains("counter"));
}

#[tokio::test]
async fn tool_errors_are_fed_back_to_the_model() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(Completion::with_tool_calls(
            "",
            vec![ToolCall::new("bad", "read_file", json!({ "file": "x" }))],
        )),
        Ok(Completion::text("fixed it")),
    ]));
    let agent = builtin_agent(Arc::clone(&client), &dir, 5);

    let outcome = agent.run("read something").await;

    assert!(outcome.is_done());
    let second = client.request(1);
    let Some(Message::ToolResult(result)) = second.last() else {
        panic!("expected a tool result before the second request");
    };
    assert_eq!(result.call_id, "bad");
    assert_eq!(
        result.status,
        ToolStatus::Error {
            code: ToolErrorCode::InvalidArguments
        }
    );
}

#[tokio::test]
async fn nonzero_exit_is_a_result_not_a_failure() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![Ok(Completion::with_tool_calls(
        "",
        vec![shell("c1", "echo oops >&2; exit 3")],
    ))]));
    let agent = builtin_agent(client, &dir, 5);

    let outcome = agent.run("fail a command").await;

    assert!(outcome.is_done());
    let results = tool_results(&outcome);
    assert_eq!(results[0].status, ToolStatus::Failed { exit_code: 3 });
    assert!(results[0].output.contains("oops"));
}

#[tokio::test]
async fn shell_timeout_is_reported_promptly() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![Ok(Completion::with_tool_calls(
        "",
        vec![ToolCall::new(
            "slow",
            "run_shell",
            json!({ "command": "sleep 30", "timeout_secs": 1 }),
        )],
    ))]));
    let agent = builtin_agent(client, &dir, 5);

    let started = Instant::now();
    let outcome = agent.run("wait forever").await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(outcome.is_done());
    assert_eq!(
        tool_results(&outcome)[0].status,
        ToolStatus::Error {
            code: ToolErrorCode::Timeout
        }
    );
}

#[tokio::test]
async fn written_file_reads_back_identically() {
    let dir = TempDir::new().unwrap();
    let content = "line one\n\tindented ünïcode\nno trailing newline";
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(Completion::with_tool_calls(
            "",
            vec![ToolCall::new(
                "w",
                "write_file",
                json!({ "path": "notes/out.txt", "content": content }),
            )],
        )),
        Ok(Completion::with_tool_calls(
            "",
            vec![ToolCall::new("r", "read_file", json!({ "path": "notes/out.txt" }))],
        )),
    ]));
    let agent = builtin_agent(client, &dir, 5);

    let outcome = agent.run("write and read").await;

    assert!(outcome.is_done());
    let results = tool_results(&outcome);
    assert!(results[0].status.is_success());
    assert_eq!(results[1].output, content);
}

// =============================================================================
// Endpoint errors
// =============================================================================

#[tokio::test]
async fn transient_endpoint_errors_are_retried() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![
        Err(LLMError::transport("connection reset")),
        Ok(Completion::text("recovered")),
    ]));
    let agent = builtin_agent(Arc::clone(&client), &dir, 5);

    let outcome = agent.run("anything").await;

    assert_eq!(outcome.answer(), Some("recovered"));
    assert_eq!(outcome.turns, 1);
    assert_eq!(client.request_count(), 2);
}

#[tokio::test]
async fn fatal_endpoint_error_fails_the_session() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![Err(
        LLMError::unauthorized("invalid key"),
    )]));
    let agent = builtin_agent(Arc::clone(&client), &dir, 5);

    let outcome = agent.run("anything").await;

    assert_eq!(client.request_count(), 1);
    match outcome.failure() {
        Some(FailureReason::Endpoint(error)) => assert!(!error.is_retriable()),
        other => panic!("expected endpoint failure, got {other:?}"),
    }
    assert!(!outcome.failure().unwrap().is_soft_stop());
}

// =============================================================================
// Streaming sessions
// =============================================================================

#[tokio::test]
async fn session_stream_reports_progress_in_order() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(Completion::with_tool_calls(
            "Let me look.",
            vec![shell("c1", "echo hi")],
        )),
        Ok(Completion::text("All done.")),
    ]));
    let agent = builtin_agent(client, &dir, 5);

    let events: Vec<SessionEvent> = agent.start_session("look around").collect().await;

    assert!(matches!(events[0], SessionEvent::TurnStarted { turn: 1 }));
    assert!(matches!(
        &events[1],
        SessionEvent::AssistantText { turn: 1, text } if text == "Let me look."
    ));
    assert!(matches!(&events[2], SessionEvent::ToolCallStarted(call) if call.id == "c1"));
    assert!(matches!(
        &events[3],
        SessionEvent::ToolCallFinished(result) if result.output.contains("hi")
    ));
    assert!(matches!(events[4], SessionEvent::TurnStarted { turn: 2 }));
    let Some(SessionEvent::Finished(outcome)) = events.last() else {
        panic!("stream must end with Finished");
    };
    assert_eq!(outcome.answer(), Some("All done."));
}

#[tokio::test]
async fn cancel_stops_before_next_round_trip() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::slow(Duration::from_secs(30)));
    let agent = builtin_agent(Arc::clone(&client), &dir, 5);

    let handle = agent.start_session("hang");
    let canceller = handle.canceller();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle.outcome())
        .await
        .expect("cancellation should end the session")
        .expect("session should report an outcome");

    assert_eq!(outcome.failure(), Some(&FailureReason::Cancelled));
    assert_eq!(outcome.state(), LoopState::Failed);
    assert!(client.request_count() <= 1);
}

#[tokio::test]
async fn transcript_starts_with_system_prompt_and_goal() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![Ok(Completion::text("ok"))]));
    let agent = builtin_agent(Arc::clone(&client), &dir, 5);

    agent.run("inspect the workspace").await;

    let first = client.request(0);
    let Message::System { content } = &first[0] else {
        panic!("first message must be the system prompt");
    };
    assert!(content.contains(&dir.path().display().to_string()));
    assert!(content.contains("### run_shell"));
    assert_eq!(first[1], Message::user("inspect the workspace"));
}
