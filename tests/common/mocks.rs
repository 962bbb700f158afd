//! Mock units, stores and model clients shared by the integration tests.

use advisor_research::llm::LLMClient;
use advisor_research::research::{
    CapabilityKind, CapabilityUnit, RunContext, StateStore, UnitStream,
};
use advisor_research::types::{AppError, Result, SessionScope, StateMap};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One step of a scripted unit.
#[derive(Debug, Clone)]
pub enum Step {
    /// Emit a payload
    Emit(Value),
    /// Sleep before the next step
    Wait(Duration),
    /// End the stream with an error
    Fail(&'static str),
    /// Panic inside the stream
    Panic(&'static str),
    /// Never make progress again
    Hang,
}

/// Unit that replays a fixed script of steps.
///
/// Counts how often it was started so tests can assert on dedupe.
pub struct ScriptedUnit {
    kind: CapabilityKind,
    steps: Vec<Step>,
    /// Write `"ok"` under the unit's state key when the script completes
    write_artifact: bool,
    starts: Arc<AtomicUsize>,
}

impl ScriptedUnit {
    pub fn new(kind: CapabilityKind, steps: Vec<Step>) -> Self {
        Self {
            kind,
            steps,
            write_artifact: false,
            starts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Emit `count` numbered payloads `{"unit": name, "seq": i}`, pausing
    /// `gap` before each one.
    pub fn counting(kind: CapabilityKind, count: usize, gap: Duration) -> Self {
        let steps = (0..count)
            .flat_map(|seq| {
                [
                    Step::Wait(gap),
                    Step::Emit(json!({ "unit": kind.name(), "seq": seq })),
                ]
            })
            .collect();
        Self::new(kind, steps)
    }

    pub fn writing_artifact(mut self) -> Self {
        self.write_artifact = true;
        self
    }

    pub fn start_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.starts)
    }

    pub fn into_arc(self) -> Arc<dyn CapabilityUnit> {
        Arc::new(self)
    }
}

impl CapabilityUnit for ScriptedUnit {
    fn kind(&self) -> CapabilityKind {
        self.kind
    }

    fn run(&self, ctx: RunContext) -> UnitStream {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let steps = self.steps.clone();
        let state_key = self.kind.state_key();
        let write_artifact = self.write_artifact;

        async_stream::stream! {
            for step in steps {
                match step {
                    Step::Emit(payload) => yield Ok(payload),
                    Step::Wait(delay) => tokio::time::sleep(delay).await,
                    Step::Fail(message) => {
                        yield Err(AppError::Unit(message.to_string()));
                        return;
                    }
                    Step::Panic(message) => panic!("{}", message),
                    Step::Hang => futures::future::pending::<()>().await,
                }
            }
            if write_artifact {
                ctx.state().set(state_key, json!("ok"));
            }
        }
        .boxed()
    }
}

/// Unit whose `run` panics before returning a stream.
pub struct PanicOnStartUnit(pub CapabilityKind);

impl CapabilityUnit for PanicOnStartUnit {
    fn kind(&self) -> CapabilityKind {
        self.0
    }

    fn run(&self, _ctx: RunContext) -> UnitStream {
        panic!("{} could not start", self.0.name())
    }
}

/// Unit that yields nothing and ends.
pub fn silent(kind: CapabilityKind) -> Arc<dyn CapabilityUnit> {
    Arc::new(advisor_research::research::FnUnit::new(kind, |_ctx| {
        stream::empty().boxed()
    }))
}

/// State store that records every update, optionally failing them.
#[derive(Default)]
pub struct RecordingStateStore {
    pub updates: Mutex<Vec<StateMap>>,
    fail: bool,
}

impl RecordingStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose reads and writes always fail.
    pub fn failing() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().len()
    }
}

#[async_trait]
impl StateStore for RecordingStateStore {
    async fn get(&self, _scope: &SessionScope) -> Result<Option<StateMap>> {
        if self.fail {
            return Err(AppError::Persistence("store unavailable".to_string()));
        }
        Ok(self.updates.lock().last().cloned())
    }

    async fn update(&self, _scope: &SessionScope, state: StateMap) -> Result<()> {
        if self.fail {
            return Err(AppError::Persistence("store unavailable".to_string()));
        }
        self.updates.lock().push(state);
        Ok(())
    }
}

/// Mock LLM client returning a fixed reply, or failing.
pub struct MockLLMClient {
    reply: Option<String>,
    pub calls: Arc<AtomicUsize>,
}

impl MockLLMClient {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| AppError::LLM("mock failure".to_string()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

pub fn session() -> SessionScope {
    SessionScope::new("advisor", "test_user", "test_session")
}
