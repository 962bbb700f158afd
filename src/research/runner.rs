//! Fan-out/fan-in runner.
//!
//! Every selected unit gets its own Tokio task (a *lane*) that pumps the
//! unit's stream into a bounded channel. The caller sees a single stream
//! that races all lanes and yields whichever event is ready first.
//!
//! # Guarantees
//!
//! - Events from one unit keep their relative order; interleaving across
//!   units follows completion time and is otherwise unspecified.
//! - A unit that returns an error or panics is isolated: its lane records a
//!   fallback artifact and ends. Siblings and the merged stream are unaffected.
//! - Cancelling the run context stops the merge and every lane. Dropping the
//!   merged stream cancels every lane's context and aborts lanes that are
//!   still running.
//! - When the merged stream ends normally, every lane has finished and every
//!   fallback has been written.

use crate::research::capability::{CapabilityKind, CapabilityUnit, UnitRoster};
use crate::research::context::RunContext;
use crate::research::event::Event;
use crate::research::fallback::FallbackRecorder;
use crate::utils::toml_config::RunnerConfig;
use futures::stream::{self, BoxStream, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_stream::wrappers::ReceiverStream;

/// Merged events of one run.
pub type EventStream = BoxStream<'static, Event>;

/// How a lane ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The unit's stream was exhausted.
    Completed,
    /// The unit failed and its fallback artifact was written.
    FallbackRecorded,
    /// The run was cancelled or the consumer went away.
    Cancelled,
}

/// Runs selected units concurrently and merges their events.
#[derive(Debug, Clone)]
pub struct ParallelRunner {
    roster: UnitRoster,
    recorder: FallbackRecorder,
    lane_capacity: usize,
}

impl ParallelRunner {
    pub fn new(roster: UnitRoster) -> Self {
        Self {
            roster,
            recorder: FallbackRecorder::default(),
            lane_capacity: 1,
        }
    }

    pub fn from_config(roster: UnitRoster, config: &RunnerConfig) -> Self {
        Self::new(roster)
            .with_recorder(FallbackRecorder::new(config.fallback_sentinel.as_str()))
            .with_lane_capacity(config.lane_capacity)
    }

    pub fn with_recorder(mut self, recorder: FallbackRecorder) -> Self {
        self.recorder = recorder;
        self
    }

    /// Events buffered per lane before the unit is made to wait. Clamped to 1.
    pub fn with_lane_capacity(mut self, capacity: usize) -> Self {
        self.lane_capacity = capacity.max(1);
        self
    }

    pub fn roster(&self) -> &UnitRoster {
        &self.roster
    }

    /// Start every unit in `kinds` and return their merged events.
    ///
    /// Repeated kinds run once and kinds missing from the roster are skipped.
    /// Lanes are spawned immediately, so this must be called from within a
    /// Tokio runtime. An empty selection spawns nothing and returns an
    /// already finished stream.
    pub fn run(&self, kinds: &[CapabilityKind], ctx: RunContext) -> EventStream {
        let units = self.roster.resolve(kinds);
        if units.is_empty() {
            tracing::debug!(branch = %ctx.branch(), "No units to run");
            return stream::empty().boxed();
        }

        // Lanes hang off a run-scoped token so the consumer can cancel them
        // without touching the caller's context.
        let run_token = ctx.cancellation().child_token();
        let run_ctx = ctx.clone().with_cancellation(run_token.clone());

        let mut lanes = JoinSet::new();
        let mut receivers = Vec::with_capacity(units.len());
        for unit in units {
            let (tx, rx) = mpsc::channel(self.lane_capacity);
            let lane_ctx = run_ctx.child(unit.name());
            tracing::debug!(unit = unit.name(), branch = %lane_ctx.branch(), "Dispatching unit");
            lanes.spawn(drive_lane(unit, lane_ctx, self.recorder.clone(), tx));
            receivers.push(ReceiverStream::new(rx));
        }

        let dispatched = receivers.len();
        let cancel = run_token.clone();
        let release = run_token.drop_guard();
        let invocation_id = ctx.invocation_id();

        let merged = async_stream::stream! {
            // Dropping the stream cancels every lane context and aborts the lanes.
            let _release = release;
            let mut lanes = lanes;
            let mut ready = stream::select_all(receivers);
            let mut emitted = 0usize;

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = ready.next() => next,
                };
                match next {
                    Some(event) => {
                        emitted += 1;
                        yield event;
                    }
                    None => break,
                }
            }
            drop(ready);

            let mut completed = 0usize;
            let mut fallbacks = 0usize;
            let mut cancelled = 0usize;
            while let Some(joined) = lanes.join_next().await {
                match joined {
                    Ok((_, UnitOutcome::Completed)) => completed += 1,
                    Ok((_, UnitOutcome::FallbackRecorded)) => fallbacks += 1,
                    Ok((_, UnitOutcome::Cancelled)) => cancelled += 1,
                    Err(e) => tracing::warn!(error = %e, "Research lane did not finish cleanly"),
                }
            }

            tracing::info!(
                %invocation_id,
                dispatched,
                emitted,
                completed,
                fallbacks,
                cancelled,
                "Research fan-out finished"
            );
        };

        merged.boxed()
    }
}

/// Pump one unit into its lane channel and settle its outcome.
///
/// `tx` is dropped only when this returns, after any fallback is written.
async fn drive_lane(
    unit: Arc<dyn CapabilityUnit>,
    ctx: RunContext,
    recorder: FallbackRecorder,
    tx: mpsc::Sender<Event>,
) -> (CapabilityKind, UnitOutcome) {
    let kind = unit.kind();
    let name = unit.name();
    let cancel = ctx.cancellation().clone();
    let mut sent = 0usize;

    let pump = async {
        let mut events = unit.run(ctx.clone());
        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(UnitOutcome::Cancelled),
                item = events.next() => item,
            };
            let payload = match item {
                Some(Ok(payload)) => payload,
                Some(Err(e)) => return Err(e.to_string()),
                None => return Ok(UnitOutcome::Completed),
            };

            let event = Event::new(ctx.invocation_id(), ctx.branch().clone(), name, payload);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(UnitOutcome::Cancelled),
                delivered = tx.send(event) => {
                    if delivered.is_err() {
                        // consumer dropped the merged stream
                        return Ok(UnitOutcome::Cancelled);
                    }
                    sent += 1;
                }
            }
        }
    };

    let settled = AssertUnwindSafe(pump).catch_unwind().await;
    let failure = match settled {
        Ok(Ok(outcome)) => {
            tracing::debug!(unit = name, events = sent, ?outcome, "Unit finished");
            return (kind, outcome);
        }
        Ok(Err(message)) => message,
        Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
    };

    tracing::warn!(
        unit = name,
        branch = %ctx.branch(),
        events = sent,
        error = %failure,
        "Research unit failed, recording fallback"
    );
    recorder.record(unit.state_key(), &ctx).await;
    (kind, UnitOutcome::FallbackRecorded)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
