//! Concurrent research fan-out.
//!
//! A query is answered by several independent *capability units* (signals,
//! technical analysis, news, ...). This module runs a selected set of them
//! concurrently and hands the caller one merged stream of their events.
//!
//! # Architecture
//!
//! - [`capability`] - unit trait, closed set of capability kinds, roster
//! - [`context`] - per-run context and branch paths
//! - [`runner`] - fan-out/fan-in over per-unit lanes
//! - [`fallback`] - sentinel artifacts for failed units
//! - [`state`] - Shared State and the persistence seam
//! - [`workflow`] - routing plus fan-out as a single call
//!
//! # Usage
//!
//! ```ignore
//! use advisor_research::research::{ParallelRunner, RunContext, SharedState};
//!
//! let runner = ParallelRunner::new(roster);
//! let ctx = RunContext::new(SharedState::new());
//! let mut events = runner.run(&CapabilityKind::BASELINE, ctx);
//! while let Some(event) = events.next().await {
//!     println!("{}: {}", event.branch, event.payload);
//! }
//! ```

pub mod capability;
pub mod context;
pub mod event;
pub mod fallback;
pub mod runner;
pub mod state;
pub mod workflow;

pub use capability::{CapabilityKind, CapabilityUnit, FnUnit, UnitRoster, UnitStream};
pub use context::{BranchPath, RunContext};
pub use event::Event;
pub use fallback::{FallbackRecorder, DEFAULT_FALLBACK_SENTINEL};
pub use runner::{EventStream, ParallelRunner, UnitOutcome};
pub use state::{InMemoryStateStore, SessionHandle, SharedState, StateStore};
pub use workflow::{ResearchWorkflow, ROUTING_STATE_KEY};
