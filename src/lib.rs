//! # advisor-research
//!
//! Selection and concurrent fan-out of research units for a trading advisor.
//!
//! ## Overview
//!
//! A free-text query goes through three stages:
//!
//! 1. **Classify** - [`routing::classify`] turns text into an [`Intent`]
//!    (symbol candidates plus capability and request-shape flags).
//! 2. **Select** - [`routing::select`] maps the intent and the process
//!    [`Toggles`] to an ordered list of [`CapabilityKind`]s.
//! 3. **Run** - [`ParallelRunner::run`] starts every selected unit on its own
//!    task and merges their events into one stream. A failing unit gets a
//!    fallback artifact in [`SharedState`] and never disturbs its siblings.
//!
//! [`ResearchWorkflow`] wires the three together and records the routing
//! decision in Shared State.
//!
//! ## Example
//!
//! ```rust,ignore
//! use advisor_research::{
//!     CapabilityKind, FnUnit, ParallelRunner, RunContext, SharedState, UnitRoster,
//! };
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! let roster = UnitRoster::new().with_unit(Arc::new(FnUnit::new(
//!     CapabilityKind::News,
//!     |ctx| news_stream(ctx),
//! )));
//! let runner = ParallelRunner::new(roster);
//!
//! let ctx = RunContext::new(SharedState::new());
//! let mut events = runner.run(&[CapabilityKind::News], ctx);
//! while let Some(event) = events.next().await {
//!     println!("[{}] {}", event.branch, event.payload);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`routing`] - intent classification and capability selection
//! - [`research`] - units, runner, fallback recording, Shared State
//! - [`llm`] - model seam used by the classification fallback
//! - [`types`] - common types and error handling
//! - [`utils`] - configuration and logging
//! - [`cli`] - the routing inspector binary's argument parsing and output

#![warn(rustdoc::missing_crate_level_docs)]

/// Routing inspector CLI.
pub mod cli;
/// Language-model seam.
pub mod llm;
/// Concurrent research fan-out.
pub mod research;
/// Query classification and capability selection.
pub mod routing;
/// Core types and errors.
pub mod types;
/// Configuration and logging utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::LLMClient;
pub use research::{
    BranchPath, CapabilityKind, CapabilityUnit, Event, EventStream, FallbackRecorder, FnUnit,
    InMemoryStateStore, ParallelRunner, ResearchWorkflow, RunContext, SharedState, StateStore,
    UnitOutcome, UnitRoster, UnitStream,
};
pub use routing::{
    classify, select, ClassificationSource, Intent, LlmIntentClassifier, RoutingDecision,
    RoutingPolicy, Selector, Toggles, WorkflowMode,
};
pub use types::{AppError, Result, SessionScope, StateMap};
pub use utils::toml_config::{ConfigError, ResearchConfig};
