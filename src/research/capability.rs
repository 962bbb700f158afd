//! Capability units and the roster that maps each kind to its implementation.

use crate::research::context::RunContext;
use crate::types::Result;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stream of payloads produced by one unit run.
///
/// An `Err` item ends the unit; the runner records a fallback artifact for it.
pub type UnitStream = BoxStream<'static, Result<serde_json::Value>>;

/// Every research capability the runner knows about.
///
/// Serializes as the unit name, the same key routing reasons use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityKind {
    #[serde(rename = "signals_research")]
    Signals,
    #[serde(rename = "technical_research")]
    Technical,
    #[serde(rename = "news_research")]
    News,
    #[serde(rename = "knowledge_research")]
    Knowledge,
    #[serde(rename = "memory_research")]
    Memory,
    #[serde(rename = "portfolio_research")]
    Portfolio,
    #[serde(rename = "web_search_research")]
    WebSearch,
    #[serde(rename = "private_search_research")]
    PrivateSearch,
    #[serde(rename = "private_retrieval_research")]
    PrivateRetrieval,
}

impl CapabilityKind {
    /// All kinds in canonical order.
    pub const ALL: [CapabilityKind; 9] = [
        CapabilityKind::Signals,
        CapabilityKind::Technical,
        CapabilityKind::News,
        CapabilityKind::Knowledge,
        CapabilityKind::Memory,
        CapabilityKind::Portfolio,
        CapabilityKind::WebSearch,
        CapabilityKind::PrivateSearch,
        CapabilityKind::PrivateRetrieval,
    ];

    /// Units gathered on every run regardless of intent.
    pub const BASELINE: [CapabilityKind; 6] = [
        CapabilityKind::Signals,
        CapabilityKind::Technical,
        CapabilityKind::News,
        CapabilityKind::Knowledge,
        CapabilityKind::Memory,
        CapabilityKind::Portfolio,
    ];

    /// Stable unit name, also the last segment of the unit's branch path.
    pub fn name(self) -> &'static str {
        match self {
            CapabilityKind::Signals => "signals_research",
            CapabilityKind::Technical => "technical_research",
            CapabilityKind::News => "news_research",
            CapabilityKind::Knowledge => "knowledge_research",
            CapabilityKind::Memory => "memory_research",
            CapabilityKind::Portfolio => "portfolio_research",
            CapabilityKind::WebSearch => "web_search_research",
            CapabilityKind::PrivateSearch => "private_search_research",
            CapabilityKind::PrivateRetrieval => "private_retrieval_research",
        }
    }

    /// Shared State key the unit's artifact is written under.
    pub fn state_key(self) -> &'static str {
        match self {
            CapabilityKind::Signals => "app:research_signals",
            CapabilityKind::Technical => "app:research_technical",
            CapabilityKind::News => "app:research_news",
            CapabilityKind::Knowledge => "app:research_knowledge",
            CapabilityKind::Memory => "app:research_memory",
            CapabilityKind::Portfolio => "app:research_portfolio",
            CapabilityKind::WebSearch => "app:research_web_search",
            CapabilityKind::PrivateSearch => "app:research_private_search",
            CapabilityKind::PrivateRetrieval => "app:research_private_retrieval",
        }
    }

    /// Optional units are only selected when their toggle is on.
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            CapabilityKind::WebSearch
                | CapabilityKind::PrivateSearch
                | CapabilityKind::PrivateRetrieval
        )
    }

    /// Look a kind up by its unit name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An independently executable research task.
///
/// Units are stateless between runs. A unit writes its own artifact into
/// `ctx.state()` under its state key as part of its logic; the runner only
/// writes on its behalf when it fails.
pub trait CapabilityUnit: Send + Sync {
    /// Which capability this unit implements
    fn kind(&self) -> CapabilityKind;

    /// Start a run scoped to `ctx`'s branch.
    fn run(&self, ctx: RunContext) -> UnitStream;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn state_key(&self) -> &'static str {
        self.kind().state_key()
    }
}

/// Adapts a closure into a [`CapabilityUnit`].
pub struct FnUnit<F> {
    kind: CapabilityKind,
    run: F,
}

impl<F> FnUnit<F>
where
    F: Fn(RunContext) -> UnitStream + Send + Sync,
{
    pub fn new(kind: CapabilityKind, run: F) -> Self {
        Self { kind, run }
    }
}

impl<F> CapabilityUnit for FnUnit<F>
where
    F: Fn(RunContext) -> UnitStream + Send + Sync,
{
    fn kind(&self) -> CapabilityKind {
        self.kind
    }

    fn run(&self, ctx: RunContext) -> UnitStream {
        (self.run)(ctx)
    }
}

/// Static table from capability kind to the unit that implements it.
#[derive(Clone, Default)]
pub struct UnitRoster {
    units: HashMap<CapabilityKind, Arc<dyn CapabilityUnit>>,
}

impl UnitRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit under its own kind, replacing any previous one.
    pub fn register(&mut self, unit: Arc<dyn CapabilityUnit>) {
        self.units.insert(unit.kind(), unit);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_unit(mut self, unit: Arc<dyn CapabilityUnit>) -> Self {
        self.register(unit);
        self
    }

    pub fn get(&self, kind: CapabilityKind) -> Option<Arc<dyn CapabilityUnit>> {
        self.units.get(&kind).cloned()
    }

    pub fn contains(&self, kind: CapabilityKind) -> bool {
        self.units.contains_key(&kind)
    }

    /// Registered kinds in canonical order.
    pub fn kinds(&self) -> Vec<CapabilityKind> {
        CapabilityKind::ALL
            .into_iter()
            .filter(|kind| self.units.contains_key(kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Resolve a selection into runnable units.
    ///
    /// Keeps the selection order, drops repeats and drops kinds that have no
    /// registered unit (a selection made against a stale roster).
    pub fn resolve(&self, selection: &[CapabilityKind]) -> Vec<Arc<dyn CapabilityUnit>> {
        let mut seen = Vec::with_capacity(selection.len());
        let mut units = Vec::with_capacity(selection.len());
        for kind in selection {
            if seen.contains(kind) {
                continue;
            }
            seen.push(*kind);
            match self.units.get(kind) {
                Some(unit) => units.push(Arc::clone(unit)),
                None => tracing::debug!(unit = kind.name(), "Skipping unit missing from roster"),
            }
        }
        units
    }
}

impl fmt::Debug for UnitRoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitRoster")
            .field("kinds", &self.kinds())
            .finish()
    }
}
