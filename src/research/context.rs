//! Per-run context handed to capability units.

use crate::research::state::{SessionHandle, SharedState, StateStore};
use crate::types::SessionScope;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Hierarchical, dot-separated label identifying which task produced an event.
///
/// Paths are values: [`child`](Self::child) returns a new path and never
/// modifies the parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchPath(String);

impl BranchPath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// `parent.segment`, or just `segment` under the root.
    pub fn child(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self(segment.to_string())
        } else {
            Self(format!("{}.{}", self.0, segment))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// Last segment, if any.
    pub fn leaf(&self) -> Option<&str> {
        self.segments().last()
    }

    /// True if `self` is `other` or lies underneath it.
    pub fn starts_with(&self, other: &BranchPath) -> bool {
        other.is_root()
            || self.0 == other.0
            || (self.0.starts_with(&other.0) && self.0[other.0.len()..].starts_with('.'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a unit needs for one run: where it sits in the branch tree,
/// how to notice cancellation and where to write its artifact.
#[derive(Clone)]
pub struct RunContext {
    invocation_id: Uuid,
    branch: BranchPath,
    user_content: Arc<str>,
    cancellation: CancellationToken,
    state: SharedState,
    session: Option<SessionHandle>,
}

impl RunContext {
    pub fn new(state: SharedState) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            branch: BranchPath::root(),
            user_content: Arc::from(""),
            cancellation: CancellationToken::new(),
            state,
            session: None,
        }
    }

    pub fn with_branch(mut self, branch: BranchPath) -> Self {
        self.branch = branch;
        self
    }

    pub fn with_user_content(mut self, text: impl Into<Arc<str>>) -> Self {
        self.user_content = text.into();
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Attach the durable session the Shared State is persisted to.
    pub fn with_session(mut self, scope: SessionScope, store: Arc<dyn StateStore>) -> Self {
        self.session = Some(SessionHandle::new(scope, store));
        self
    }

    /// Context for a sub-task: branch extended by `segment`, cancellation
    /// chained to this context, same state and session.
    pub fn child(&self, segment: &str) -> Self {
        Self {
            invocation_id: self.invocation_id,
            branch: self.branch.child(segment),
            user_content: Arc::clone(&self.user_content),
            cancellation: self.cancellation.child_token(),
            state: self.state.clone(),
            session: self.session.clone(),
        }
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn branch(&self) -> &BranchPath {
        &self.branch
    }

    /// The user's query text
    pub fn user_content(&self) -> &str {
        &self.user_content
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("invocation_id", &self.invocation_id)
            .field("branch", &self.branch)
            .field("cancelled", &self.is_cancelled())
            .field("session", &self.session.as_ref().map(|s| s.scope()))
            .finish()
    }
}
