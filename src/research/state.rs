//! Shared State and its persistence seam.
//!
//! [`SharedState`] is the in-memory map research units write their
//! artifacts into. Each key has a single writer per run (the unit, or the
//! fallback recorder on its behalf), so the lock is only held for the
//! duration of a map insert or a snapshot.
//!
//! Durable storage lives behind [`StateStore`]; the host application
//! implements it over its session database. [`InMemoryStateStore`] is
//! provided for tests and single-process use.

use crate::types::{Result, SessionScope, StateMap};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Cloneable handle to the run's state map.
#[derive(Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<StateMap>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a state handle from a previously persisted map.
    pub fn from_map(map: StateMap) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.read().get(key).cloned()
    }

    /// Convenience for string artifacts.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .get(key)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn set(&self, key: impl Into<String>, value: serde_json::Value) {
        self.inner.write().insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Point-in-time copy, used for persistence and by synthesis.
    pub fn snapshot(&self) -> StateMap {
        self.inner.read().clone()
    }
}

impl fmt::Debug for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedState")
            .field("keys", &self.keys())
            .finish()
    }
}

/// Durable storage for session state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state for a session, if any.
    async fn get(&self, scope: &SessionScope) -> Result<Option<StateMap>>;

    /// Replace the persisted state for a session.
    async fn update(&self, scope: &SessionScope, state: StateMap) -> Result<()>;
}

/// A session scope bound to the store it persists to.
#[derive(Clone)]
pub struct SessionHandle {
    scope: SessionScope,
    store: Arc<dyn StateStore>,
}

impl SessionHandle {
    pub fn new(scope: SessionScope, store: Arc<dyn StateStore>) -> Self {
        Self { scope, store }
    }

    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    /// Write a snapshot of `state` to the store.
    pub async fn persist(&self, state: &SharedState) -> Result<()> {
        self.store.update(&self.scope, state.snapshot()).await
    }

    pub async fn load(&self) -> Result<Option<StateMap>> {
        self.store.get(&self.scope).await
    }
}

/// Process-local [`StateStore`].
#[derive(Default)]
pub struct InMemoryStateStore {
    sessions: Mutex<HashMap<SessionScope, StateMap>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, scope: &SessionScope) -> Result<Option<StateMap>> {
        Ok(self.sessions.lock().get(scope).cloned())
    }

    async fn update(&self, scope: &SessionScope, state: StateMap) -> Result<()> {
        self.sessions.lock().insert(scope.clone(), state);
        Ok(())
    }
}
