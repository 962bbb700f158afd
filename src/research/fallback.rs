//! Fallback artifacts for failed units.

use crate::research::context::RunContext;
use std::sync::Arc;

/// Placeholder written in place of a failed unit's artifact.
pub const DEFAULT_FALLBACK_SENTINEL: &str = "Information unavailable.";

/// Writes a sentinel artifact for a unit that failed so synthesis can
/// proceed without it.
#[derive(Debug, Clone)]
pub struct FallbackRecorder {
    sentinel: Arc<str>,
}

impl Default for FallbackRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_SENTINEL)
    }
}

impl FallbackRecorder {
    pub fn new(sentinel: impl Into<Arc<str>>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Write the sentinel at `state_key` and persist the session.
    ///
    /// Never fails. The in-memory write always lands; a persistence error is
    /// logged and swallowed.
    pub async fn record(&self, state_key: &str, ctx: &RunContext) {
        ctx.state()
            .set(state_key, serde_json::Value::String(self.sentinel.to_string()));

        let Some(session) = ctx.session() else {
            return;
        };

        if let Err(e) = session.persist(ctx.state()).await {
            tracing::warn!(
                state_key,
                branch = %ctx.branch(),
                session_id = %session.scope().session_id,
                error = %e,
                "Failed to persist fallback state"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::state::{InMemoryStateStore, SharedState, StateStore};
    use crate::types::{AppError, Result, SessionScope, StateMap};
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl StateStore for BrokenStore {
        async fn get(&self, _scope: &SessionScope) -> Result<Option<StateMap>> {
            Err(AppError::Persistence("offline".to_string()))
        }

        async fn update(&self, _scope: &SessionScope, _state: StateMap) -> Result<()> {
            Err(AppError::Persistence("offline".to_string()))
        }
    }

    fn scope() -> SessionScope {
        SessionScope::new("advisor", "u1", "s1")
    }

    #[tokio::test]
    async fn test_record_without_session_updates_memory_only() {
        let ctx = RunContext::new(SharedState::new());
        FallbackRecorder::default()
            .record("app:research_news", &ctx)
            .await;

        assert_eq!(
            ctx.state().get_str("app:research_news").as_deref(),
            Some(DEFAULT_FALLBACK_SENTINEL)
        );
    }

    #[tokio::test]
    async fn test_record_persists_through_store() {
        let store = Arc::new(InMemoryStateStore::new());
        let ctx = RunContext::new(SharedState::new()).with_session(scope(), store.clone());

        FallbackRecorder::new("n/a").record("app:research_technical", &ctx).await;

        let persisted = store.get(&scope()).await.unwrap().unwrap();
        assert_eq!(persisted["app:research_technical"], "n/a");
    }

    #[tokio::test]
    async fn test_persistence_failure_is_swallowed() {
        let ctx = RunContext::new(SharedState::new()).with_session(scope(), Arc::new(BrokenStore));

        FallbackRecorder::default()
            .record("app:research_memory", &ctx)
            .await;

        assert!(ctx.state().contains("app:research_memory"));
    }
}
