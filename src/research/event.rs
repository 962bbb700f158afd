//! Events surfaced by the fan-out runner.

use crate::research::context::BranchPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One item of a unit's output, tagged with where it came from.
///
/// Ordering is only meaningful among events sharing a `branch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub invocation_id: Uuid,
    /// Branch path of the originating unit
    pub branch: BranchPath,
    /// Name of the originating unit
    pub author: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        invocation_id: Uuid,
        branch: BranchPath,
        author: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            invocation_id,
            branch,
            author: author.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}
