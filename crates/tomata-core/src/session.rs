//! Completed session records handed off to the recorder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Work,
    Break,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Work => "work",
            SessionKind::Break => "break",
        }
    }
}

/// A finished interval. Produced by the engine only on natural completion;
/// manual resets discard the in-progress interval without a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub completed: bool,
    /// Whole seconds between start and end, never negative.
    pub duration_secs: i64,
}

impl SessionRecord {
    /// Build a record for a naturally completed interval.
    pub fn completed(kind: SessionKind, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            started_at,
            ended_at,
            completed: true,
            duration_secs: (ended_at - started_at).num_seconds().max(0),
        }
    }
}
