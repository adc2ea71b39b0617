use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::SessionKind;
use crate::timer::TimerPhase;

/// Every engine command and completion produces an Event.
/// The CLI prints them; hosts may fan them out further.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        kind: SessionKind,
        duration_secs: u64,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        kind: SessionKind,
        record_id: Uuid,
        duration_secs: i64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: TimerPhase,
        status: String,
        remaining_secs: f64,
        total_secs: u64,
        progress: f64,
        display: String,
        at: DateTime<Utc>,
    },
}
