use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The four-state timer variant. Exactly one member is active at a time;
/// running phases carry the wall-clock instant their countdown targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerPhase {
    Idle,
    Working { ends_at: DateTime<Utc> },
    WorkComplete,
    OnBreak { ends_at: DateTime<Utc> },
}

impl TimerPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, TimerPhase::Working { .. } | TimerPhase::OnBreak { .. })
    }

    pub fn is_working(&self) -> bool {
        matches!(self, TimerPhase::Working { .. })
    }

    pub fn is_on_break(&self) -> bool {
        matches!(self, TimerPhase::OnBreak { .. })
    }

    /// Countdown target of a running phase.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TimerPhase::Working { ends_at } | TimerPhase::OnBreak { ends_at } => Some(*ends_at),
            _ => None,
        }
    }

    /// Fixed presentation label per phase.
    pub fn status_text(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "Ready",
            TimerPhase::Working { .. } => "Focus Time",
            TimerPhase::WorkComplete => "Work Complete",
            TimerPhase::OnBreak { .. } => "Break Time",
        }
    }
}

pub const DEFAULT_WORK_SECS: u64 = 25 * 60;
pub const DEFAULT_BREAK_SECS: u64 = 5 * 60;

/// Interval durations, immutable for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub work_duration_secs: u64,
    pub break_duration_secs: u64,
}

impl TimerConfig {
    /// Both durations must be positive -- the engine never arms a
    /// non-positive-duration countdown.
    pub fn new(work_duration_secs: u64, break_duration_secs: u64) -> Result<Self, ValidationError> {
        if work_duration_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "work_duration_secs".into(),
                message: "must be positive".into(),
            });
        }
        if break_duration_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "break_duration_secs".into(),
                message: "must be positive".into(),
            });
        }
        Ok(Self {
            work_duration_secs,
            break_duration_secs,
        })
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_duration_secs: DEFAULT_WORK_SECS,
            break_duration_secs: DEFAULT_BREAK_SECS,
        }
    }
}
