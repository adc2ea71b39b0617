//! Collaborator seams around the timer engine.
//!
//! Every side effect the engine triggers -- recording a finished session,
//! scheduling a reminder, mirroring state to an ambient surface, firing an
//! automation command -- goes through one of these traits. Calls return
//! immediately and cannot fail at the seam; implementations log their own
//! errors and the engine's transitions never depend on the outcome.

mod automation;
mod presence;
mod recorder;
mod reminders;

pub use automation::ShellHook;
pub use presence::{PresenceFile, PresenceState};
pub use recorder::SqliteRecorder;
pub use reminders::ReminderStore;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    WorkComplete,
    BreakComplete,
}

impl ReminderKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReminderKind::WorkComplete => "Work Session Complete!",
            ReminderKind::BreakComplete => "Break Over!",
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            ReminderKind::WorkComplete => "Great job! Time for a break.",
            ReminderKind::BreakComplete => "Ready to focus again?",
        }
    }
}

/// A reminder keyed to a session end time. At most one reminder per kind is
/// pending at a time; scheduling replaces the previous one of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub kind: ReminderKind,
    pub fire_at: DateTime<Utc>,
}

pub trait SessionRecorder {
    /// Persist a completed session. Best effort.
    fn save(&self, record: &SessionRecord);
}

pub trait Notifier {
    fn schedule(&self, reminder: Reminder);
    fn cancel_all(&self);
}

pub trait PresencePublisher {
    /// Mirror a running phase to the ambient surface.
    fn publish(&self, state: &PresenceState);
    /// Clear the surface. Must tolerate no surface being up.
    fn stop(&self);
}

pub trait AutomationHook {
    fn on_start(&self);
    fn on_end(&self);
}

/// The engine's collaborator bundle. Defaults to no-ops so an engine is
/// usable without any wiring.
pub struct Hooks {
    pub recorder: Box<dyn SessionRecorder>,
    pub notifier: Box<dyn Notifier>,
    pub presence: Box<dyn PresencePublisher>,
    pub automation: Box<dyn AutomationHook>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            recorder: Box::new(Unwired),
            notifier: Box::new(Unwired),
            presence: Box::new(Unwired),
            automation: Box::new(Unwired),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hooks { .. }")
    }
}

/// Placeholder collaborator that drops every call.
struct Unwired;

impl SessionRecorder for Unwired {
    fn save(&self, _record: &SessionRecord) {}
}

impl Notifier for Unwired {
    fn schedule(&self, _reminder: Reminder) {}
    fn cancel_all(&self) {}
}

impl PresencePublisher for Unwired {
    fn publish(&self, _state: &PresenceState) {}
    fn stop(&self) {}
}

impl AutomationHook for Unwired {
    fn on_start(&self) {}
    fn on_end(&self) {}
}
