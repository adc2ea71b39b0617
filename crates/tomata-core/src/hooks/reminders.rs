//! Pending-reminder book.
//!
//! The engine schedules a reminder for each armed countdown; delivery is the
//! host's job. This implementation keeps the pending set in the kv table so
//! any later CLI invocation (or the watch loop) can pop the reminders that
//! have fired and print their copy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::storage::Database;

use super::{Notifier, Reminder};

const KV_KEY: &str = "pending_reminders";

pub struct ReminderStore {
    db: Arc<Database>,
}

impl ReminderStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn load(&self) -> Vec<Reminder> {
        let raw = match self.db.kv_get(KV_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("failed to load pending reminders: {e}");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("discarding unreadable pending reminders: {e}");
            Vec::new()
        })
    }

    fn store(&self, reminders: &[Reminder]) {
        let result = match serde_json::to_string(reminders) {
            Ok(json) => self.db.kv_set(KV_KEY, &json).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            warn!("failed to store pending reminders: {e}");
        }
    }

    /// All reminders still waiting to fire.
    pub fn pending(&self) -> Vec<Reminder> {
        self.load()
    }

    /// Remove and return every reminder whose fire time has passed.
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        let mut pending = self.load();
        let due: Vec<Reminder> = pending.iter().copied().filter(|r| r.fire_at <= now).collect();
        if !due.is_empty() {
            pending.retain(|r| r.fire_at > now);
            self.store(&pending);
        }
        due
    }
}

impl Notifier for ReminderStore {
    fn schedule(&self, reminder: Reminder) {
        let mut pending = self.load();
        pending.retain(|r| r.kind != reminder.kind);
        pending.push(reminder);
        self.store(&pending);
    }

    fn cancel_all(&self) {
        if let Err(e) = self.db.kv_delete(KV_KEY) {
            warn!("failed to cancel pending reminders: {e}");
        }
    }
}
