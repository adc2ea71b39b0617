//! File-backed ambient presence surface.
//!
//! Mirrors the running phase into `presence.json` under the data directory.
//! Glanceable surfaces (status bars, widgets) read the file; `stop` removes
//! it. `PresenceState` is the one schema shared between the engine and any
//! adapter rendering it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CoreError;
use crate::session::SessionKind;
use crate::storage::data_dir;

use super::PresencePublisher;

/// Snapshot of a running interval for ambient display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceState {
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

pub struct PresenceFile {
    path: PathBuf,
}

impl PresenceFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `presence.json` in the data directory.
    pub fn default_location() -> Result<Self, CoreError> {
        Ok(Self::new(data_dir()?.join("presence.json")))
    }

    /// Current surface content, if one is published.
    pub fn read(&self) -> Option<PresenceState> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw).ok()
    }
}

impl PresencePublisher for PresenceFile {
    fn publish(&self, state: &PresenceState) {
        let result = match serde_json::to_vec_pretty(state) {
            Ok(json) => std::fs::write(&self.path, json).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            warn!(path = %self.path.display(), "failed to publish presence: {e}");
        }
    }

    fn stop(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            // No surface up; nothing to clear.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "failed to clear presence: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PresenceState {
        let now = Utc::now();
        PresenceState {
            kind: SessionKind::Work,
            started_at: now,
            ends_at: now + chrono::Duration::seconds(1500),
        }
    }

    #[test]
    fn publish_writes_shared_schema_json() {
        let dir = tempfile::tempdir().unwrap();
        let surface = PresenceFile::new(dir.path().join("presence.json"));

        let published = state();
        surface.publish(&published);
        assert_eq!(surface.read(), Some(published));

        let raw = std::fs::read_to_string(dir.path().join("presence.json")).unwrap();
        let parsed: PresenceState = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.kind, SessionKind::Work);
    }

    #[test]
    fn stop_removes_surface_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let surface = PresenceFile::new(dir.path().join("presence.json"));

        surface.publish(&state());
        surface.stop();
        assert!(surface.read().is_none());

        // Second stop has nothing to clear.
        surface.stop();
    }
}
