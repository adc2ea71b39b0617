use std::sync::Arc;

use tracing::{debug, warn};

use crate::session::SessionRecord;
use crate::storage::Database;

use super::SessionRecorder;

/// Recorder backed by the session database. Insert failures are logged and
/// swallowed; a lost row never disturbs the timer.
pub struct SqliteRecorder {
    db: Arc<Database>,
}

impl SqliteRecorder {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl SessionRecorder for SqliteRecorder {
    fn save(&self, record: &SessionRecord) {
        match self.db.record_session(record) {
            Ok(()) => debug!(
                id = %record.id,
                kind = record.kind.as_str(),
                duration_secs = record.duration_secs,
                "session recorded"
            ),
            Err(e) => warn!(id = %record.id, "failed to record session: {e}"),
        }
    }
}
