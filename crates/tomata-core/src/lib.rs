//! # Tomata Core Library
//!
//! This library provides the core logic for the Tomata Pomodoro timer.
//! It implements a CLI-first philosophy where all operations are available
//! via a standalone CLI binary; any GUI would be a thin layer over the same
//! core library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the
//!   caller to supply timestamps and invoke `tick()` periodically
//! - **Hooks**: Collaborator traits for session recording, reminders, the
//!   ambient presence surface, and automation commands -- all fire-and-forget
//! - **Storage**: SQLite-based session history and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Hooks`]: Collaborator bundle injected into the engine
//! - [`Database`]: Session history, statistics, and kv persistence
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod hooks;
pub mod session;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use hooks::{
    AutomationHook, Hooks, Notifier, PresenceFile, PresencePublisher, PresenceState, Reminder,
    ReminderKind, ReminderStore, SessionRecorder, ShellHook, SqliteRecorder,
};
pub use session::{SessionKind, SessionRecord};
pub use storage::{Config, Database, Stats};
pub use timer::{TimerConfig, TimerEngine, TimerPhase};
