//! Timer engine implementation.
//!
//! The engine is a wall-clock-based state machine. It owns no threads and no
//! clock -- every command takes the current instant, and the host drives a
//! periodic `tick()` while a phase is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Working -> WorkComplete -> {OnBreak -> Idle} | Working
//! ```
//!
//! `reset()` returns to `Idle` from any state and discards the in-progress
//! interval without recording it.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfig::default());
//! engine.start_work(clock.now());
//! // In a 1 Hz loop while engine.is_running():
//! engine.tick(clock.now()); // Returns Some(Event::TimerCompleted) at zero
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::hooks::{Hooks, PresenceState, Reminder, ReminderKind};
use crate::session::{SessionKind, SessionRecord};

use super::phase::{TimerConfig, TimerPhase};

/// Core timer engine.
///
/// State survives process restarts through serde; collaborators are not part
/// of the persisted state and are re-attached by the host after loading.
#[derive(Serialize, Deserialize)]
pub struct TimerEngine {
    config: TimerConfig,
    phase: TimerPhase,
    /// Remaining time in fractional seconds for the armed countdown.
    remaining_secs: f64,
    /// When the current interval was started; cleared on reset.
    session_start: Option<DateTime<Utc>>,
    #[serde(skip)]
    hooks: Hooks,
}

impl TimerEngine {
    /// Create an idle engine with no-op collaborators.
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            phase: TimerPhase::Idle,
            remaining_secs: config.work_duration_secs as f64,
            session_start: None,
            hooks: Hooks::default(),
        }
    }

    /// Create an idle engine with the given collaborators.
    pub fn with_hooks(config: TimerConfig, hooks: Hooks) -> Self {
        let mut engine = Self::new(config);
        engine.hooks = hooks;
        engine
    }

    /// Re-attach collaborators, e.g. after deserializing persisted state.
    pub fn attach_hooks(&mut self, hooks: Hooks) {
        self.hooks = hooks;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> TimerConfig {
        self.config
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn remaining_secs(&self) -> f64 {
        self.remaining_secs
    }

    /// Full duration of the interval the countdown is (or would be) over.
    pub fn total_secs(&self) -> u64 {
        match self.phase {
            TimerPhase::OnBreak { .. } => self.config.break_duration_secs,
            _ => self.config.work_duration_secs,
        }
    }

    /// 0.0 .. 1.0 progress within the running interval; 0 when not running.
    /// Clamped to absorb clock-skew rounding at the interval edges.
    pub fn progress(&self) -> f64 {
        let total = match self.phase {
            TimerPhase::Working { .. } => self.config.work_duration_secs,
            TimerPhase::OnBreak { .. } => self.config.break_duration_secs,
            TimerPhase::Idle | TimerPhase::WorkComplete => return 0.0,
        } as f64;
        (1.0 - self.remaining_secs / total).clamp(0.0, 1.0)
    }

    /// Remaining time as zero-padded `MM:SS`, truncating sub-second
    /// remainders (61.9 renders as "01:01").
    pub fn display(&self) -> String {
        let whole = self.remaining_secs.max(0.0) as u64;
        format!("{:02}:{:02}", whole / 60, whole % 60)
    }

    pub fn status_text(&self) -> &'static str {
        self.phase.status_text()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            status: self.status_text().to_string(),
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            progress: self.progress(),
            display: self.display(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a work interval. Valid from any state.
    pub fn start_work(&mut self, now: DateTime<Utc>) -> Event {
        self.begin(SessionKind::Work, now)
    }

    /// Begin a break interval. Valid from any state.
    pub fn start_break(&mut self, now: DateTime<Utc>) -> Event {
        self.begin(SessionKind::Break, now)
    }

    /// Restart a fresh work cycle without passing through a break.
    pub fn start_new_session(&mut self, now: DateTime<Utc>) -> Event {
        self.start_work(now)
    }

    /// Return to `Idle` from any state. The in-progress interval is
    /// discarded without a record; pending reminders and the presence
    /// surface are cleared. Idempotent.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Event {
        self.phase = TimerPhase::Idle;
        self.session_start = None;
        self.remaining_secs = self.config.work_duration_secs as f64;
        self.hooks.notifier.cancel_all();
        self.hooks.presence.stop();
        Event::TimerReset { at: now }
    }

    /// Call periodically while running. Returns `Some(Event::TimerCompleted)`
    /// when the countdown reaches zero; a tick in any non-running phase is a
    /// no-op, which also guards against a stray tick after `reset()`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let ends_at = self.phase.ends_at()?;
        let remaining_ms = (ends_at - now).num_milliseconds();
        if remaining_ms > 0 {
            self.remaining_secs = remaining_ms as f64 / 1000.0;
            return None;
        }
        self.remaining_secs = 0.0;
        Some(self.complete(now))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(&mut self, kind: SessionKind, now: DateTime<Utc>) -> Event {
        let duration_secs = match kind {
            SessionKind::Work => self.config.work_duration_secs,
            SessionKind::Break => self.config.break_duration_secs,
        };
        let ends_at = now + Duration::seconds(duration_secs as i64);

        self.phase = match kind {
            SessionKind::Work => TimerPhase::Working { ends_at },
            SessionKind::Break => TimerPhase::OnBreak { ends_at },
        };
        self.session_start = Some(now);
        self.remaining_secs = duration_secs as f64;

        let reminder_kind = match kind {
            SessionKind::Work => ReminderKind::WorkComplete,
            SessionKind::Break => ReminderKind::BreakComplete,
        };
        self.hooks.notifier.schedule(Reminder {
            kind: reminder_kind,
            fire_at: ends_at,
        });
        self.hooks.presence.publish(&PresenceState {
            kind,
            started_at: now,
            ends_at,
        });
        if kind == SessionKind::Work {
            self.hooks.automation.on_start();
        }

        Event::TimerStarted {
            kind,
            duration_secs,
            ends_at,
            at: now,
        }
    }

    /// Fires at most once per armed countdown; the phase transition below is
    /// what keeps a second late tick from re-entering.
    fn complete(&mut self, now: DateTime<Utc>) -> Event {
        let kind = if self.phase.is_working() {
            SessionKind::Work
        } else {
            SessionKind::Break
        };
        // A running phase always carries its start.
        let started_at = self.session_start.take().unwrap_or(now);
        let record = SessionRecord::completed(kind, started_at, now);
        self.hooks.recorder.save(&record);

        match kind {
            SessionKind::Work => {
                self.phase = TimerPhase::WorkComplete;
                self.hooks.automation.on_end();
            }
            SessionKind::Break => {
                self.phase = TimerPhase::Idle;
                self.remaining_secs = self.config.work_duration_secs as f64;
            }
        }
        self.hooks.presence.stop();

        Event::TimerCompleted {
            kind,
            record_id: record.id,
            duration_secs: record.duration_secs,
            at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{AutomationHook, Notifier, PresencePublisher, SessionRecorder};
    use chrono::TimeZone;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Records every collaborator call the engine makes.
    #[derive(Default)]
    struct Probe {
        saved: RefCell<Vec<SessionRecord>>,
        scheduled: RefCell<Vec<Reminder>>,
        cancels: Cell<u32>,
        published: RefCell<Vec<PresenceState>>,
        presence_stops: Cell<u32>,
        automation_starts: Cell<u32>,
        automation_ends: Cell<u32>,
    }

    impl SessionRecorder for Rc<Probe> {
        fn save(&self, record: &SessionRecord) {
            self.saved.borrow_mut().push(record.clone());
        }
    }

    impl Notifier for Rc<Probe> {
        fn schedule(&self, reminder: Reminder) {
            self.scheduled.borrow_mut().push(reminder);
        }
        fn cancel_all(&self) {
            self.cancels.set(self.cancels.get() + 1);
        }
    }

    impl PresencePublisher for Rc<Probe> {
        fn publish(&self, state: &PresenceState) {
            self.published.borrow_mut().push(*state);
        }
        fn stop(&self) {
            self.presence_stops.set(self.presence_stops.get() + 1);
        }
    }

    impl AutomationHook for Rc<Probe> {
        fn on_start(&self) {
            self.automation_starts.set(self.automation_starts.get() + 1);
        }
        fn on_end(&self) {
            self.automation_ends.set(self.automation_ends.get() + 1);
        }
    }

    fn probed_engine(config: TimerConfig) -> (TimerEngine, Rc<Probe>) {
        let probe = Rc::new(Probe::default());
        let hooks = Hooks {
            recorder: Box::new(probe.clone()),
            notifier: Box::new(probe.clone()),
            presence: Box::new(probe.clone()),
            automation: Box::new(probe.clone()),
        };
        (TimerEngine::with_hooks(config, hooks), probe)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn start_work_arms_countdown() {
        let (mut engine, probe) = probed_engine(TimerConfig::default());
        let now = t0();

        let event = engine.start_work(now);

        assert!(engine.phase().is_working());
        assert_eq!(engine.remaining_secs(), 1500.0);
        assert_eq!(engine.progress(), 0.0);
        assert_eq!(engine.display(), "25:00");
        assert_eq!(engine.status_text(), "Focus Time");

        let ends_at = now + Duration::seconds(1500);
        assert_eq!(engine.phase().ends_at(), Some(ends_at));
        match event {
            Event::TimerStarted {
                kind,
                duration_secs,
                ends_at: event_end,
                ..
            } => {
                assert_eq!(kind, SessionKind::Work);
                assert_eq!(duration_secs, 1500);
                assert_eq!(event_end, ends_at);
            }
            other => panic!("expected TimerStarted, got {other:?}"),
        }

        let scheduled = probe.scheduled.borrow();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].kind, ReminderKind::WorkComplete);
        assert_eq!(scheduled[0].fire_at, ends_at);

        let published = probe.published.borrow();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].kind, SessionKind::Work);
        assert_eq!(published[0].ends_at, ends_at);

        assert_eq!(probe.automation_starts.get(), 1);
        assert_eq!(probe.automation_ends.get(), 0);
    }

    #[test]
    fn tick_updates_remaining_without_phase_change() {
        let (mut engine, probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_work(start);

        assert!(engine.tick(start + Duration::seconds(600)).is_none());
        assert!(engine.phase().is_working());
        assert_eq!(engine.remaining_secs(), 900.0);
        assert_eq!(engine.display(), "15:00");
        assert!((engine.progress() - 0.4).abs() < 1e-9);
        assert!(probe.saved.borrow().is_empty());
    }

    #[test]
    fn work_completion_records_and_holds() {
        let (mut engine, probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_work(start);

        let event = engine.tick(start + Duration::seconds(1500));

        assert_eq!(engine.phase(), TimerPhase::WorkComplete);
        assert_eq!(engine.display(), "00:00");
        assert_eq!(engine.progress(), 0.0);
        assert_eq!(engine.status_text(), "Work Complete");

        let saved = probe.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].kind, SessionKind::Work);
        assert!(saved[0].completed);
        assert_eq!(saved[0].duration_secs, 1500);
        assert_eq!(saved[0].started_at, start);

        match event {
            Some(Event::TimerCompleted { kind, duration_secs, .. }) => {
                assert_eq!(kind, SessionKind::Work);
                assert_eq!(duration_secs, 1500);
            }
            other => panic!("expected TimerCompleted, got {other:?}"),
        }

        assert_eq!(probe.automation_ends.get(), 1);
        assert_eq!(probe.presence_stops.get(), 1);
    }

    #[test]
    fn no_double_completion_from_consecutive_late_ticks() {
        let (mut engine, probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_work(start);

        let after_end = start + Duration::seconds(1501);
        assert!(engine.tick(after_end).is_some());
        assert!(engine.tick(after_end + Duration::seconds(1)).is_none());

        assert_eq!(probe.saved.borrow().len(), 1);
        assert_eq!(engine.phase(), TimerPhase::WorkComplete);
    }

    #[test]
    fn break_after_work_complete() {
        let (mut engine, _probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_work(start);
        engine.tick(start + Duration::seconds(1500));
        assert_eq!(engine.phase(), TimerPhase::WorkComplete);

        let break_start = start + Duration::seconds(1600);
        engine.start_break(break_start);

        assert!(engine.phase().is_on_break());
        assert_eq!(engine.remaining_secs(), 300.0);
        assert_eq!(engine.display(), "05:00");
        assert_eq!(engine.status_text(), "Break Time");
    }

    #[test]
    fn break_completion_returns_to_idle() {
        let (mut engine, probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_break(start);

        let event = engine.tick(start + Duration::seconds(300));

        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert_eq!(engine.remaining_secs(), 1500.0);
        assert!(matches!(
            event,
            Some(Event::TimerCompleted {
                kind: SessionKind::Break,
                ..
            })
        ));

        let saved = probe.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].kind, SessionKind::Break);
        assert_eq!(saved[0].duration_secs, 300);
        // Break start never fires the automation hook.
        assert_eq!(probe.automation_starts.get(), 0);
        assert_eq!(probe.automation_ends.get(), 0);
    }

    #[test]
    fn manual_reset_never_persists() {
        let (mut engine, probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_work(start);
        engine.tick(start + Duration::seconds(900));
        assert_eq!(engine.remaining_secs(), 600.0);

        engine.reset(start + Duration::seconds(901));

        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert_eq!(engine.remaining_secs(), 1500.0);
        assert!(probe.saved.borrow().is_empty());
        assert_eq!(probe.cancels.get(), 1);
        assert_eq!(probe.presence_stops.get(), 1);
    }

    #[test]
    fn reset_from_break_cancels_pending() {
        let (mut engine, probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_break(start);
        engine.tick(start + Duration::seconds(150));
        assert_eq!(engine.remaining_secs(), 150.0);

        engine.reset(start + Duration::seconds(151));

        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert_eq!(engine.remaining_secs(), 1500.0);
        assert!(probe.saved.borrow().is_empty());
        assert_eq!(probe.cancels.get(), 1);
    }

    #[test]
    fn reset_is_idempotent_from_idle() {
        let (mut engine, probe) = probed_engine(TimerConfig::default());
        engine.reset(t0());
        engine.reset(t0() + Duration::seconds(1));

        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert!(probe.saved.borrow().is_empty());
    }

    #[test]
    fn stray_tick_after_reset_is_noop() {
        let (mut engine, probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_work(start);
        engine.reset(start + Duration::seconds(10));

        // The tick that would have fired completion arrives late.
        assert!(engine.tick(start + Duration::seconds(1500)).is_none());
        assert!(probe.saved.borrow().is_empty());
        assert_eq!(engine.phase(), TimerPhase::Idle);
    }

    #[test]
    fn start_new_session_restarts_work() {
        let (mut engine, probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_work(start);
        engine.tick(start + Duration::seconds(1500));
        assert_eq!(engine.phase(), TimerPhase::WorkComplete);

        let restart = start + Duration::seconds(1700);
        engine.start_new_session(restart);

        assert!(engine.phase().is_working());
        assert_eq!(engine.remaining_secs(), 1500.0);
        assert_eq!(probe.automation_starts.get(), 2);
    }

    #[test]
    fn display_truncates_subsecond_remainders() {
        let (mut engine, _probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_work(start);

        // 1438.1s elapsed leaves 61.9s remaining.
        engine.tick(start + Duration::milliseconds(1_438_100));
        assert!((engine.remaining_secs() - 61.9).abs() < 1e-9);
        assert_eq!(engine.display(), "01:01");

        // 0.2s elapsed leaves 1499.8s remaining.
        let (mut engine, _probe) = probed_engine(TimerConfig::default());
        engine.start_work(start);
        engine.tick(start + Duration::milliseconds(200));
        assert_eq!(engine.display(), "24:59");
    }

    #[test]
    fn custom_durations_flow_through() {
        let config = TimerConfig::new(90, 30).unwrap();
        let (mut engine, probe) = probed_engine(config);
        let start = t0();

        engine.start_work(start);
        assert_eq!(engine.display(), "01:30");
        assert_eq!(engine.total_secs(), 90);

        engine.tick(start + Duration::seconds(90));
        assert_eq!(engine.phase(), TimerPhase::WorkComplete);
        assert_eq!(probe.saved.borrow()[0].duration_secs, 90);
    }

    #[test]
    fn full_cycle_with_manual_clock() {
        use crate::clock::{Clock, ManualClock};

        let (mut engine, probe) = probed_engine(TimerConfig::default());
        let clock = ManualClock::new(t0());

        engine.start_work(clock.now());
        for _ in 0..1500 {
            clock.advance_secs(1);
            engine.tick(clock.now());
        }
        assert_eq!(engine.phase(), TimerPhase::WorkComplete);

        engine.start_break(clock.now());
        for _ in 0..300 {
            clock.advance_secs(1);
            engine.tick(clock.now());
        }
        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert_eq!(engine.remaining_secs(), 1500.0);

        let saved = probe.saved.borrow();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].kind, SessionKind::Work);
        assert_eq!(saved[1].kind, SessionKind::Break);
        // One surface publication per interval, one stop per completion.
        assert_eq!(probe.published.borrow().len(), 2);
        assert_eq!(probe.presence_stops.get(), 2);
    }

    #[test]
    fn persisted_state_roundtrips_without_hooks() {
        let (mut engine, _probe) = probed_engine(TimerConfig::default());
        let start = t0();
        engine.start_work(start);
        engine.tick(start + Duration::seconds(100));

        let json = serde_json::to_string(&engine).unwrap();
        let restored: TimerEngine = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.phase(), engine.phase());
        assert_eq!(restored.remaining_secs(), engine.remaining_secs());
        assert_eq!(restored.config(), engine.config());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn progress_equals_clamped_elapsed_fraction(
                work_secs in 1u64..=86_400,
                elapsed_ms in 0i64..=100_000_000,
            ) {
                let config = TimerConfig::new(work_secs, 300).unwrap();
                let mut engine = TimerEngine::new(config);
                let start = t0();
                engine.start_work(start);
                engine.tick(start + Duration::milliseconds(elapsed_ms));

                if engine.phase().is_working() {
                    let expected = (elapsed_ms as f64 / 1000.0 / work_secs as f64).clamp(0.0, 1.0);
                    prop_assert!((engine.progress() - expected).abs() < 1e-9);
                } else {
                    // Countdown hit zero and completed.
                    prop_assert!(elapsed_ms >= work_secs as i64 * 1000);
                    prop_assert_eq!(engine.phase(), TimerPhase::WorkComplete);
                }
                prop_assert!(engine.progress() >= 0.0 && engine.progress() <= 1.0);
            }

            #[test]
            fn progress_is_monotone_while_running(
                work_secs in 2u64..=86_400,
                a_ms in 0i64..=50_000_000,
                b_ms in 0i64..=50_000_000,
            ) {
                let limit = work_secs as i64 * 1000 - 1;
                let (earlier, later) = if a_ms <= b_ms { (a_ms, b_ms) } else { (b_ms, a_ms) };
                let (earlier, later) = (earlier.min(limit), later.min(limit));

                let config = TimerConfig::new(work_secs, 300).unwrap();
                let mut engine = TimerEngine::new(config);
                let start = t0();
                engine.start_work(start);

                engine.tick(start + Duration::milliseconds(earlier));
                let first = engine.progress();
                engine.tick(start + Duration::milliseconds(later));
                let second = engine.progress();

                prop_assert!(engine.phase().is_working());
                prop_assert!(second >= first);
            }
        }
    }
}
