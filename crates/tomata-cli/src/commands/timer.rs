use std::io::Write as _;
use std::sync::Arc;

use clap::Subcommand;
use tomata_core::storage::Database;
use tomata_core::{
    Clock, Config, CoreError, Event, Hooks, PresenceFile, ReminderStore, ShellHook, SqliteRecorder,
    SystemClock, TimerEngine, TimerPhase,
};

const ENGINE_KEY: &str = "timer_engine";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a work interval
    Start,
    /// Start a break interval
    Break,
    /// Start a fresh work cycle after a completed one
    New,
    /// Reset to idle, discarding the in-progress interval
    Reset,
    /// Tick once and print the current state as JSON
    Status,
    /// Drive the countdown at 1 Hz until it completes
    Watch,
}

/// Restore the persisted engine, or build a fresh one from config.
/// An idle engine is always rebuilt so duration changes take effect.
fn load_engine(db: &Database, config: &Config) -> Result<TimerEngine, CoreError> {
    let timer_config = config.timer_config()?;
    if let Ok(Some(json)) = db.kv_get(ENGINE_KEY) {
        if let Ok(engine) = serde_json::from_str::<TimerEngine>(&json) {
            if engine.phase() != TimerPhase::Idle {
                return Ok(engine);
            }
        }
    }
    Ok(TimerEngine::new(timer_config))
}

fn save_engine(db: &Database, engine: &TimerEngine) -> Result<(), CoreError> {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

fn build_hooks(db: &Arc<Database>, config: &Config) -> Hooks {
    let mut hooks = Hooks {
        recorder: Box::new(SqliteRecorder::new(db.clone())),
        ..Hooks::default()
    };
    if config.notifications.enabled {
        hooks.notifier = Box::new(ReminderStore::new(db.clone()));
    }
    if config.presence.enabled {
        if let Ok(surface) = PresenceFile::default_location() {
            hooks.presence = Box::new(surface);
        }
    }
    hooks.automation = Box::new(ShellHook::new(
        config.automation.on_work_start.clone(),
        config.automation.on_work_end.clone(),
    ));
    hooks
}

fn print_event(event: &Event) -> Result<(), CoreError> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

/// Surface the copy of any reminder whose fire time has passed.
fn print_due_reminders(db: &Arc<Database>, clock: &SystemClock) {
    let store = ReminderStore::new(db.clone());
    for reminder in store.take_due(clock.now()) {
        println!("{} {}", reminder.kind.title(), reminder.kind.body());
    }
}

pub fn run(action: TimerAction) -> Result<(), CoreError> {
    let config = Config::load_or_default();
    let db = Arc::new(Database::open()?);
    let clock = SystemClock;

    let mut engine = load_engine(&db, &config)?;
    engine.attach_hooks(build_hooks(&db, &config));

    match action {
        TimerAction::Start => {
            let event = engine.start_work(clock.now());
            print_event(&event)?;
        }
        TimerAction::Break => {
            let event = engine.start_break(clock.now());
            print_event(&event)?;
        }
        TimerAction::New => {
            let event = engine.start_new_session(clock.now());
            print_event(&event)?;
        }
        TimerAction::Reset => {
            let event = engine.reset(clock.now());
            print_event(&event)?;
        }
        TimerAction::Status => {
            // Catch a completion that happened while no process was running.
            if let Some(event) = engine.tick(clock.now()) {
                print_event(&event)?;
            }
            print_event(&engine.snapshot(clock.now()))?;
            if config.notifications.enabled {
                print_due_reminders(&db, &clock);
            }
        }
        TimerAction::Watch => {
            watch(&mut engine, &db, &config, &clock)?;
        }
    }

    save_engine(&db, &engine)
}

fn watch(
    engine: &mut TimerEngine,
    db: &Arc<Database>,
    config: &Config,
    clock: &SystemClock,
) -> Result<(), CoreError> {
    if !engine.is_running() {
        print_event(&engine.snapshot(clock.now()))?;
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let completed = engine.tick(clock.now());
            print!("\r{}  {} ", engine.status_text(), engine.display());
            let _ = std::io::stdout().flush();
            if let Some(event) = completed {
                println!();
                print_event(&event)?;
                if config.notifications.enabled {
                    print_due_reminders(db, clock);
                }
                break;
            }
        }
        Ok(())
    })
}
