use clap::Subcommand;
use tomata_core::storage::Database;
use tomata_core::CoreError;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recent sessions, newest first
    List {
        /// Maximum number of sessions to show
        #[arg(long, default_value = "20")]
        limit: u32,
        /// Only show sessions started within the last N days
        #[arg(long)]
        days: Option<i64>,
        /// Print raw JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: HistoryAction) -> Result<(), CoreError> {
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit, days, json } => {
            let sessions = match days {
                Some(days) => {
                    let to = chrono::Utc::now();
                    let mut sessions = db.sessions_between(to - chrono::Duration::days(days), to)?;
                    sessions.truncate(limit as usize);
                    sessions
                }
                None => db.recent_sessions(limit)?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
                return Ok(());
            }
            if sessions.is_empty() {
                println!("no sessions recorded");
                return Ok(());
            }
            for session in sessions {
                println!(
                    "{}  {:<5}  {:>4}m  {}",
                    session.started_at.format("%Y-%m-%d %H:%M"),
                    session.kind.as_str(),
                    session.duration_secs / 60,
                    if session.completed { "completed" } else { "interrupted" },
                );
            }
        }
    }
    Ok(())
}
