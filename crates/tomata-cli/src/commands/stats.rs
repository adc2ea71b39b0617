use clap::Subcommand;
use tomata_core::storage::{Database, Stats};
use tomata_core::CoreError;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today {
        /// Print raw JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
    /// All-time stats
    All {
        /// Print raw JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
}

fn print_stats(stats: &Stats, json: bool) -> Result<(), CoreError> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }
    println!("sessions: {} ({} work)", stats.total_sessions, stats.work_sessions);
    println!("focus:    {}", stats.formatted_focus_time());
    println!("break:    {}m", stats.total_break_secs / 60);
    println!(
        "today:    {} work sessions, {}m focus",
        stats.today_sessions,
        stats.today_focus_secs / 60
    );
    if stats.work_sessions > 0 {
        println!("average:  {}m per work session", stats.average_work_secs / 60);
    }
    Ok(())
}

pub fn run(action: StatsAction) -> Result<(), CoreError> {
    let db = Database::open()?;

    match action {
        StatsAction::Today { json } => {
            let stats = db.stats_today()?;
            print_stats(&stats, json)?;
        }
        StatsAction::All { json } => {
            let stats = db.stats_all()?;
            print_stats(&stats, json)?;
        }
    }
    Ok(())
}
