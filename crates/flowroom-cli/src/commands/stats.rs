use clap::Subcommand;
use flowroom_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's counters
    Today,
    /// Totals over every recorded day
    All,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    let stats = match action {
        StatsAction::Today => db.stats_today()?,
        StatsAction::All => db.stats_all()?,
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
