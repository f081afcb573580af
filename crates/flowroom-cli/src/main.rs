use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod notifier;
mod present;
mod ticker;

#[derive(Parser)]
#[command(name = "flowroom", version, about = "Flow-aware focus timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the current phase in the foreground until it completes
    Run,
    /// Start, pause or resume the timer
    Toggle,
    /// Reset the current phase to its full length
    Reset,
    /// Stop the timer, keeping the remaining time
    Stop,
    /// Print current timer state as JSON
    Status,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Daily flow statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("FLOWROOM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run => commands::timer::run_foreground(),
        Commands::Toggle => commands::timer::run(commands::timer::TimerAction::Toggle),
        Commands::Reset => commands::timer::run(commands::timer::TimerAction::Reset),
        Commands::Stop => commands::timer::run(commands::timer::TimerAction::Stop),
        Commands::Status => commands::timer::run(commands::timer::TimerAction::Status),
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { action } => commands::stats::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
