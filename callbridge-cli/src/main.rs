use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "callbridge", about = "Per-element RTC client registry and call lifecycle bridge")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a client options file
    Check(commands::check::CheckArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Run a scripted call lifecycle against the loopback SDK
    Demo(commands::demo::DemoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Check(args) => commands::check::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Demo(args) => commands::demo::run(args).await,
    }
}
