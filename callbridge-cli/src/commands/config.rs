use crate::config::ConfigLoader;
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (merged)
    Show {
        /// Print the client options the demo would use, as JSON
        #[arg(long)]
        client_options: bool,
    },
    /// Show configuration file paths
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show { client_options } => show_config(client_options),
        ConfigCommands::Path => show_paths(),
    }
}

fn show_config(client_options: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    if client_options {
        let json = serde_json::to_string_pretty(&config.client_options())?;
        println!("{}", json);
    } else {
        let toml_str = toml::to_string_pretty(&config)?;
        println!("{}", toml_str);
    }
    Ok(())
}

fn show_paths() -> Result<()> {
    println!("User config:    {:?}", ConfigLoader::user_config_path());
    println!("Project config: {:?}", ConfigLoader::project_config_path());
    Ok(())
}
