use clap::Parser;
use std::process;

use medisure_cli::commands;
use medisure_cli::config::load_config;
use medisure_cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    // Load configuration
    let config = match load_config(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Hospital { action } => commands::hospital(action, &config, cli.format).await,
        Commands::Company { action } => commands::company(action, &config, cli.format).await,
        Commands::Admin { action } => commands::admin(action, &config).await,
        Commands::Claim { action } => commands::claim(action, &config, cli.format).await,
        Commands::Upload { action } => commands::upload(action, &config).await,
        Commands::Records => commands::records(&config, cli.format).await,
        Commands::Status => commands::status(&config).await,
    };

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
