// CLI module - command-line argument parsing and handlers
//
// Subcommands for configuration management:
// - config --show: Display effective configuration
// - config --path: Show config file path

use crate::config::{Config, VERSION};
use clap::{Parser, Subcommand};

/// Usage Relay - attribution proxy for OpenAI-compatible APIs
#[derive(Parser)]
#[command(name = "usage-relay")]
#[command(version = VERSION)]
#[command(about = "Streaming relay that attributes API usage to callers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Handle CLI commands. Returns true if a command was handled (exit after).
pub fn handle_cli() -> bool {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config { show, path }) => {
            if path {
                handle_config_path();
            } else if show {
                handle_config_show();
            } else {
                println!("Usage: usage-relay config [--show|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --path    Show config file path");
            }
            true
        }
        None => false, // No subcommand, run the relay
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    println!("# Effective configuration (env > file > defaults)");
    println!(
        "# api_key: {}",
        if config.upstream.has_credential() {
            "set via OPENROUTER_API_KEY"
        } else {
            "NOT SET (requests will fail with 500)"
        }
    );
    println!();
    print!("{}", config.to_toml());
}
