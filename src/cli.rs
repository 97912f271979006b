//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// MediFind - medicine locator service
#[derive(Parser)]
#[command(name = "medifind")]
#[command(version)]
#[command(about = "Medicine locator service with pharmacy reservations", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Expire overdue PENDING reservations once and exit
    Sweep,

    /// Create an administrator account
    CreateAdmin {
        /// Login email
        email: String,

        /// Display name
        #[arg(long, default_value = "Administrator")]
        name: String,

        /// Password (if not provided, will prompt interactively)
        #[arg(long)]
        password: Option<String>,

        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Approve a pharmacy so it shows up in search results
    ApprovePharmacy {
        /// Pharmacy ID
        id: String,

        /// Revoke approval instead of granting it
        #[arg(long)]
        revoke: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}
