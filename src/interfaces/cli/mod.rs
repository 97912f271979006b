//! CLI interface module
//!
//! Operator commands that work directly against the database.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::config::get_config;
use crate::runtime::lifetime::startup::prepare_services;
use commands::{approve_pharmacy, config_generate, create_admin, run_sweep};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::MedifindError> for CliError {
    fn from(err: crate::errors::MedifindError) -> Self {
        match err {
            crate::errors::MedifindError::DatabaseConfig(_)
            | crate::errors::MedifindError::DatabaseConnection(_)
            | crate::errors::MedifindError::DatabaseOperation(_) => {
                CliError::StorageError(err.message().to_string())
            }
            other => CliError::CommandError(other.format_simple()),
        }
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // Generate 不需要数据库连接
    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cmd
    {
        return config_generate(output_path, force);
    }

    let config = get_config();
    let context = prepare_services(&config)
        .await
        .map_err(|e| CliError::StorageError(format!("{:#}", e)))?;
    let services = context.services;

    let result = match cmd {
        Commands::Sweep => run_sweep(&services).await,
        Commands::CreateAdmin {
            email,
            name,
            password,
            stdin,
        } => create_admin(&services, email, name, password, stdin).await,
        Commands::ApprovePharmacy { id, revoke } => {
            approve_pharmacy(&services, id, !revoke).await
        }
        Commands::Serve => unreachable!("server mode handled in main"),
        Commands::Config { .. } => unreachable!("handled above"),
    };

    if let Err(e) = context.storage.close().await {
        tracing::warn!("Failed to close database connections: {}", e);
    }
    result
}
