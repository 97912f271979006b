use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::Services;

/// 单次执行超时扫描，便于 cron 等外部调度
pub async fn run_sweep(services: &Services) -> Result<(), CliError> {
    let expired = services.sweeper().run_once().await?;
    if expired == 0 {
        println!("{}", "No overdue reservations".dimmed());
    } else {
        println!(
            "{} {}",
            "Expired reservations:".green().bold(),
            expired.to_string().cyan()
        );
    }
    Ok(())
}
