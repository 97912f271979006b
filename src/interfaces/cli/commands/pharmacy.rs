use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::Services;

pub async fn approve_pharmacy(
    services: &Services,
    id: String,
    approved: bool,
) -> Result<(), CliError> {
    let pharmacy = services.pharmacies.set_approval(&id, approved).await?;

    let state = if pharmacy.is_approved {
        "approved".green().bold()
    } else {
        "revoked".yellow().bold()
    };
    println!("{} {} ({})", pharmacy.name.cyan(), state, pharmacy.id.dimmed());
    Ok(())
}
