use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use log::info;

use crate::cli::context::AppContext;
use crate::cli::ui::with_spinner;
use exam_bank::api::Role;
use exam_bank::config::Config;

#[derive(Args)]
pub struct AdminCommands {
    #[command(subcommand)]
    pub command: AdminSubcommands,
}

#[derive(Subcommand)]
pub enum AdminSubcommands {
    /// Assign a role to a user (reads EXAM_BANK_SERVICE_ROLE_KEY)
    SetRole {
        /// Auth user id
        user_id: String,
        /// student, teacher or admin
        role: Role,
    },
}

pub async fn admin_command(cmd: AdminCommands) -> Result<()> {
    match cmd.command {
        AdminSubcommands::SetRole { user_id, role } => set_role_command(&user_id, role).await,
    }
}

async fn set_role_command(user_id: &str, role: Role) -> Result<()> {
    info!("Executing admin set-role for {}", user_id);
    let ctx = AppContext::load()?;
    let service_role_key = Config::service_role_key()?;

    let auth = ctx.auth_manager()?;
    with_spinner("Updating role...", auth.set_user_role(&service_role_key, user_id, role)).await?;

    println!(
        "{} {} now has the {} role",
        "✓".bright_green().bold(),
        user_id.bright_yellow(),
        role.to_string().bright_cyan().bold()
    );
    println!("The user must sign in again for the change to reach their session.");
    Ok(())
}
