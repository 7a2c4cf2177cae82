use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;
use log::info;

use crate::cli::context::AppContext;
use crate::cli::ui::with_spinner;
use exam_bank::exam::normalize_name;

#[derive(Args)]
pub struct ProfileCommands {
    #[command(subcommand)]
    pub command: ProfileSubcommands,
}

#[derive(Subcommand)]
pub enum ProfileSubcommands {
    /// Show name, level and experience
    Show,
    /// Change your display name
    Rename {
        name: String,
    },
}

pub async fn profile_command(cmd: ProfileCommands) -> Result<()> {
    match cmd.command {
        ProfileSubcommands::Show => show_command().await,
        ProfileSubcommands::Rename { name } => rename_command(&name).await,
    }
}

async fn show_command() -> Result<()> {
    info!("Executing profile show");
    let mut ctx = AppContext::load()?;
    let (client, session) = ctx.client().await?;

    let profile = with_spinner("Loading profile...", client.profile(&session.user.id))
        .await?
        .context("No profile found for this account")?;

    println!("{}", "Profile".bold());
    println!("  Name:  {}", profile.name.as_deref().unwrap_or("(not set)").bright_yellow());
    if let Some(email) = &session.user.email {
        println!("  Email: {}", email);
    }
    println!("  Level: {}", profile.level);
    println!("  EXP:   {}", profile.exp);
    Ok(())
}

async fn rename_command(name: &str) -> Result<()> {
    info!("Executing profile rename");
    let name = normalize_name(name).context("Name must not be empty")?;

    let mut ctx = AppContext::load()?;
    let (client, session) = ctx.client().await?;
    with_spinner("Saving...", client.rename_profile(&session.user.id, &name)).await?;

    println!("{} Name changed to {}", "✓".bright_green().bold(), name.bright_yellow().bold());
    Ok(())
}
