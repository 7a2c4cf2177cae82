use anyhow::Result;
use clap::Args;
use colored::*;
use log::{info, warn};

use crate::cli::context::AppContext;
use exam_bank::access::{Access, Viewer, route_access};

#[derive(Args)]
pub struct AccessCommand {
    /// Path to check, e.g. /teacher/question-bank/import
    pub path: String,
}

pub async fn access_command(cmd: AccessCommand) -> Result<()> {
    info!("Checking access to {}", cmd.path);
    let mut ctx = AppContext::load()?;

    let viewer = if ctx.config.session.is_none() {
        Viewer::Anonymous
    } else {
        let (client, session) = ctx.client().await?;
        let role = match client.get_my_role().await {
            Ok(role) => role,
            Err(e) => {
                warn!("Role lookup failed, using the stored role: {:#}", e);
                session.user.role
            }
        };
        Viewer::signed_in(role)
    };

    match route_access(viewer, &cmd.path) {
        Access::Allow => println!("{} {} is accessible", "✓".bright_green().bold(), cmd.path.bright_yellow()),
        Access::Redirect(target) => println!(
            "{} {} redirects to {}",
            "→".bright_cyan().bold(),
            cmd.path.bright_yellow(),
            target.bright_cyan()
        ),
    }

    Ok(())
}
