use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use colored::*;
use log::{info, warn};

use crate::cli::context::AppContext;
use crate::cli::ui::prompts::{prompt_new_password, prompt_password, prompt_value};
use crate::cli::ui::with_spinner;
use exam_bank::api::{Session, SignUpOutcome};
use exam_bank::config::Config;

#[derive(Args)]
pub struct AuthCommands {
    #[command(subcommand)]
    pub command: AuthSubcommands,
}

#[derive(Subcommand)]
pub enum AuthSubcommands {
    /// Store the backend URL and anon key
    Configure {
        /// Backend project URL
        #[arg(long)]
        url: Option<String>,
        /// Public anon key
        #[arg(long)]
        anon_key: Option<String>,
    },
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create a new account
    Register {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the configured backend, the session and test connectivity
    Status,
    /// Show or change request settings
    Settings {
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Attempts for reads that fail transiently
        #[arg(long)]
        retries: Option<u32>,
    },
}

pub async fn auth_command(cmd: AuthCommands) -> Result<()> {
    match cmd.command {
        AuthSubcommands::Configure { url, anon_key } => configure_command(url, anon_key),
        AuthSubcommands::Login { email, password } => login_command(email, password).await,
        AuthSubcommands::Register { email } => register_command(email).await,
        AuthSubcommands::Logout => logout_command().await,
        AuthSubcommands::Status => status_command().await,
        AuthSubcommands::Settings { timeout, retries } => settings_command(timeout, retries),
    }
}

fn configure_command(url: Option<String>, anon_key: Option<String>) -> Result<()> {
    info!("Executing auth configure command");

    let url = prompt_value(url, "Backend URL (e.g., https://yourproject.supabase.co)")?;
    let anon_key = prompt_value(anon_key, "Anon key")?;

    let mut config = Config::load()?;
    config.set_backend(url, anon_key)?;

    println!("{} Backend configured", "✓".bright_green().bold());
    Ok(())
}

async fn login_command(email: Option<String>, password: Option<String>) -> Result<()> {
    info!("Executing auth login command");
    let mut ctx = AppContext::load()?;

    let email = prompt_value(email, "Email")?;
    let password = prompt_password(password)?;

    let auth = ctx.auth_manager()?;
    let session = with_spinner("Signing in...", auth.sign_in_with_password(email.trim(), &password)).await?;
    ctx.config.set_session(session.clone())?;

    println!("{} Signed in as {}", "✓".bright_green().bold(), email.trim().bright_yellow().bold());
    print_role(&session);
    Ok(())
}

async fn register_command(email: Option<String>) -> Result<()> {
    info!("Executing auth register command");
    let mut ctx = AppContext::load()?;

    let email = prompt_value(email, "Email")?;
    let password = prompt_new_password()?;

    let auth = ctx.auth_manager()?;
    match with_spinner("Creating account...", auth.sign_up(email.trim(), &password)).await? {
        SignUpOutcome::SignedIn(session) => {
            ctx.config.set_session(session.clone())?;
            println!("{} Account created and signed in", "✓".bright_green().bold());
            print_role(&session);
        }
        SignUpOutcome::ConfirmationRequired { email } => {
            println!(
                "{} Account created. Check {} for a confirmation link, then run 'exam-bank auth login'",
                "✓".bright_green().bold(),
                email.bright_yellow()
            );
        }
    }
    Ok(())
}

async fn logout_command() -> Result<()> {
    info!("Executing auth logout command");
    let mut ctx = AppContext::load()?;

    let Some(session) = ctx.config.session.clone() else {
        println!("Not signed in.");
        return Ok(());
    };

    // The local session is dropped even if the server can't be reached
    if let Err(e) = ctx.auth_manager()?.sign_out(&session.access_token).await {
        warn!("Remote sign-out failed: {:#}", e);
        println!("{} Could not reach the server to revoke the session: {}", "!".yellow().bold(), e);
    }
    ctx.config.clear_session()?;

    println!("{} Signed out", "✓".bright_green().bold());
    Ok(())
}

async fn status_command() -> Result<()> {
    info!("Executing auth status command");

    println!("Exam Bank Status");
    println!("================");

    let ctx = match AppContext::load() {
        Ok(ctx) => ctx,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    println!("Backend: {}", ctx.backend.url.bright_cyan());

    match &ctx.config.session {
        Some(session) => {
            let who = session.user.email.as_deref().unwrap_or(&session.user.id);
            println!("Signed in as: {}", who.bright_yellow());
            print_role(session);
            if session.is_expired(Utc::now()) {
                println!("Session: {}", "expired (will refresh on next use)".yellow());
            } else {
                println!("Session valid until: {}", session.expires_at.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        None => println!("Not signed in. Run 'exam-bank auth login'."),
    }

    println!();
    let client = ctx.anonymous_client()?;
    match with_spinner("Testing connection...", client.ping()).await {
        Ok(()) => println!("{} Backend reachable", "✓".bright_green().bold()),
        Err(e) => println!("{} Connection failed: {}", "✗".bright_red().bold(), e.to_string().red()),
    }

    Ok(())
}

fn settings_command(timeout: Option<u64>, retries: Option<u32>) -> Result<()> {
    info!("Executing auth settings command");
    let mut config = Config::load()?;

    if let Some(secs) = timeout {
        config.update_request_timeout(secs)?;
    }
    if let Some(attempts) = retries {
        config.update_retry_attempts(attempts)?;
    }

    let settings = config.get_settings();
    println!("Request timeout: {}s", settings.request_timeout_secs.to_string().bright_cyan());
    println!("Read attempts:   {}", settings.retry_attempts.to_string().bright_cyan());
    Ok(())
}

fn print_role(session: &Session) {
    match session.user.role {
        Some(role) => println!("Role: {}", role.to_string().bright_cyan()),
        None => println!("Role: {}", "none assigned (ask an administrator)".yellow()),
    }
}
