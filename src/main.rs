use anyhow::Result;
use clap::Parser;
use log::{error, info};

mod cli;

use cli::Cli;
use cli::app::Commands;
use cli::commands::{access, admin, auth, exam, import, profile};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("exam-bank.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {:?}", path);
    }

    let cli = Cli::parse();
    info!("Starting exam-bank");

    let result = match cli.command {
        Commands::Auth(cmd) => auth::auth_command(cmd).await,
        Commands::Access(cmd) => access::access_command(cmd).await,
        Commands::Import(cmd) => import::import_command(cmd).await,
        Commands::Exam(cmd) => exam::exam_command(cmd).await,
        Commands::Profile(cmd) => profile::profile_command(cmd).await,
        Commands::Admin(cmd) => admin::admin_command(cmd).await,
    };

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    result
}
