use super::commands::access::AccessCommand;
use super::commands::admin::AdminCommands;
use super::commands::auth::AuthCommands;
use super::commands::exam::ExamCommands;
use super::commands::import::ImportCommands;
use super::commands::profile::ProfileCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "exam-bank")]
#[command(about = "Manage a school exam bank: import passages, generate and take exams")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Backend connection and account management
    Auth(AuthCommands),
    /// Check which area a path resolves to for the current session
    Access(AccessCommand),
    /// Import passages and questions (teacher role)
    Import(ImportCommands),
    /// Generate, review and take exams (student role)
    Exam(ExamCommands),
    /// Show or rename your profile
    Profile(ProfileCommands),
    /// Administrative operations (service role key required)
    Admin(AdminCommands),
}
