use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;
use log::{debug, info};
use std::path::PathBuf;

use crate::cli::context::{AppContext, require_role};
use crate::cli::ui::prompts::{prompt_passage, prompt_question};
use crate::cli::ui::{prompt_confirmation, with_spinner};
use exam_bank::api::{BackendClient, Role};
use exam_bank::import::template::write_template;
use exam_bank::import::{ImportBatch, ImportError, ImportFlow, ImportState, RawBatch};

#[derive(Args)]
pub struct ImportCommands {
    #[command(subcommand)]
    pub command: ImportSubcommands,
}

#[derive(Subcommand)]
pub enum ImportSubcommands {
    /// Import a passage and its questions from an .xlsx workbook
    File {
        /// Workbook with 'passage' and 'questions' sheets
        path: PathBuf,
        /// Import without asking once validation passes
        #[arg(short, long)]
        yes: bool,
        /// Stop after validation
        #[arg(long)]
        dry_run: bool,
    },
    /// Enter a passage and its questions interactively
    Manual {
        /// Stop after validation
        #[arg(long)]
        dry_run: bool,
    },
    /// Write an example workbook to fill in
    Template {
        /// Output path
        #[arg(default_value = "question-import-template.xlsx")]
        out: PathBuf,
    },
}

pub async fn import_command(cmd: ImportCommands) -> Result<()> {
    match cmd.command {
        ImportSubcommands::File { path, yes, dry_run } => file_command(path, yes, dry_run).await,
        ImportSubcommands::Manual { dry_run } => manual_command(dry_run).await,
        ImportSubcommands::Template { out } => template_command(out),
    }
}

async fn teacher_client() -> Result<BackendClient> {
    let mut ctx = AppContext::load()?;
    let (client, _) = ctx.client().await?;
    with_spinner("Checking permissions...", require_role(&client, Role::Teacher)).await?;
    Ok(client)
}

async fn file_command(path: PathBuf, yes: bool, dry_run: bool) -> Result<()> {
    info!("Executing import file command for {:?}", path);

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {:?}", path))?;
    let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;

    let client = teacher_client().await?;
    let mut flow = ImportFlow::new(client);
    with_spinner("Validating...", flow.select_file(&file_name, &bytes)).await;

    drive_flow(&mut flow, yes, dry_run).await
}

async fn manual_command(dry_run: bool) -> Result<()> {
    info!("Executing import manual command");

    let client = teacher_client().await?;

    println!("Passage");
    let passage = prompt_passage()?;
    let mut questions = vec![prompt_question(0)?];
    while prompt_confirmation("Add another question?", false)? {
        questions.push(prompt_question(questions.len())?);
    }

    let mut flow = ImportFlow::new(client);
    let raw = RawBatch { passage, questions };
    with_spinner("Validating...", flow.submit_rows("manual entry", raw)).await;

    drive_flow(&mut flow, false, dry_run).await
}

fn template_command(out: PathBuf) -> Result<()> {
    info!("Executing import template command");
    write_template(&out)?;
    println!("{} Template written to {}", "✓".bright_green().bold(), out.display().to_string().bright_yellow());
    Ok(())
}

/// Walk the flow from its post-validation state to a final outcome
async fn drive_flow(flow: &mut ImportFlow<BackendClient>, yes: bool, dry_run: bool) -> Result<()> {
    loop {
        match flow.state() {
            ImportState::ValidationFailed => {
                print_issues("Validation failed", flow);
                let transient = matches!(flow.failure(), Some(ImportError::RemoteValidation(_)));
                if transient && !yes && prompt_confirmation("Try validating again?", true)? {
                    with_spinner("Validating...", flow.revalidate()).await?;
                    continue;
                }
                anyhow::bail!("Nothing was imported: fix the problems above and try again");
            }
            ImportState::ValidationSuccess => {
                let Some(batch) = flow.batch() else {
                    anyhow::bail!("Validated batch missing");
                };
                print_preview(batch);

                if dry_run {
                    println!("\n{} Validation passed. Dry run, nothing imported.", "✓".bright_green().bold());
                    return Ok(());
                }

                let prompt = format!("Import this passage with {} question(s)?", batch.questions.len());
                if !yes && !prompt_confirmation(&prompt, true)? {
                    println!("{} Cancelled.", "✗".bright_red().bold());
                    return Ok(());
                }

                if let Err(e) = with_spinner("Importing...", flow.confirm_import()).await {
                    debug!("Import attempt failed in state {}: {}", flow.state(), e);
                    // Only a refused transition leaves the state unchanged
                    if flow.state() == ImportState::ValidationSuccess {
                        return Err(e.into());
                    }
                }
            }
            ImportState::ImportSuccess => {
                println!(
                    "{} Imported {}",
                    "✓".bright_green().bold(),
                    flow.source().unwrap_or("batch").bright_yellow()
                );
                return Ok(());
            }
            ImportState::ImportFailed => {
                print_issues("Import failed", flow);
                if !yes && prompt_confirmation("Validate again and retry?", false)? {
                    with_spinner("Validating...", flow.revalidate()).await?;
                    continue;
                }
                anyhow::bail!("Import failed");
            }
            other => anyhow::bail!("Import stopped unexpectedly in state '{}'", other),
        }
    }
}

fn print_issues(heading: &str, flow: &ImportFlow<BackendClient>) {
    println!("\n{}", heading.bright_red().bold());
    for issue in flow.errors() {
        println!("  {} {}", "✗".bright_red(), issue);
    }
}

fn print_preview(batch: &ImportBatch) {
    let passage = &batch.passage;

    println!();
    println!("{}", "Passage".bold());
    println!("  Title: {}", passage.title.as_deref().unwrap_or("(untitled)").bright_yellow());
    println!("  Grade: {}  Type: {}", passage.grade_level, passage.passage_type.as_str());
    if let Some(audio_url) = &passage.audio_url {
        println!("  Audio: {}", audio_url);
    }
    println!("  {}", excerpt(&passage.content, 100).dimmed());

    println!();
    println!("{}", format!("Questions ({})", batch.questions.len()).bold());
    for (i, question) in batch.questions.iter().enumerate() {
        println!(
            "  {}. [{}] {} {}",
            i + 1,
            question.kind.to_string().bright_cyan(),
            question.question_text,
            format!("(category {}, difficulty {})", question.category_id, question.difficulty).dimmed()
        );

        if let Some(options) = &question.options {
            for option in options {
                let marker = if option.is_correct { "✓".bright_green().bold() } else { " ".normal() };
                println!("       {} {}. {}", marker, option.label.as_str(), option.content);
            }
        } else if let Some(answer_key) = &question.answer_key {
            println!("       Answer: {}", answer_key.bright_green());
        }
    }
}

/// First `max_chars` characters on one line
fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::excerpt;

    #[test]
    fn excerpt_flattens_and_cuts_on_characters() {
        assert_eq!(excerpt("a  b\nc", 10), "a b c");
        assert_eq!(excerpt("ééééé", 3), "ééé...");
    }
}
