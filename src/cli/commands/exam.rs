use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use dialoguer::{Input, Select};
use log::info;

use crate::cli::context::{AppContext, require_role};
use crate::cli::ui::{prompt_confirmation, with_spinner};
use exam_bank::api::{BackendClient, Role};
use exam_bank::exam::{Answer, AnswerSheet, ExamQuestion};
use exam_bank::import::payload::{MAX_GRADE_LEVEL, MIN_GRADE_LEVEL};

#[derive(Args)]
pub struct ExamCommands {
    #[command(subcommand)]
    pub command: ExamSubcommands,
}

#[derive(Subcommand)]
pub enum ExamSubcommands {
    /// Generate a new exam from the question bank
    Generate {
        /// Grade level (6-12)
        #[arg(short, long)]
        grade: i64,
    },
    /// Print the questions of an exam
    Show {
        exam_id: i64,
    },
    /// List your exams, newest first
    History,
    /// Answer an exam interactively
    Take {
        exam_id: i64,
    },
}

pub async fn exam_command(cmd: ExamCommands) -> Result<()> {
    match cmd.command {
        ExamSubcommands::Generate { grade } => generate_command(grade).await,
        ExamSubcommands::Show { exam_id } => show_command(exam_id).await,
        ExamSubcommands::History => history_command().await,
        ExamSubcommands::Take { exam_id } => take_command(exam_id).await,
    }
}

async fn student_client() -> Result<BackendClient> {
    let mut ctx = AppContext::load()?;
    let (client, _) = ctx.client().await?;
    with_spinner("Checking permissions...", require_role(&client, Role::Student)).await?;
    Ok(client)
}

async fn generate_command(grade: i64) -> Result<()> {
    info!("Executing exam generate for grade {}", grade);
    if !(MIN_GRADE_LEVEL..=MAX_GRADE_LEVEL).contains(&grade) {
        anyhow::bail!("Grade must be between {} and {} (got {})", MIN_GRADE_LEVEL, MAX_GRADE_LEVEL, grade);
    }

    let client = student_client().await?;
    let exam_id = with_spinner("Generating exam...", client.generate_exam(grade)).await?;

    println!("{} Exam {} generated", "✓".bright_green().bold(), exam_id.to_string().bright_yellow().bold());
    println!("Run 'exam-bank exam take {}' to start.", exam_id);
    Ok(())
}

async fn load_questions(client: &BackendClient, exam_id: i64) -> Result<Vec<ExamQuestion>> {
    let questions = with_spinner("Loading exam...", client.exam_questions(exam_id)).await?;
    if questions.is_empty() {
        anyhow::bail!("Exam {} has no questions (or is not yours)", exam_id);
    }
    Ok(questions)
}

async fn show_command(exam_id: i64) -> Result<()> {
    info!("Executing exam show for {}", exam_id);
    let client = student_client().await?;
    let questions = load_questions(&client, exam_id).await?;

    println!("{}", format!("Exam {}", exam_id).bold());
    for (i, question) in questions.iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, question.question_text);
        for option in &question.options {
            println!("   {}. {}", option.option_label, option.option_text);
        }
    }
    Ok(())
}

async fn history_command() -> Result<()> {
    info!("Executing exam history");
    let client = student_client().await?;
    let exams = with_spinner("Loading history...", client.exam_history()).await?;

    if exams.is_empty() {
        println!("No exams yet. Run 'exam-bank exam generate --grade <N>'.");
        return Ok(());
    }

    println!("{}", "Your exams".bold());
    for exam in exams {
        println!(
            "  {}  {}",
            format!("#{}", exam.id).bright_yellow(),
            exam.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn take_command(exam_id: i64) -> Result<()> {
    info!("Executing exam take for {}", exam_id);
    let client = student_client().await?;
    let questions = load_questions(&client, exam_id).await?;
    let mut sheet = AnswerSheet::new(exam_id);

    let mut pending: Vec<&ExamQuestion> = questions.iter().collect();
    loop {
        for question in &pending {
            ask(question, &mut sheet)?;
        }

        pending = sheet.unanswered(&questions);
        if pending.is_empty() {
            break;
        }
        let prompt = format!("{} question(s) unanswered. Go back to them?", pending.len());
        if !prompt_confirmation(&prompt, true)? {
            break;
        }
    }

    println!();
    println!(
        "{} Answered {} of {} questions",
        "✓".bright_green().bold(),
        sheet.answered_count(),
        questions.len()
    );
    for (i, question) in questions.iter().enumerate() {
        let answer = match sheet.answer(question.id) {
            Some(Answer::Choice(option_id)) => question
                .options
                .iter()
                .find(|o| o.id == *option_id)
                .map(|o| format!("{}. {}", o.option_label, o.option_text))
                .unwrap_or_default(),
            Some(Answer::Text(text)) => text.clone(),
            None => "(no answer)".dimmed().to_string(),
        };
        println!("  {}. {}", i + 1, answer);
    }
    Ok(())
}

/// Prompt for one question; skipping leaves any previous answer in place
fn ask(question: &ExamQuestion, sheet: &mut AnswerSheet) -> Result<()> {
    println!();
    println!("{}. {}", question.question_order, question.question_text.bold());

    if question.is_choice() {
        let mut items: Vec<String> = question
            .options
            .iter()
            .map(|o| format!("{}. {}", o.option_label, o.option_text))
            .collect();
        items.push("Skip".to_string());

        let selection = Select::new()
            .with_prompt("Your answer")
            .items(&items)
            .default(0)
            .interact()?;

        if let Some(option) = question.options.get(selection) {
            sheet.select_option(question, option.id)?;
        }
    } else {
        let text = Input::<String>::new()
            .with_prompt("Your answer (leave empty to skip)")
            .allow_empty(true)
            .interact_text()?;
        if !text.trim().is_empty() {
            sheet.write_answer(question, &text);
        }
    }
    Ok(())
}
