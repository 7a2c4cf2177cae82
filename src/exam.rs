//! Student-side exam data: generated exams, their questions, history, profile

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamOption {
    pub id: i64,
    pub option_label: String,
    pub option_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamQuestion {
    pub id: i64,
    pub question_text: String,
    pub question_type_id: Option<i64>,
    pub question_order: i64,
    pub options: Vec<ExamOption>,
}

impl ExamQuestion {
    /// Questions without options are answered with free text
    pub fn is_choice(&self) -> bool {
        !self.options.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub exp: i64,
}

/// Row of `exam_questions` with the embedded question
#[derive(Debug, Deserialize)]
struct ExamQuestionRow {
    question_order: i64,
    questions: Option<EmbeddedQuestion>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedQuestion {
    id: i64,
    question_text: String,
    question_type_id: Option<i64>,
    #[serde(default)]
    options: Option<Vec<ExamOption>>,
}

/// Flatten `exam_questions` rows into questions in exam order
///
/// Rows whose question is no longer visible are skipped. Options are sorted
/// by label.
pub fn flatten_exam_rows(value: Value) -> Result<Vec<ExamQuestion>> {
    let rows: Vec<ExamQuestionRow> =
        serde_json::from_value(value).context("Unexpected exam questions response")?;

    let mut questions: Vec<ExamQuestion> = rows
        .into_iter()
        .filter_map(|row| {
            let Some(question) = row.questions else {
                warn!("Exam question at position {} has no visible question", row.question_order);
                return None;
            };
            let mut options = question.options.unwrap_or_default();
            options.sort_by(|a, b| a.option_label.cmp(&b.option_label));
            Some(ExamQuestion {
                id: question.id,
                question_text: question.question_text,
                question_type_id: question.question_type_id,
                question_order: row.question_order,
                options,
            })
        })
        .collect();

    questions.sort_by_key(|q| q.question_order);
    Ok(questions)
}

/// Trimmed display name, `None` when blank
pub fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Chosen option id
    Choice(i64),
    Text(String),
}

/// Answers a student has given so far, keyed by question id
#[derive(Debug, Clone, Default)]
pub struct AnswerSheet {
    pub exam_id: i64,
    answers: BTreeMap<i64, Answer>,
}

impl AnswerSheet {
    pub fn new(exam_id: i64) -> Self {
        Self {
            exam_id,
            answers: BTreeMap::new(),
        }
    }

    /// Record a choice; later answers replace earlier ones
    pub fn select_option(&mut self, question: &ExamQuestion, option_id: i64) -> Result<()> {
        if !question.options.iter().any(|o| o.id == option_id) {
            anyhow::bail!("Option {} does not belong to question {}", option_id, question.id);
        }
        self.answers.insert(question.id, Answer::Choice(option_id));
        Ok(())
    }

    /// Record a free-text answer; a blank answer clears it
    pub fn write_answer(&mut self, question: &ExamQuestion, text: &str) {
        match normalize_name(text) {
            Some(text) => {
                self.answers.insert(question.id, Answer::Text(text));
            }
            None => {
                self.answers.remove(&question.id);
            }
        }
    }

    pub fn answer(&self, question_id: i64) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Questions still without an answer, in exam order
    pub fn unanswered<'a>(&self, questions: &'a [ExamQuestion]) -> Vec<&'a ExamQuestion> {
        questions
            .iter()
            .filter(|q| !self.answers.contains_key(&q.id))
            .collect()
    }
}
