//! Raw rows → import contract
//!
//! Pure functions: no I/O, no clock, no randomness. Every problem in every row
//! is collected so a teacher can fix the sheet in one pass.

use std::collections::BTreeSet;

use super::error::ImportError;
use super::payload::{
    AnswerOption, ImportBatch, MAX_DIFFICULTY, MAX_GRADE_LEVEL, MIN_DIFFICULTY, MIN_GRADE_LEVEL,
    OptionLabel, Passage, PassageType, Question, QuestionType,
};
use super::rows::{RawBatch, RawPassageRow, RawQuestionRow, columns};
use crate::api::models::ValidationIssue;

/// Build the batch sent to the backend
///
/// Questions keep sheet order unless every row carries `question_order`, in
/// which case they are sorted by it. The values must then be 1..=N with no
/// gaps or repeats.
pub fn transform_batch(raw: &RawBatch) -> Result<ImportBatch, ImportError> {
    let mut issues = Vec::new();

    let passage = match transform_passage(&raw.passage) {
        Ok(passage) => Some(passage),
        Err(mut passage_issues) => {
            issues.append(&mut passage_issues);
            None
        }
    };

    if raw.questions.is_empty() {
        issues.push(ValidationIssue::general(
            "Questions sheet must contain at least 1 row",
        ));
    }

    let ordered = match order_rows(&raw.questions) {
        Ok(ordered) => ordered,
        Err(mut order_issues) => {
            issues.append(&mut order_issues);
            raw.questions.iter().collect()
        }
    };

    let mut questions = Vec::with_capacity(ordered.len());
    for (index, row) in ordered.into_iter().enumerate() {
        match transform_question(index, row) {
            Ok(question) => questions.push(question),
            Err(mut row_issues) => issues.append(&mut row_issues),
        }
    }

    match passage {
        Some(passage) if issues.is_empty() => Ok(ImportBatch { passage, questions }),
        _ => Err(ImportError::Fields(issues)),
    }
}

pub fn transform_passage(row: &RawPassageRow) -> Result<Passage, Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let passage_issue = |message: String| ValidationIssue::general(format!("Passage: {}", message));

    let grade_level = match bounded_integer(
        &row.grade_level,
        columns::GRADE_LEVEL,
        MIN_GRADE_LEVEL,
        MAX_GRADE_LEVEL,
    ) {
        Ok(value) => value,
        Err(message) => {
            issues.push(passage_issue(message));
            0
        }
    };

    let passage_type = match optional_text(&row.passage_type) {
        None => PassageType::default(),
        Some(text) => PassageType::parse(&text).unwrap_or_else(|| {
            issues.push(passage_issue(format!(
                "passage_type must be 'reading' or 'listening' (got '{}')",
                text
            )));
            PassageType::default()
        }),
    };

    let content = required_text(&row.content, columns::CONTENT).unwrap_or_else(|message| {
        issues.push(passage_issue(message));
        String::new()
    });

    let audio_url = match passage_type {
        PassageType::Listening => {
            let url = optional_text(&row.audio_url);
            if url.is_none() {
                issues.push(passage_issue(
                    "audio_url is required for listening passages".to_string(),
                ));
            }
            url
        }
        PassageType::Reading => None,
    };

    if !issues.is_empty() {
        return Err(issues);
    }

    Ok(Passage {
        title: optional_text(&row.title),
        grade_level,
        passage_type,
        content,
        audio_url,
    })
}

/// Coerce one question row; `index` is its position in the final batch
pub fn transform_question(index: usize, row: &RawQuestionRow) -> Result<Question, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let kind = match optional_text(&row.kind) {
        Some(kind) => QuestionType::from(kind),
        None => {
            issues.push(ValidationIssue::at(index, "Missing type"));
            QuestionType::Other(String::new())
        }
    };

    let category_id = required_integer(&row.category_id, columns::CATEGORY_ID).unwrap_or_else(|message| {
        issues.push(ValidationIssue::at(index, message));
        0
    });

    let difficulty = bounded_integer(&row.difficulty, columns::DIFFICULTY, MIN_DIFFICULTY, MAX_DIFFICULTY)
        .unwrap_or_else(|message| {
            issues.push(ValidationIssue::at(index, message));
            0
        });

    let question_text = required_text(&row.question_text, columns::QUESTION_TEXT).unwrap_or_else(|message| {
        issues.push(ValidationIssue::at(index, message));
        String::new()
    });

    let blank_index = match optional_text(&row.blank_index) {
        None => None,
        Some(text) => match parse_integer(&text) {
            Some(value) => Some(value),
            None => {
                issues.push(ValidationIssue::at(
                    index,
                    format!("blank_index must be a whole number (got '{}')", text),
                ));
                None
            }
        },
    };

    let options = if kind.is_multiple_choice() {
        let cells = row.option_cells();
        for (label, cell) in OptionLabel::ALL.iter().zip(cells) {
            if optional_text(cell).is_none() {
                issues.push(ValidationIssue::at(index, format!("Missing option_{}", label.as_str())));
            }
        }
        Some(build_options(row))
    } else {
        None
    };

    if !issues.is_empty() {
        return Err(issues);
    }

    Ok(Question {
        kind,
        category_id,
        difficulty,
        question_text,
        explanation: optional_text(&row.explanation),
        blank_index,
        answer_key: optional_text(&row.answer_key),
        options,
    })
}

/// The four A–D options of a multiple-choice row
///
/// `is_correct` is a plain comparison against `correct_option`; whether
/// exactly one option ends up correct is for the backend to judge.
pub fn build_options(row: &RawQuestionRow) -> Vec<AnswerOption> {
    let correct = row.correct_option.as_deref().map(str::trim).unwrap_or_default();

    OptionLabel::ALL
        .iter()
        .zip(row.option_cells())
        .map(|(label, cell)| AnswerOption {
            label: *label,
            content: cell.as_deref().map(str::trim).unwrap_or_default().to_string(),
            is_correct: correct == label.as_str(),
        })
        .collect()
}

fn order_rows(rows: &[RawQuestionRow]) -> Result<Vec<&RawQuestionRow>, Vec<ValidationIssue>> {
    let with_order = rows
        .iter()
        .filter(|row| optional_text(&row.question_order).is_some())
        .count();

    if with_order == 0 {
        return Ok(rows.iter().collect());
    }

    if with_order != rows.len() {
        return Err(vec![ValidationIssue::general(
            "question_order must be filled on every question row or on none",
        )]);
    }

    let mut issues = Vec::new();
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows {
        match required_integer(&row.question_order, columns::QUESTION_ORDER) {
            Ok(order) => keyed.push((order, row)),
            Err(message) => issues.push(ValidationIssue::at(row.position, message)),
        }
    }
    if !issues.is_empty() {
        return Err(issues);
    }

    let distinct: BTreeSet<i64> = keyed.iter().map(|(order, _)| *order).collect();
    let expected: BTreeSet<i64> = (1..=rows.len() as i64).collect();
    if distinct != expected {
        return Err(vec![ValidationIssue::general(format!(
            "question_order values must be 1..={} without gaps or repeats",
            rows.len()
        ))]);
    }

    keyed.sort_by_key(|(order, _)| *order);
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

/// Empty or whitespace-only text counts as absent
fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn required_text(value: &Option<String>, column: &str) -> Result<String, String> {
    optional_text(value).ok_or_else(|| format!("Missing {}", column))
}

/// Whole numbers, also when the sheet stored them as `6.0`
fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    let value = text.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

fn required_integer(value: &Option<String>, column: &str) -> Result<i64, String> {
    let text = required_text(value, column)?;
    parse_integer(&text).ok_or_else(|| format!("{} must be a whole number (got '{}')", column, text))
}

fn bounded_integer(value: &Option<String>, column: &str, min: i64, max: i64) -> Result<i64, String> {
    let number = required_integer(value, column)?;
    if number < min || number > max {
        return Err(format!(
            "{} must be between {} and {} (got {})",
            column, min, max, number
        ));
    }
    Ok(number)
}
