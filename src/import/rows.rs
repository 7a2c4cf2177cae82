//! Typed views over spreadsheet rows
//!
//! The sheets are keyed by header text. Each known column becomes an
//! `Option<String>` here so a misspelt or missing column shows up as `None`
//! at the parser boundary instead of leaking further as an untyped map.

use std::collections::BTreeMap;

/// One data row of a sheet, keyed by header text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 0-based position among the sheet's data rows
    pub position: usize,
    pub cells: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(position: usize) -> Self {
        Self {
            position,
            cells: BTreeMap::new(),
        }
    }

    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.cells.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<String> {
        self.cells.get(column).cloned()
    }
}

pub mod columns {
    pub const TITLE: &str = "title";
    pub const GRADE_LEVEL: &str = "grade_level";
    pub const PASSAGE_TYPE: &str = "passage_type";
    pub const CONTENT: &str = "content";
    pub const AUDIO_URL: &str = "audio_url";

    pub const QUESTION_ORDER: &str = "question_order";
    pub const TYPE: &str = "type";
    pub const CATEGORY_ID: &str = "category_id";
    pub const DIFFICULTY: &str = "difficulty";
    pub const QUESTION_TEXT: &str = "question_text";
    pub const EXPLANATION: &str = "explanation";
    pub const BLANK_INDEX: &str = "blank_index";
    pub const ANSWER_KEY: &str = "answer_key";
    pub const OPTION_A: &str = "option_A";
    pub const OPTION_B: &str = "option_B";
    pub const OPTION_C: &str = "option_C";
    pub const OPTION_D: &str = "option_D";
    pub const CORRECT_OPTION: &str = "correct_option";

    pub const PASSAGE: [&str; 5] = [TITLE, GRADE_LEVEL, PASSAGE_TYPE, CONTENT, AUDIO_URL];

    pub const QUESTIONS: [&str; 13] = [
        QUESTION_ORDER,
        TYPE,
        CATEGORY_ID,
        DIFFICULTY,
        QUESTION_TEXT,
        EXPLANATION,
        BLANK_INDEX,
        ANSWER_KEY,
        OPTION_A,
        OPTION_B,
        OPTION_C,
        OPTION_D,
        CORRECT_OPTION,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPassageRow {
    pub title: Option<String>,
    pub grade_level: Option<String>,
    pub passage_type: Option<String>,
    pub content: Option<String>,
    pub audio_url: Option<String>,
}

impl From<&RawRow> for RawPassageRow {
    fn from(row: &RawRow) -> Self {
        Self {
            title: row.get(columns::TITLE),
            grade_level: row.get(columns::GRADE_LEVEL),
            passage_type: row.get(columns::PASSAGE_TYPE),
            content: row.get(columns::CONTENT),
            audio_url: row.get(columns::AUDIO_URL),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuestionRow {
    /// 0-based position in the sheet (or in manual entry order)
    pub position: usize,
    pub question_order: Option<String>,
    pub kind: Option<String>,
    pub category_id: Option<String>,
    pub difficulty: Option<String>,
    pub question_text: Option<String>,
    pub explanation: Option<String>,
    pub blank_index: Option<String>,
    pub answer_key: Option<String>,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_option: Option<String>,
}

impl RawQuestionRow {
    /// Option cells in label order A, B, C, D
    pub fn option_cells(&self) -> [&Option<String>; 4] {
        [&self.option_a, &self.option_b, &self.option_c, &self.option_d]
    }
}

impl From<&RawRow> for RawQuestionRow {
    fn from(row: &RawRow) -> Self {
        Self {
            position: row.position,
            question_order: row.get(columns::QUESTION_ORDER),
            kind: row.get(columns::TYPE),
            category_id: row.get(columns::CATEGORY_ID),
            difficulty: row.get(columns::DIFFICULTY),
            question_text: row.get(columns::QUESTION_TEXT),
            explanation: row.get(columns::EXPLANATION),
            blank_index: row.get(columns::BLANK_INDEX),
            answer_key: row.get(columns::ANSWER_KEY),
            option_a: row.get(columns::OPTION_A),
            option_b: row.get(columns::OPTION_B),
            option_c: row.get(columns::OPTION_C),
            option_d: row.get(columns::OPTION_D),
            correct_option: row.get(columns::CORRECT_OPTION),
        }
    }
}

/// Parsed but not yet coerced contents of one upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBatch {
    pub passage: RawPassageRow,
    pub questions: Vec<RawQuestionRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_row_picks_exact_column_names() {
        let row = RawRow::new(4)
            .with("type", "multiple_choice")
            .with("option_A", "red")
            .with("option_a", "ignored")
            .with("correct_option", "A");

        let question = RawQuestionRow::from(&row);
        assert_eq!(question.position, 4);
        assert_eq!(question.kind.as_deref(), Some("multiple_choice"));
        assert_eq!(question.option_a.as_deref(), Some("red"));
        assert_eq!(question.option_b, None);
    }
}
