//! Request contracts for the validate/import procedures

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_GRADE_LEVEL: i64 = 6;
pub const MAX_GRADE_LEVEL: i64 = 12;
pub const MIN_DIFFICULTY: i64 = 1;
pub const MAX_DIFFICULTY: i64 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassageType {
    #[default]
    Reading,
    Listening,
}

impl PassageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassageType::Reading => "reading",
            PassageType::Listening => "listening",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reading" => Some(PassageType::Reading),
            "listening" => Some(PassageType::Listening),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub title: Option<String>,
    pub grade_level: i64,
    pub passage_type: PassageType,
    pub content: String,
    /// Only ever set for listening passages
    pub audio_url: Option<String>,
}

/// Question kind; kinds this client has no special handling for pass through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    MultipleChoice,
    FillBlank,
    Other(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::FillBlank => "fill_blank",
            QuestionType::Other(kind) => kind,
        }
    }

    pub fn is_multiple_choice(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice)
    }
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "multiple_choice" => QuestionType::MultipleChoice,
            "fill_blank" => QuestionType::FillBlank,
            _ => QuestionType::Other(value),
        }
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: OptionLabel,
    pub content: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub category_id: i64,
    pub difficulty: i64,
    pub question_text: String,
    pub explanation: Option<String>,
    pub blank_index: Option<i64>,
    pub answer_key: Option<String>,
    /// Four options for multiple choice, serialized as `null` otherwise
    pub options: Option<Vec<AnswerOption>>,
}

impl Question {
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.as_ref()?.iter().find(|o| o.is_correct)
    }
}

/// One passage and its questions, the unit of import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub passage: Passage,
    pub questions: Vec<Question>,
}

impl ImportBatch {
    /// Arguments for both remote procedures
    pub fn to_rpc_args(&self) -> serde_json::Value {
        serde_json::json!({
            "p_passage": self.passage,
            "p_questions": self.questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_multiple_choice_serializes_null_options() {
        let question = Question {
            kind: QuestionType::FillBlank,
            category_id: 3,
            difficulty: 2,
            question_text: "The cat ___ on the mat.".to_string(),
            explanation: None,
            blank_index: Some(1),
            answer_key: Some("sat".to_string()),
            options: None,
        };

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["type"], json!("fill_blank"));
        assert_eq!(value["options"], serde_json::Value::Null);
        assert_eq!(value["explanation"], serde_json::Value::Null);
    }

    #[test]
    fn unknown_question_type_round_trips_verbatim() {
        let kind: QuestionType = serde_json::from_value(json!("matching")).unwrap();
        assert_eq!(kind, QuestionType::Other("matching".to_string()));
        assert_eq!(serde_json::to_value(&kind).unwrap(), json!("matching"));
    }

    #[test]
    fn rpc_args_use_procedure_parameter_names() {
        let batch = ImportBatch {
            passage: Passage {
                title: None,
                grade_level: 7,
                passage_type: PassageType::Listening,
                content: "Listen".to_string(),
                audio_url: Some("https://cdn.example/a.mp3".to_string()),
            },
            questions: Vec::new(),
        };

        let args = batch.to_rpc_args();
        assert_eq!(args["p_passage"]["passage_type"], json!("listening"));
        assert_eq!(args["p_passage"]["grade_level"], json!(7));
        assert_eq!(args["p_questions"], json!([]));
    }
}
