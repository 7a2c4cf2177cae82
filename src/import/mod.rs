//! Spreadsheet import of passages with their questions
//!
//! [`sheet`] reads the workbook, [`transform`] shapes rows into the backend
//! contract, and [`flow`] sequences validation and import.

pub mod error;
pub mod flow;
pub mod payload;
pub mod rows;
pub mod sheet;
pub mod template;
pub mod transform;

pub use crate::api::models::ValidationIssue;
pub use error::ImportError;
pub use flow::{ImportFlow, ImportState};
pub use payload::{AnswerOption, ImportBatch, OptionLabel, Passage, PassageType, Question, QuestionType};
pub use rows::{RawBatch, RawPassageRow, RawQuestionRow, RawRow};
pub use sheet::{parse_workbook, read_workbook_file};
pub use transform::transform_batch;
