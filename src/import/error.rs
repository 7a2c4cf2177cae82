use thiserror::Error;

use super::flow::ImportState;
use crate::api::models::ValidationIssue;

/// Everything that can stop a batch on its way to the backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// Wrong file type, unreadable workbook or missing sheets
    #[error("{0}")]
    Format(String),

    #[error("Passage sheet must contain exactly 1 row (found {0})")]
    RowCount(usize),

    /// Cells that could not be coerced into the import contract
    #[error("{} problem(s) found in the spreadsheet", .0.len())]
    Fields(Vec<ValidationIssue>),

    /// The validation call itself failed (network, auth, server)
    #[error("Validation request failed: {0}")]
    RemoteValidation(String),

    /// The validation call succeeded and reported problems
    #[error("Validation rejected the batch with {} error(s)", .0.len())]
    ValidationRejected(Vec<ValidationIssue>),

    #[error("Import failed: {0}")]
    RemoteImport(String),

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: ImportState, to: ImportState },
}

impl ImportError {
    /// Problems to show the user, one line each
    pub fn issues(&self) -> Vec<ValidationIssue> {
        match self {
            ImportError::Fields(issues) | ImportError::ValidationRejected(issues) => issues.clone(),
            other => vec![ValidationIssue::general(other.to_string())],
        }
    }

    /// True for errors raised before any remote call
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ImportError::Format(_) | ImportError::RowCount(_) | ImportError::Fields(_)
        )
    }
}
