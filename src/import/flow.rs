//! Upload → validate → import sequence

use log::{debug, info, warn};
use std::fmt;

use super::error::ImportError;
use super::payload::ImportBatch;
use super::rows::RawBatch;
use super::sheet::parse_workbook;
use super::transform::transform_batch;
use crate::api::backend::ImportBackend;
use crate::api::models::ValidationIssue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportState {
    Idle,
    Parsing,
    Validating,
    ValidationFailed,
    ValidationSuccess,
    Importing,
    ImportSuccess,
    ImportFailed,
}

impl ImportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportState::Idle => "idle",
            ImportState::Parsing => "parsing",
            ImportState::Validating => "validating",
            ImportState::ValidationFailed => "validation_failed",
            ImportState::ValidationSuccess => "validation_success",
            ImportState::Importing => "importing",
            ImportState::ImportSuccess => "import_success",
            ImportState::ImportFailed => "import_failed",
        }
    }

    /// Edges of the import sequence
    ///
    /// A new upload may start from anywhere. A batch that failed validation or
    /// import can be validated again, never imported directly.
    pub fn can_transition_to(self, next: ImportState) -> bool {
        use ImportState::*;

        matches!(
            (self, next),
            (_, Parsing)
                | (Parsing, Validating)
                | (Parsing, ValidationFailed)
                | (Validating, ValidationSuccess)
                | (Validating, ValidationFailed)
                | (ValidationSuccess, Importing)
                | (Importing, ImportSuccess)
                | (Importing, ImportFailed)
                | (ValidationFailed, Validating)
                | (ImportFailed, Validating)
        )
    }
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page-worth of import state: at most one batch, at most one call in flight
pub struct ImportFlow<B> {
    backend: B,
    state: ImportState,
    source: Option<String>,
    batch: Option<ImportBatch>,
    failure: Option<ImportError>,
}

impl<B: ImportBackend> ImportFlow<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: ImportState::Idle,
            source: None,
            batch: None,
            failure: None,
        }
    }

    pub fn state(&self) -> ImportState {
        self.state
    }

    /// File name or other label of the current upload
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn batch(&self) -> Option<&ImportBatch> {
        self.batch.as_ref()
    }

    /// Edit the retained batch before calling [`ImportFlow::revalidate`]
    pub fn batch_mut(&mut self) -> Option<&mut ImportBatch> {
        self.batch.as_mut()
    }

    pub fn failure(&self) -> Option<&ImportError> {
        self.failure.as_ref()
    }

    /// Problems to display for the current state, empty when none
    pub fn errors(&self) -> Vec<ValidationIssue> {
        self.failure.as_ref().map(ImportError::issues).unwrap_or_default()
    }

    /// Start over with an uploaded file and run it through validation
    pub async fn select_file(&mut self, file_name: &str, bytes: &[u8]) -> ImportState {
        self.restart(file_name);

        match parse_workbook(file_name, bytes) {
            Ok(raw) => self.process(raw).await,
            Err(error) => self.fail(ImportState::ValidationFailed, error),
        }

        self.state
    }

    /// Start over with rows gathered some other way (manual entry)
    pub async fn submit_rows(&mut self, source: &str, raw: RawBatch) -> ImportState {
        self.restart(source);
        self.process(raw).await;
        self.state
    }

    /// Import the validated batch
    pub async fn confirm_import(&mut self) -> Result<(), ImportError> {
        self.transition(ImportState::Importing)?;

        let Some(batch) = self.batch.as_ref() else {
            // ValidationSuccess always holds a batch
            let error = ImportError::RemoteImport("No validated batch to import".to_string());
            self.fail(ImportState::ImportFailed, error.clone());
            return Err(error);
        };

        info!(
            "Importing passage with {} questions from {}",
            batch.questions.len(),
            self.source.as_deref().unwrap_or("unknown source")
        );

        let result = self.backend.import_batch(batch).await;
        match result {
            Ok(()) => {
                self.set_state(ImportState::ImportSuccess);
                self.batch = None;
                self.failure = None;
                info!("Import succeeded");
                Ok(())
            }
            Err(e) => {
                let error = ImportError::RemoteImport(e.to_string());
                self.fail(ImportState::ImportFailed, error.clone());
                Err(error)
            }
        }
    }

    /// Send the retained batch (possibly edited) through validation again
    pub async fn revalidate(&mut self) -> Result<ImportState, ImportError> {
        if self.batch.is_none() {
            return Err(ImportError::InvalidTransition {
                from: self.state,
                to: ImportState::Validating,
            });
        }
        self.transition(ImportState::Validating)?;
        self.failure = None;
        self.validate().await;
        Ok(self.state)
    }

    fn restart(&mut self, source: &str) {
        debug!("Restarting import flow from {} for {}", self.state, source);
        self.source = Some(source.to_string());
        self.batch = None;
        self.failure = None;
        self.set_state(ImportState::Parsing);
    }

    async fn process(&mut self, raw: RawBatch) {
        match transform_batch(&raw) {
            Ok(batch) => {
                self.batch = Some(batch);
                self.set_state(ImportState::Validating);
                self.validate().await;
            }
            Err(error) => self.fail(ImportState::ValidationFailed, error),
        }
    }

    async fn validate(&mut self) {
        let Some(batch) = self.batch.as_ref() else {
            return;
        };

        let result = self.backend.validate_batch(batch).await;
        match result {
            Ok(report) if report.is_valid() => {
                info!("Batch passed validation");
                self.set_state(ImportState::ValidationSuccess);
            }
            Ok(report) => {
                let issues = if report.errors.is_empty() {
                    vec![ValidationIssue::general("Batch was rejected without details")]
                } else {
                    report.errors
                };
                self.fail(ImportState::ValidationFailed, ImportError::ValidationRejected(issues));
            }
            Err(e) => {
                self.fail(
                    ImportState::ValidationFailed,
                    ImportError::RemoteValidation(e.to_string()),
                );
            }
        }
    }

    fn transition(&mut self, next: ImportState) -> Result<(), ImportError> {
        if !self.state.can_transition_to(next) {
            return Err(ImportError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.set_state(next);
        Ok(())
    }

    fn set_state(&mut self, next: ImportState) {
        debug_assert!(self.state.can_transition_to(next), "{} -> {}", self.state, next);
        debug!("Import flow: {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, next: ImportState, error: ImportError) {
        warn!("Import flow entering {}: {}", next, error);
        self.set_state(next);
        self.failure = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::ImportState::*;

    #[test]
    fn import_success_is_only_reachable_from_importing() {
        let all = [
            Idle,
            Parsing,
            Validating,
            ValidationFailed,
            ValidationSuccess,
            Importing,
            ImportSuccess,
            ImportFailed,
        ];
        for state in all {
            assert_eq!(state.can_transition_to(ImportSuccess), state == Importing, "{}", state);
            assert_eq!(state.can_transition_to(Importing), state == ValidationSuccess, "{}", state);
        }
    }

    #[test]
    fn new_upload_is_allowed_from_any_state() {
        for state in [Idle, ValidationFailed, ValidationSuccess, ImportSuccess, ImportFailed] {
            assert!(state.can_transition_to(Parsing));
        }
    }

    #[test]
    fn nothing_returns_to_idle() {
        for state in [Parsing, Validating, ValidationFailed, ImportSuccess, ImportFailed] {
            assert!(!state.can_transition_to(Idle));
        }
    }
}
