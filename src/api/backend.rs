//! Seam between the import flow and the remote procedures

use async_trait::async_trait;

use super::models::ValidationReport;
use crate::import::ImportBatch;

/// The two remote procedures an import needs
///
/// [`crate::api::BackendClient`] implements this over HTTP; tests substitute
/// an in-memory double.
#[async_trait]
pub trait ImportBackend: Send + Sync {
    /// `validate_import_passage_with_questions`
    async fn validate_batch(&self, batch: &ImportBatch) -> anyhow::Result<ValidationReport>;

    /// `import_passage_with_questions_bulk`
    async fn import_batch(&self, batch: &ImportBatch) -> anyhow::Result<()>;
}
