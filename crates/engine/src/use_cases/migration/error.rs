//! Migration error type.

use thiserror::Error;

use dossier_domain::DomainError;

use crate::infrastructure::ports::StoreError;

/// Errors surfaced by the migration engine.
///
/// Per-document variants (malformed input, missing schema model, host
/// rejection) are caught at the orchestrator's per-document boundary, logged
/// with the document's name, and never abort the pass.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
