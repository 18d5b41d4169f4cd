//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use rbx_wizard_api::ApiError;

/// Core layer error type
///
/// The `Display` text of the feature-layer variants (`NoStatementColumns` and below) is
/// shown to the user as is.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Backend request failed
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Column id already in use
    #[error("Duplicate column id: {0}")]
    DuplicateColumn(String),

    /// Removing the column would leave the workbench empty
    #[error("Cannot remove the last column")]
    LastColumn,

    /// The column exists but is of another kind
    #[error("Column {id} is not a {expected} column")]
    ColumnKindMismatch { id: String, expected: String },

    #[error("No statement columns are open. Please open a statement first.")]
    NoStatementColumns,

    #[error(
        "No statements are selected. Please select a statement in one of the statement columns."
    )]
    NoStatementSelected,

    #[error(
        "Multiple different statements are selected. Please ensure only one statement is selected across all columns."
    )]
    MultipleStatementsSelected,

    #[error("Statement not found in the statements list.")]
    StatementNotFound(String),

    /// A required source could not be fetched or was empty (`"statement content"`, ...)
    #[error("Failed to fetch {0}.")]
    MissingContent(String),
}

impl CoreError {
    /// Whether it is expected behavior (user input, absent resource, etc.), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Update this method when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ValidationError(_)
            | Self::ColumnNotFound(_)
            | Self::DuplicateColumn(_)
            | Self::LastColumn
            | Self::ColumnKindMismatch { .. }
            | Self::NoStatementColumns
            | Self::NoStatementSelected
            | Self::MultipleStatementsSelected
            | Self::StatementNotFound(_)
            | Self::MissingContent(_) => true,
            Self::Api(e) => e.is_expected(),
            Self::StorageError(_) | Self::SerializationError(_) => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
