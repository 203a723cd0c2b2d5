//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Coarse classification of a [`SearchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The index engine or a session could not be initialized
    Configuration,
    /// Raw query text that cannot be turned into either query shape
    QueryConstruction,
    /// The engine failed while executing a query
    Execution,
    /// Index maintenance (add, update, delete) failed
    Indexing,
}

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Index initialization failed
    #[error("Index initialization failed: {0}")]
    IndexInitFailed(String),

    /// A search session could not be acquired
    #[error("Search session unavailable: {0}")]
    SessionUnavailable(String),

    /// Raw query text could not be turned into a structured query
    #[error("Query construction failed: {0}")]
    QueryConstructionFailed(String),

    /// Search execution failed
    #[error("Search execution failed: {0}")]
    SearchFailed(String),

    /// Document indexing failed
    #[error("Document indexing failed: {0}")]
    IndexingFailed(String),

    /// Document deletion failed
    #[error("Document deletion failed: {0}")]
    DeletionFailed(String),

    /// Schema error
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The engine failed while running a query or loading a document
    #[error("Tantivy error: {0}")]
    TantivyError(String),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::IndexInitFailed(_)
            | SearchError::SessionUnavailable(_)
            | SearchError::SchemaError(_)
            | SearchError::InvalidConfiguration(_) => ErrorKind::Configuration,
            SearchError::QueryConstructionFailed(_) => ErrorKind::QueryConstruction,
            SearchError::SearchFailed(_) | SearchError::TantivyError(_) => ErrorKind::Execution,
            SearchError::IndexingFailed(_) | SearchError::DeletionFailed(_) => ErrorKind::Indexing,
        }
    }

    pub fn is_configuration_failure(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(err: tantivy::TantivyError) -> Self {
        SearchError::TantivyError(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            SearchError::IndexInitFailed(msg) | SearchError::SessionUnavailable(msg) => {
                AppError::Configuration(msg)
            }
            SearchError::QueryConstructionFailed(msg) => AppError::Validation(msg),
            _ => AppError::Internal(err.to_string()),
        }
    }
}
