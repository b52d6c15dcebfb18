//! Search error types

use thiserror::Error;
use trellis_core::limits::ValidationError;

/// Result type alias for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Search-specific error types
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Vector search is disabled")]
    VectorSearchDisabled,

    #[error("Invalid query vector: {0}")]
    InvalidVector(#[from] ValidationError),

    #[error("Query error: {0}")]
    Query(String),
}

impl From<SearchError> for trellis_core::Error {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::VectorSearchDisabled => trellis_core::Error::Unsupported(e.to_string()),
            SearchError::InvalidVector(_) | SearchError::Query(_) => {
                trellis_core::Error::Validation(e.to_string())
            }
        }
    }
}
