//! Storage error types

use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(String),

    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    #[error("Duplicate relationship: {0}")]
    DuplicateRelationship(String),

    #[error("Relationship endpoint does not exist: {0}")]
    MissingEndpoint(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Persistence timed out after {0} ms")]
    Timeout(u64),
}

impl From<StorageError> for trellis_core::Error {
    fn from(e: StorageError) -> Self {
        use trellis_core::Error;

        match e {
            StorageError::NodeNotFound(id) => Error::NodeNotFound(id),
            StorageError::RelationshipNotFound(id) => Error::RelationshipNotFound(id),
            StorageError::DuplicateNode(_)
            | StorageError::DuplicateRelationship(_)
            | StorageError::MissingEndpoint(_)
            | StorageError::UnknownFormat(_) => Error::Validation(e.to_string()),
            StorageError::Serialization(inner) => Error::Serialization(inner),
            StorageError::Io(inner) => Error::Io(inner),
            StorageError::Malformed(_)
            | StorageError::Csv(_)
            | StorageError::Xml(_)
            | StorageError::Timeout(_) => Error::Persistence(e.to_string()),
        }
    }
}
