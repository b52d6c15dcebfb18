//! Input validation limits for well-formedness and resource protection

/// Maximum length for node and relationship type tags (128 chars)
pub const MAX_TYPE_LEN: usize = 128;

/// Maximum length for node and relationship ids (256 chars)
pub const MAX_ID_LEN: usize = 256;

/// Maximum nodes in a bulk create (1000)
pub const MAX_BATCH_NODES: usize = 1000;

/// Maximum relationships in a bulk create (1000)
pub const MAX_BATCH_RELATIONSHIPS: usize = 1000;

/// Maximum traversal or path search depth (50)
pub const MAX_TRAVERSAL_DEPTH: u32 = 50;

/// Maximum nodes in a single traversal result (10000)
pub const MAX_TRAVERSAL_NODES: usize = 10000;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyType,
    TypeTooLong { len: usize, max: usize },
    EmptyId,
    IdTooLong { len: usize, max: usize },
    VectorDimensionMismatch { expected: usize, actual: usize },
    VectorNotFinite,
    TooManyNodes { count: usize, max: usize },
    TooManyRelationships { count: usize, max: usize },
    TraversalDepthTooLarge { depth: u32, max: u32 },
    TraversalLimitTooLarge { limit: usize, max: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyType => write!(f, "Type cannot be empty"),
            Self::TypeTooLong { len, max } => {
                write!(f, "Type too long: {} chars (max {})", len, max)
            }
            Self::EmptyId => write!(f, "Id cannot be empty"),
            Self::IdTooLong { len, max } => {
                write!(f, "Id too long: {} chars (max {})", len, max)
            }
            Self::VectorDimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Vector has {} dimensions, expected {}",
                    actual, expected
                )
            }
            Self::VectorNotFinite => write!(f, "Vector contains NaN or infinite values"),
            Self::TooManyNodes { count, max } => {
                write!(f, "Too many nodes in batch: {} (max {})", count, max)
            }
            Self::TooManyRelationships { count, max } => {
                write!(f, "Too many relationships in batch: {} (max {})", count, max)
            }
            Self::TraversalDepthTooLarge { depth, max } => {
                write!(f, "Traversal depth too large: {} (max {})", depth, max)
            }
            Self::TraversalLimitTooLarge { limit, max } => {
                write!(f, "Traversal limit too large: {} (max {})", limit, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a node or relationship type tag
pub fn validate_type(tag: &str) -> Result<(), ValidationError> {
    if tag.trim().is_empty() {
        return Err(ValidationError::EmptyType);
    }
    if tag.len() > MAX_TYPE_LEN {
        return Err(ValidationError::TypeTooLong {
            len: tag.len(),
            max: MAX_TYPE_LEN,
        });
    }
    Ok(())
}

/// Validate an id supplied by a caller or an import file
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::IdTooLong {
            len: id.len(),
            max: MAX_ID_LEN,
        });
    }
    Ok(())
}

/// Validate an embedding against the configured dimension
pub fn validate_vector(vector: &[f32], dimension: usize) -> Result<(), ValidationError> {
    if vector.len() != dimension {
        return Err(ValidationError::VectorDimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(ValidationError::VectorNotFinite);
    }
    Ok(())
}

/// Validate batch node count
pub fn validate_batch_nodes(count: usize) -> Result<(), ValidationError> {
    if count > MAX_BATCH_NODES {
        return Err(ValidationError::TooManyNodes {
            count,
            max: MAX_BATCH_NODES,
        });
    }
    Ok(())
}

/// Validate batch relationship count
pub fn validate_batch_relationships(count: usize) -> Result<(), ValidationError> {
    if count > MAX_BATCH_RELATIONSHIPS {
        return Err(ValidationError::TooManyRelationships {
            count,
            max: MAX_BATCH_RELATIONSHIPS,
        });
    }
    Ok(())
}

/// Validate traversal depth
pub fn validate_traversal_depth(depth: u32) -> Result<(), ValidationError> {
    if depth > MAX_TRAVERSAL_DEPTH {
        return Err(ValidationError::TraversalDepthTooLarge {
            depth,
            max: MAX_TRAVERSAL_DEPTH,
        });
    }
    Ok(())
}

/// Validate traversal result limit
pub fn validate_traversal_limit(limit: usize) -> Result<(), ValidationError> {
    if limit > MAX_TRAVERSAL_NODES {
        return Err(ValidationError::TraversalLimitTooLarge {
            limit,
            max: MAX_TRAVERSAL_NODES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_type() {
        assert!(validate_type("TOPIC").is_ok());
        assert!(validate_type("").is_err());
        assert!(validate_type("   ").is_err());
        assert!(validate_type(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_vector() {
        assert!(validate_vector(&[0.1, 0.2], 2).is_ok());
        assert_eq!(
            validate_vector(&[0.1], 2),
            Err(ValidationError::VectorDimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            validate_vector(&[f32::NAN, 0.0], 2),
            Err(ValidationError::VectorNotFinite)
        );
    }

    #[test]
    fn test_validate_limits() {
        assert!(validate_traversal_depth(3).is_ok());
        assert!(validate_traversal_depth(51).is_err());
        assert!(validate_traversal_limit(100).is_ok());
        assert!(validate_traversal_limit(10_001).is_err());
        assert!(validate_batch_nodes(1000).is_ok());
        assert!(validate_batch_relationships(1001).is_err());
    }
}
