//! Trellis Search - Query and similarity search over the knowledge graph
//!
//! Provides filtered, ordered, paginated queries and cosine-similarity
//! ranking over node vectors. Both engines are stateless and read through
//! a `GraphView`.

pub mod error;
pub mod ordering;
pub mod query;
pub mod vector;

pub use error::{SearchError, SearchResult};
pub use ordering::SortKey;
pub use query::QueryEngine;
pub use vector::{cosine_similarity, SimilarityHit, VectorSearchEngine};
