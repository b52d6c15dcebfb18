//! Trellis Storage - Entity store and persistence for the knowledge graph
//!
//! This crate owns the authoritative node and relationship maps, merges
//! imported snapshots into them, and reads and writes snapshots as JSON,
//! CSV or GraphML.

pub mod error;
pub mod format;
pub mod merge;
pub mod sink;
pub mod store;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use format::{read_graph, write_atomic, write_graph, ExportFormat};
pub use merge::{ImportReport, MergeStrategy};
pub use sink::{CsvDirSink, JsonFileSink};
pub use store::EntityStore;
pub use traits::PersistenceSink;
