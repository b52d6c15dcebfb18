//! Trellis Service - façade over the knowledge graph engine
//!
//! Wraps the entity store, query, search, traversal and path-finding
//! components behind one lifecycle-managed, lock-protected API, plus a
//! JSON request envelope for callers that speak JSON.

pub mod config;
mod persist;
pub mod request;
pub mod service;

pub use config::{ConfigError, PersistFormat, ServiceConfig};
pub use request::{ErrorBody, GraphRequest, GraphResponse};
pub use service::{ExportSummary, GraphService};
