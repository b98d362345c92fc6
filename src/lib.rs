//! docx-tools: Word document operations over stdio and HTTP
//!
//! This library provides a small set of .docx operations (create, open,
//! add paragraph, add table, search and replace, page margins, document
//! info) and the two front ends that expose them as tools.

pub mod config;
pub mod document;
pub mod error;
pub mod mcp;
pub mod operations;
pub mod server;
pub mod tools;

// Re-export commonly used types
pub use config::{Config, EditMode};
pub use document::{DocumentInfo, DocumentTree};
pub use error::DocError;
pub use operations::{DocumentOperations, OperationResult};
