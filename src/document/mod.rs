//! Document model, container codec and text extraction
//!
//! This module provides the pieces the operation facade is built from:
//! an in-memory document tree, a codec that packs it into a .docx
//! container, and an extractor that recovers plain text from one.

pub mod codec;
pub mod extract;
pub mod io;
pub mod models;
pub mod query;
pub mod stats;

pub use codec::{ContainerCodec, DocxCodec};
pub use extract::{DocxTextExtractor, TextExtractor};
pub use io::{read_core_properties, read_page_margins};
pub use models::*;
