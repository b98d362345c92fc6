//! Core data structures for document operations
//!
//! This module defines the transient document tree handed to the codec,
//! the option structs each operation accepts and the derived
//! [`DocumentInfo`] snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One inch in twentieths of a point
pub const DEFAULT_MARGIN_TWIPS: u32 = 1440;

/// In-memory document built fresh for every operation.
///
/// Built bottom-up (runs into paragraphs, cells into rows into tables) and
/// consumed by the codec. Nothing edits a tree after it is built; each
/// operation assembles a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTree {
    pub metadata: DocumentMetadata,
    pub page_margins: Option<PageMargins>,
    pub blocks: Vec<Block>,
}

impl DocumentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_page_margins(mut self, margins: PageMargins) -> Self {
        self.page_margins = Some(margins);
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(ParagraphSpec),
    Table(TableSpec),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphSpec {
    pub text: String,
    pub style: Option<String>,
    pub alignment: Option<Alignment>,
    /// Font size in points
    pub font_size: Option<f32>,
    pub bold: bool,
    pub italic: bool,
}

impl ParagraphSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

impl From<ParagraphOptions> for ParagraphSpec {
    fn from(options: ParagraphOptions) -> Self {
        Self {
            text: options.text,
            style: options.style,
            alignment: options.alignment,
            font_size: options.font_size,
            bold: options.bold.unwrap_or(false),
            italic: options.italic.unwrap_or(false),
        }
    }
}

/// Rectangular table with an optional header row.
///
/// `cells` always holds `rows` entries of exactly `cols` strings.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub rows: usize,
    pub cols: usize,
    pub headers: Option<Vec<String>>,
    pub cells: Vec<Vec<String>>,
}

impl TableSpec {
    /// Build a `rows` x `cols` grid from ragged input, padding with empty strings
    pub fn from_grid(
        rows: usize,
        cols: usize,
        headers: Option<&[String]>,
        data: Option<&[Vec<String>]>,
    ) -> Self {
        let cells = (0..rows)
            .map(|r| {
                (0..cols)
                    .map(|c| {
                        data.and_then(|d| d.get(r))
                            .and_then(|row| row.get(c))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        let headers = headers.map(|h| {
            (0..cols)
                .map(|c| h.get(c).cloned().unwrap_or_default())
                .collect()
        });

        Self {
            rows,
            cols,
            headers,
            cells,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.cells.get(row)?.get(col).map(String::as_str)
    }
}

/// Page margins in twentieths of a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMargins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            top: DEFAULT_MARGIN_TWIPS,
            right: DEFAULT_MARGIN_TWIPS,
            bottom: DEFAULT_MARGIN_TWIPS,
            left: DEFAULT_MARGIN_TWIPS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
}

impl DocumentMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_empty()
    }
}

/// Paragraph alignment names accepted by the tool surfaces
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Start,
    End,
    Both,
    Distribute,
    MediumKashida,
    HighKashida,
    LowKashida,
    ThaiDistribute,
    NumTab,
}

impl Alignment {
    pub const ALL: [&'static str; 12] = [
        "left",
        "center",
        "right",
        "start",
        "end",
        "both",
        "distribute",
        "mediumKashida",
        "highKashida",
        "lowKashida",
        "thaiDistribute",
        "numTab",
    ];
}

// Operation inputs

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptions {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl From<CreateOptions> for DocumentMetadata {
    fn from(options: CreateOptions) -> Self {
        Self {
            title: options.title,
            author: options.author,
            subject: options.subject,
            keywords: options.keywords,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphOptions {
    pub text: String,
    pub style: Option<String>,
    pub alignment: Option<Alignment>,
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    pub rows: i64,
    pub cols: i64,
    pub headers: Option<Vec<String>>,
    pub data: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReplaceOptions {
    pub search_text: String,
    pub replace_text: String,
    pub match_case: Option<bool>,
}

/// Requested margins; unset sides fall back to one inch
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MarginOptions {
    pub top: Option<i64>,
    pub right: Option<i64>,
    pub bottom: Option<i64>,
    pub left: Option<i64>,
}

// Operation outputs

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDocument {
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSummary {
    pub match_count: usize,
    pub preview: String,
}

/// Read-only snapshot derived from a document's text and file metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: Vec<String>,
    pub page_count: usize,
    pub word_count: usize,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}
