//! Plain text extraction
//!
//! Recovers best-effort plain text from .docx bytes, discarding styles and
//! structure. Each paragraph is followed by a blank line, which is the layout
//! other raw-text extractors produce and what word counts are measured on.

use crate::error::Result;

use super::codec::decode_container;

/// Turns container bytes into plain text
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// docx-rs backed extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxTextExtractor;

impl TextExtractor for DocxTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let docx = decode_container(bytes)?;
        let text = document_text(&docx);
        tracing::debug!(chars = text.chars().count(), "extracted document text");
        Ok(text)
    }
}

/// Flatten a decoded document into plain text
pub fn document_text(docx: &docx_rs::Docx) -> String {
    let mut text = String::new();

    for child in &docx.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(para) => push_paragraph(&mut text, para),
            docx_rs::DocumentChild::Table(table) => push_table(&mut text, table),
            _ => {}
        }
    }

    text
}

fn push_paragraph(out: &mut String, para: &docx_rs::Paragraph) {
    out.push_str(&paragraph_text(para));
    out.push_str("\n\n");
}

fn push_table(out: &mut String, table: &docx_rs::Table) {
    for table_child in &table.rows {
        let docx_rs::TableChild::TableRow(row) = table_child;
        for row_child in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = row_child;
            for content in &cell.children {
                if let docx_rs::TableCellContent::Paragraph(para) = content {
                    push_paragraph(out, para);
                }
            }
        }
    }
}

/// Text of one paragraph including tracked insertions and hyperlinks
pub(crate) fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    push_children(&mut text, &para.children);
    text
}

fn push_children(out: &mut String, children: &[docx_rs::ParagraphChild]) {
    for child in children {
        match child {
            docx_rs::ParagraphChild::Run(run) => {
                out.push_str(&run_text(run));
            }
            docx_rs::ParagraphChild::Insert(insert) => {
                for child in &insert.children {
                    if let docx_rs::InsertChild::Run(run) = child {
                        out.push_str(&run_text(run));
                    }
                }
            }
            docx_rs::ParagraphChild::Hyperlink(link) => {
                push_children(out, &link.children);
            }
            // Deleted runs are not part of the visible text
            docx_rs::ParagraphChild::Delete(_) => {}
            _ => {}
        }
    }
}

fn run_text(run: &docx_rs::Run) -> String {
    let mut text = String::new();

    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(text_elem) => {
                text.push_str(&text_elem.text);
            }
            docx_rs::RunChild::Tab(_) => {
                text.push('\t');
            }
            docx_rs::RunChild::Break(_) => {
                text.push('\n');
            }
            _ => {}
        }
    }

    text
}
