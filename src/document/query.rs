//! Pattern search and replacement
//!
//! Search text is a regular expression, matched case-insensitively unless the
//! caller asks otherwise. Replacement strings may refer to capture groups
//! with `$1` / `${name}`.

use regex::{Regex, RegexBuilder};

use crate::error::{DocError, Result};

/// Compile a caller-supplied search pattern
pub fn compile_pattern(search_text: &str, match_case: bool) -> Result<Regex> {
    if search_text.is_empty() {
        return Err(DocError::invalid_argument("search text must not be empty"));
    }

    Ok(RegexBuilder::new(search_text)
        .case_insensitive(!match_case)
        .build()?)
}

/// Replace every match in `text`, returning the new text and the match count
pub fn replace_all(text: &str, pattern: &Regex, replacement: &str) -> (String, usize) {
    let count = pattern.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (pattern.replace_all(text, replacement).into_owned(), count)
}

/// First `max_chars` characters followed by an ellipsis
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Replace matches paragraph by paragraph, keeping every other block intact.
///
/// A paragraph with matches has its rewritten text stored in its first text
/// node and its remaining text nodes emptied, so run formatting after the
/// first run is not preserved for that paragraph. Returns the match count.
pub fn replace_in_document(
    docx: &mut docx_rs::Docx,
    pattern: &Regex,
    replacement: &str,
) -> usize {
    let mut count = 0;

    for child in docx.document.children.iter_mut() {
        match child {
            docx_rs::DocumentChild::Paragraph(para) => {
                count += replace_in_paragraph(para, pattern, replacement);
            }
            docx_rs::DocumentChild::Table(table) => {
                for table_child in table.rows.iter_mut() {
                    let docx_rs::TableChild::TableRow(row) = table_child;
                    for row_child in row.cells.iter_mut() {
                        let docx_rs::TableRowChild::TableCell(cell) = row_child;
                        for content in cell.children.iter_mut() {
                            if let docx_rs::TableCellContent::Paragraph(para) = content {
                                count += replace_in_paragraph(para, pattern, replacement);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    count
}

fn replace_in_paragraph(
    para: &mut docx_rs::Paragraph,
    pattern: &Regex,
    replacement: &str,
) -> usize {
    let (count, leftover) = {
        let mut texts = Vec::new();
        collect_texts(&mut para.children, &mut texts);
        let joined: String = texts.iter().map(|t| t.as_str()).collect();

        let count = pattern.find_iter(&joined).count();
        if count == 0 {
            return 0;
        }
        let replaced = pattern.replace_all(&joined, replacement).into_owned();

        match texts.split_first_mut() {
            Some((first, rest)) => {
                **first = replaced;
                for text in rest {
                    text.clear();
                }
                (count, None)
            }
            None => (count, Some(replaced)),
        }
    };

    // Only zero-width matches can hit a paragraph without text nodes
    if let Some(text) = leftover.filter(|t| !t.is_empty()) {
        let taken = std::mem::replace(para, docx_rs::Paragraph::new());
        *para = taken.add_run(docx_rs::Run::new().add_text(text));
    }

    count
}

fn collect_texts<'a>(
    children: &'a mut [docx_rs::ParagraphChild],
    out: &mut Vec<&'a mut String>,
) {
    for child in children.iter_mut() {
        match child {
            docx_rs::ParagraphChild::Run(run) => collect_run_texts(run, out),
            docx_rs::ParagraphChild::Insert(insert) => {
                for child in insert.children.iter_mut() {
                    if let docx_rs::InsertChild::Run(run) = child {
                        collect_run_texts(run, out);
                    }
                }
            }
            docx_rs::ParagraphChild::Hyperlink(link) => collect_texts(&mut link.children, out),
            _ => {}
        }
    }
}

fn collect_run_texts<'a>(run: &'a mut docx_rs::Run, out: &mut Vec<&'a mut String>) {
    for child in run.children.iter_mut() {
        if let docx_rs::RunChild::Text(text) = child {
            out.push(&mut text.text);
        }
    }
}
