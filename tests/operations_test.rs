use docx_tools::config::{DocumentConfig, EditMode};
use docx_tools::document::io::read_part;
use docx_tools::document::{
    CreateOptions, MarginOptions, PageMargins, ParagraphOptions, SearchReplaceOptions,
    TableOptions, read_core_properties, read_page_margins,
};
use docx_tools::{DocError, DocumentOperations};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn operations(mode: EditMode) -> DocumentOperations {
    DocumentOperations::new(DocumentConfig {
        edit_mode: mode,
        ..Default::default()
    })
}

async fn new_document(ops: &DocumentOperations, dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    ops.create_document(&path, CreateOptions::default())
        .await
        .expect("Failed to create test document");
    path
}

fn paragraph(text: &str) -> ParagraphOptions {
    ParagraphOptions {
        text: text.to_string(),
        ..Default::default()
    }
}

/// Cell text of the first table in the document, row by row
fn first_table(path: &Path) -> Vec<Vec<String>> {
    let bytes = std::fs::read(path).unwrap();
    let docx = docx_rs::read_docx(&bytes).unwrap();

    for child in &docx.document.children {
        if let docx_rs::DocumentChild::Table(table) = child {
            let mut rows = Vec::new();
            for table_child in &table.rows {
                let docx_rs::TableChild::TableRow(row) = table_child;
                let mut cells = Vec::new();
                for row_child in &row.cells {
                    let docx_rs::TableRowChild::TableCell(cell) = row_child;
                    let mut text = String::new();
                    for content in &cell.children {
                        if let docx_rs::TableCellContent::Paragraph(para) = content {
                            for para_child in &para.children {
                                if let docx_rs::ParagraphChild::Run(run) = para_child {
                                    for run_child in &run.children {
                                        if let docx_rs::RunChild::Text(t) = run_child {
                                            text.push_str(&t.text);
                                        }
                                    }
                                }
                            }
                        }
                    }
                    cells.push(text);
                }
                rows.push(cells);
            }
            return rows;
        }
    }

    panic!("document has no table");
}

#[cfg(test)]
mod create_and_open_tests {
    use super::*;

    #[tokio::test]
    async fn test_created_document_opens_empty() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "blank.docx").await;

        let opened = ops.open_document(&path).await.unwrap();
        assert!(
            opened.content.trim().is_empty(),
            "New document should have no visible text, got {:?}",
            opened.content
        );
    }

    #[tokio::test]
    async fn test_create_reports_path_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.docx");
        std::fs::write(&path, b"stale bytes").unwrap();

        let ops = operations(EditMode::Append);
        let created = ops
            .create_document(&path, CreateOptions::default())
            .await
            .unwrap();

        assert_eq!(created.file_path, path.display().to_string());
        assert!(ops.open_document(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_writes_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.docx");
        let ops = operations(EditMode::Append);

        ops.create_document(
            &path,
            CreateOptions {
                title: Some("Annual Report".to_string()),
                author: Some("Finance Team".to_string()),
                subject: Some("Revenue".to_string()),
                keywords: vec!["2024".to_string(), "revenue".to_string()],
            },
        )
        .await
        .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let metadata = read_core_properties(&bytes).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Annual Report"));
        assert_eq!(metadata.author.as_deref(), Some("Finance Team"));
        assert_eq!(metadata.subject.as_deref(), Some("Revenue"));
        assert_eq!(metadata.keywords, vec!["2024", "revenue"]);
    }

    #[tokio::test]
    async fn test_create_uses_one_inch_margins() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "margins.docx").await;

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(read_page_margins(&bytes).unwrap(), Some(PageMargins::default()));
    }

    #[tokio::test]
    async fn test_open_non_docx_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.docx");
        std::fs::write(&path, "just some text").unwrap();

        let err = operations(EditMode::Append)
            .open_document(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, DocError::Decode(_)), "got {err:?}");
    }
}

#[cfg(test)]
mod metadata_tests {
    use super::*;

    async fn titled_document(ops: &DocumentOperations, dir: &TempDir) -> PathBuf {
        let path = dir.path().join("titled.docx");
        ops.create_document(
            &path,
            CreateOptions {
                title: Some("T1".to_string()),
                author: Some("A1".to_string()),
                subject: Some("S1".to_string()),
                keywords: vec!["k1".to_string(), "k2".to_string()],
            },
        )
        .await
        .unwrap();
        path
    }

    fn assert_metadata_kept(path: &Path) {
        let bytes = std::fs::read(path).unwrap();
        let metadata = read_core_properties(&bytes).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("T1"));
        assert_eq!(metadata.author.as_deref(), Some("A1"));
        assert_eq!(metadata.subject.as_deref(), Some("S1"));
        assert_eq!(metadata.keywords, vec!["k1", "k2"]);
    }

    #[tokio::test]
    async fn test_append_edits_keep_core_properties() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = titled_document(&ops, &dir).await;

        ops.add_paragraph(&path, paragraph("foo")).await.unwrap();
        assert_metadata_kept(&path);

        ops.add_table(
            &path,
            TableOptions {
                rows: 1,
                cols: 1,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_metadata_kept(&path);

        ops.set_page_margins(&path, MarginOptions::default())
            .await
            .unwrap();
        assert_metadata_kept(&path);

        let summary = ops
            .search_and_replace(
                &path,
                SearchReplaceOptions {
                    search_text: "foo".into(),
                    replace_text: "bar".into(),
                    match_case: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(summary.match_count, 1);
        assert_metadata_kept(&path);
    }

    #[tokio::test]
    async fn test_replace_mode_drops_core_properties() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Replace);
        let path = titled_document(&ops, &dir).await;

        ops.add_paragraph(&path, paragraph("fresh")).await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let metadata = read_core_properties(&bytes).unwrap();
        assert_ne!(metadata.title.as_deref(), Some("T1"));
    }
}

#[cfg(test)]
mod paragraph_tests {
    use super::*;

    #[tokio::test]
    async fn test_append_mode_keeps_existing_paragraphs() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "append.docx").await;

        ops.add_paragraph(&path, paragraph("first")).await.unwrap();
        ops.add_paragraph(&path, paragraph("second")).await.unwrap();

        let content = ops.open_document(&path).await.unwrap().content;
        let first = content.find("first").expect("first paragraph kept");
        let second = content.find("second").expect("second paragraph added");
        assert!(first < second, "Paragraphs should stay in order");
    }

    #[tokio::test]
    async fn test_replace_mode_discards_existing_paragraphs() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Replace);
        let path = new_document(&ops, &dir, "replace.docx").await;

        ops.add_paragraph(&path, paragraph("first")).await.unwrap();
        ops.add_paragraph(&path, paragraph("second")).await.unwrap();

        let content = ops.open_document(&path).await.unwrap().content;
        assert_eq!(content, "second\n\n");
    }

    #[tokio::test]
    async fn test_paragraph_formatting_is_encoded() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Replace);
        let path = new_document(&ops, &dir, "styled.docx").await;

        ops.add_paragraph(
            &path,
            ParagraphOptions {
                text: "Heading text".to_string(),
                style: Some("Heading1".to_string()),
                alignment: Some(docx_tools::document::Alignment::Center),
                font_size: Some(14.0),
                bold: Some(true),
                italic: None,
            },
        )
        .await
        .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let xml = read_part(&bytes, "word/document.xml").unwrap();
        assert!(xml.contains(r#"w:pStyle w:val="Heading1""#));
        assert!(xml.contains(r#"w:jc w:val="center""#));
        assert!(xml.contains(r#"w:sz w:val="28""#), "14pt is 28 half-points");
        assert!(xml.contains("Heading text"));
    }

    #[tokio::test]
    async fn test_non_positive_font_size_rejected() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "font.docx").await;

        let err = ops
            .add_paragraph(
                &path,
                ParagraphOptions {
                    text: "x".to_string(),
                    font_size: Some(0.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DocError::InvalidArgument(_)));
    }
}

#[cfg(test)]
mod table_tests {
    use super::*;

    #[tokio::test]
    async fn test_ragged_data_padded_with_empty_cells() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Replace);
        let path = new_document(&ops, &dir, "table.docx").await;

        ops.add_table(
            &path,
            TableOptions {
                rows: 2,
                cols: 3,
                headers: None,
                data: Some(vec![
                    vec!["a".into(), "b".into(), "c".into()],
                    vec!["d".into(), "e".into()],
                ]),
            },
        )
        .await
        .unwrap();

        let table = first_table(&path);
        assert_eq!(table.len(), 2);
        assert!(table.iter().all(|row| row.len() == 3));
        assert_eq!(table[0], vec!["a", "b", "c"]);
        assert_eq!(table[1][2], "");
    }

    #[tokio::test]
    async fn test_header_row_precedes_data() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "headers.docx").await;

        ops.add_table(
            &path,
            TableOptions {
                rows: 1,
                cols: 2,
                headers: Some(vec!["Name".into(), "Qty".into(), "Extra".into()]),
                data: Some(vec![vec!["apple".into(), "3".into()]]),
            },
        )
        .await
        .unwrap();

        let table = first_table(&path);
        assert_eq!(table, vec![vec!["Name", "Qty"], vec!["apple", "3"]]);
    }

    #[tokio::test]
    async fn test_append_mode_keeps_prior_text() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "mixed.docx").await;

        ops.add_paragraph(&path, paragraph("intro")).await.unwrap();
        ops.add_table(
            &path,
            TableOptions {
                rows: 1,
                cols: 1,
                headers: None,
                data: Some(vec![vec!["cell".into()]]),
            },
        )
        .await
        .unwrap();

        let content = ops.open_document(&path).await.unwrap().content;
        assert!(content.contains("intro"));
        assert!(content.contains("cell"));
    }

    #[tokio::test]
    async fn test_negative_dimensions_rejected() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "neg.docx").await;

        let err = ops
            .add_table(
                &path,
                TableOptions {
                    rows: -1,
                    cols: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DocError::InvalidArgument(_)));
    }
}

#[cfg(test)]
mod search_replace_tests {
    use super::*;

    async fn document_with_text(
        mode: EditMode,
        text: &str,
    ) -> (TempDir, PathBuf, DocumentOperations) {
        let dir = TempDir::new().unwrap();
        let ops = operations(mode);
        let path = new_document(&ops, &dir, "search.docx").await;
        ops.add_paragraph(&path, paragraph(text)).await.unwrap();
        (dir, path, ops)
    }

    fn options(search: &str, replace: &str, match_case: Option<bool>) -> SearchReplaceOptions {
        SearchReplaceOptions {
            search_text: search.to_string(),
            replace_text: replace.to_string(),
            match_case,
        }
    }

    #[tokio::test]
    async fn test_replace_mode_count_and_preview() {
        let (_dir, path, ops) = document_with_text(EditMode::Replace, "foo bar foo").await;

        let summary = ops
            .search_and_replace(&path, options("foo", "baz", Some(true)))
            .await
            .unwrap();

        assert_eq!(summary.match_count, 2);
        assert!(summary.preview.starts_with("baz bar baz"));
        assert!(summary.preview.ends_with("..."));

        let content = ops.open_document(&path).await.unwrap().content;
        assert!(content.starts_with("baz bar baz"));
    }

    #[tokio::test]
    async fn test_case_insensitive_unless_requested() {
        let (_dir, path, ops) = document_with_text(EditMode::Replace, "foo bar foo").await;

        let exact = ops
            .search_and_replace(&path, options("FOO", "x", Some(true)))
            .await
            .unwrap();
        assert_eq!(exact.match_count, 0);

        let loose = ops
            .search_and_replace(&path, options("FOO", "x", None))
            .await
            .unwrap();
        assert_eq!(loose.match_count, 2);
    }

    #[tokio::test]
    async fn test_append_mode_keeps_tables() {
        let (_dir, path, ops) = document_with_text(EditMode::Append, "foo bar foo").await;
        ops.add_table(
            &path,
            TableOptions {
                rows: 1,
                cols: 2,
                headers: None,
                data: Some(vec![vec!["foo".into(), "other".into()]]),
            },
        )
        .await
        .unwrap();

        let summary = ops
            .search_and_replace(&path, options("foo", "baz", Some(true)))
            .await
            .unwrap();
        assert_eq!(summary.match_count, 3);
        assert!(summary.preview.contains("baz bar baz"));

        let table = first_table(&path);
        assert_eq!(table, vec![vec!["baz", "other"]]);
    }

    #[tokio::test]
    async fn test_count_covers_matches_across_paragraphs() {
        let (_dir, path, ops) = document_with_text(EditMode::Append, "foo").await;
        let before = ops.open_document(&path).await.unwrap().content;
        assert_eq!(before, "\n\nfoo\n\n");

        let summary = ops
            .search_and_replace(&path, options(r"foo\s+", "x", Some(true)))
            .await
            .unwrap();
        assert_eq!(summary.match_count, 1);

        // Same count as a whole-text replacement over the extracted content
        let (_dir, path, ops) = document_with_text(EditMode::Replace, "foo").await;
        let summary = ops
            .search_and_replace(&path, options(r"foo\s+", "x", Some(true)))
            .await
            .unwrap();
        assert_eq!(summary.match_count, 1);
    }

    #[tokio::test]
    async fn test_count_includes_breaks_between_paragraphs() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "split.docx").await;
        ops.add_paragraph(&path, paragraph("end of one")).await.unwrap();
        ops.add_paragraph(&path, paragraph("start of two")).await.unwrap();

        let summary = ops
            .search_and_replace(&path, options(r"one\s+start", "joined", Some(true)))
            .await
            .unwrap();
        assert_eq!(summary.match_count, 1);

        // Paragraph-level rewriting cannot join paragraphs, so the text stays
        let content = ops.open_document(&path).await.unwrap().content;
        assert!(content.contains("end of one\n\nstart of two"));
    }

    #[tokio::test]
    async fn test_malformed_pattern_is_invalid_argument() {
        let (_dir, path, ops) = document_with_text(EditMode::Append, "text").await;

        let err = ops
            .search_and_replace(&path, options("[unclosed", "x", None))
            .await
            .unwrap_err();
        assert!(matches!(err, DocError::InvalidArgument(_)));
    }
}

#[cfg(test)]
mod margin_tests {
    use super::*;

    #[tokio::test]
    async fn test_unset_margins_default_to_one_inch() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Replace);
        let path = new_document(&ops, &dir, "default.docx").await;

        ops.set_page_margins(&path, MarginOptions::default())
            .await
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(read_page_margins(&bytes).unwrap(), Some(PageMargins::default()));
    }

    #[tokio::test]
    async fn test_partial_margins_keep_text_in_append_mode() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "partial.docx").await;
        ops.add_paragraph(&path, paragraph("body")).await.unwrap();

        ops.set_page_margins(
            &path,
            MarginOptions {
                top: Some(720),
                left: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(
            read_page_margins(&bytes).unwrap(),
            Some(PageMargins {
                top: 720,
                right: 1440,
                bottom: 1440,
                left: 0,
            })
        );
        assert!(ops.open_document(&path).await.unwrap().content.contains("body"));
    }

    #[tokio::test]
    async fn test_negative_margin_rejected() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "neg.docx").await;

        let err = ops
            .set_page_margins(
                &path,
                MarginOptions {
                    bottom: Some(-5),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DocError::InvalidArgument(_)));
    }
}

#[cfg(test)]
mod info_tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_derived_from_text() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Replace);
        let path = new_document(&ops, &dir, "long report.docx").await;

        let body = "word ".repeat(700);
        ops.add_paragraph(&path, paragraph(&body)).await.unwrap();

        let text = ops.open_document(&path).await.unwrap().content;
        let info = ops.get_document_info(&path).await.unwrap();

        assert_eq!(info.title, "long report.docx");
        assert_eq!(info.author, "Unknown");
        assert_eq!(info.subject, "");
        assert!(info.keywords.is_empty());
        assert_eq!(info.word_count, 700);
        assert_eq!(info.page_count, text.chars().count().div_ceil(3000));
        assert_eq!(info.page_count, 2);
        assert!(info.modified.timestamp() > 0);
    }

    #[tokio::test]
    async fn test_empty_document_has_no_words() {
        let dir = TempDir::new().unwrap();
        let ops = operations(EditMode::Append);
        let path = new_document(&ops, &dir, "empty.docx").await;

        let info = ops.get_document_info(&path).await.unwrap();
        assert_eq!(info.word_count, 0);
    }
}

#[cfg(test)]
mod missing_file_tests {
    use super::*;

    fn missing() -> PathBuf {
        PathBuf::from("/nonexistent/docx-tools/missing.docx")
    }

    fn assert_io(err: DocError) {
        assert!(matches!(err, DocError::Io(_)), "expected io error, got {err:?}");
    }

    #[tokio::test]
    async fn test_every_operation_reports_io_error() {
        for mode in [EditMode::Append, EditMode::Replace] {
            let ops = operations(mode);
            let path = missing();

            assert_io(
                ops.create_document(&path, CreateOptions::default())
                    .await
                    .unwrap_err(),
            );
            assert_io(ops.open_document(&path).await.unwrap_err());
            assert_io(ops.add_paragraph(&path, paragraph("x")).await.unwrap_err());
            assert_io(
                ops.add_table(
                    &path,
                    TableOptions {
                        rows: 1,
                        cols: 1,
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err(),
            );
            assert_io(
                ops.search_and_replace(
                    &path,
                    SearchReplaceOptions {
                        search_text: "x".into(),
                        replace_text: "y".into(),
                        match_case: None,
                    },
                )
                .await
                .unwrap_err(),
            );
            assert_io(
                ops.set_page_margins(&path, MarginOptions::default())
                    .await
                    .unwrap_err(),
            );
            assert_io(ops.get_document_info(&path).await.unwrap_err());
        }
    }
}
