//! Document operations facade
//!
//! Each operation reads what it needs from disk, builds a fresh
//! [`DocumentTree`], hands it to the codec and writes the container back.
//! Nothing is cached between calls, so one instance can be shared by every
//! transport. Concurrent calls on the same path are not coordinated: the
//! last writer wins.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{DocumentConfig, EditMode};
use crate::document::extract::document_text;
use crate::document::io::{read_document_file, write_document_file};
use crate::document::query::{compile_pattern, preview, replace_all, replace_in_document};
use crate::document::stats::{count_words, estimate_page_count};
use crate::document::*;
use crate::error::{DocError, Result};

/// Upper bound on cells in one generated table
const MAX_TABLE_CELLS: usize = 1_000_000;

/// Uniform success/failure envelope returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(Value::Null) => Self {
                success: true,
                data: None,
                error: None,
            },
            Ok(value) => Self {
                success: true,
                data: Some(value),
                error: None,
            },
            Err(e) => Self::failed(format!("failed to encode result: {e}")),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Convert an operation outcome, prefixing failures with what was attempted
    pub fn from_result<T: Serialize>(action: &str, result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(&data),
            Err(err) => {
                tracing::warn!(kind = err.kind(), "{action} failed: {err}");
                Self::failed(format!("failed to {action}: {err}"))
            }
        }
    }
}

/// Stateless facade over the container codec and text extractor
#[derive(Clone)]
pub struct DocumentOperations {
    codec: Arc<dyn ContainerCodec>,
    extractor: Arc<dyn TextExtractor>,
    settings: DocumentConfig,
}

impl std::fmt::Debug for DocumentOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentOperations")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for DocumentOperations {
    fn default() -> Self {
        Self::new(DocumentConfig::default())
    }
}

impl DocumentOperations {
    pub fn new(settings: DocumentConfig) -> Self {
        Self::with_collaborators(settings, Arc::new(DocxCodec), Arc::new(DocxTextExtractor))
    }

    pub fn with_collaborators(
        settings: DocumentConfig,
        codec: Arc<dyn ContainerCodec>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            codec,
            extractor,
            settings,
        }
    }

    pub fn edit_mode(&self) -> EditMode {
        self.settings.edit_mode
    }

    /// Create a document holding one empty paragraph and the given metadata.
    /// Any existing file at `path` is overwritten.
    pub async fn create_document(
        &self,
        path: &Path,
        options: CreateOptions,
    ) -> Result<CreatedDocument> {
        let tree = DocumentTree::new()
            .with_metadata(options.into())
            .with_page_margins(PageMargins::default())
            .with_block(Block::Paragraph(ParagraphSpec::new("").with_style("Normal")));

        self.save(path, docx_rs::Docx::new(), tree).await?;

        tracing::info!(path = %path.display(), "document created");
        Ok(CreatedDocument {
            file_path: path.display().to_string(),
        })
    }

    /// Extract the plain text of a document
    pub async fn open_document(&self, path: &Path) -> Result<DocumentContent> {
        let bytes = read_document_file(path).await?;
        let content = self.extract(bytes).await?;
        Ok(DocumentContent { content })
    }

    pub async fn add_paragraph(&self, path: &Path, options: ParagraphOptions) -> Result<()> {
        if let Some(size) = options.font_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(DocError::invalid_argument(format!(
                    "font size must be a positive number, got {size}"
                )));
            }
        }

        let (base, tree) = self.load_base(path).await?;
        let tree = tree.with_block(Block::Paragraph(ParagraphSpec::from(options)));

        self.save(path, base, tree).await?;
        tracing::info!(path = %path.display(), mode = ?self.edit_mode(), "paragraph added");
        Ok(())
    }

    pub async fn add_table(&self, path: &Path, options: TableOptions) -> Result<()> {
        let rows = dimension("rows", options.rows)?;
        let cols = dimension("cols", options.cols)?;
        if rows.saturating_mul(cols) > MAX_TABLE_CELLS {
            return Err(DocError::invalid_argument(format!(
                "table of {rows}x{cols} exceeds {MAX_TABLE_CELLS} cells"
            )));
        }

        let spec = TableSpec::from_grid(
            rows,
            cols,
            options.headers.as_deref(),
            options.data.as_deref(),
        );

        let (base, tree) = self.load_base(path).await?;
        let tree = tree.with_block(Block::Table(spec));

        self.save(path, base, tree).await?;
        tracing::info!(path = %path.display(), rows, cols, "table added");
        Ok(())
    }

    /// Count matches in the document's plain text and replace them.
    ///
    /// The count always refers to the extracted text. In append mode the
    /// replacement happens paragraph by paragraph, so a match that spans a
    /// paragraph boundary is counted but left in place.
    pub async fn search_and_replace(
        &self,
        path: &Path,
        options: SearchReplaceOptions,
    ) -> Result<ReplaceSummary> {
        let pattern = compile_pattern(&options.search_text, options.match_case.unwrap_or(false))?;
        let bytes = read_document_file(path).await?;

        let mode = self.edit_mode();
        let codec = Arc::clone(&self.codec);
        let extractor = Arc::clone(&self.extractor);
        let replacement = options.replace_text;

        let (text, match_count, rewrite) = run_blocking(move || match mode {
            EditMode::Replace => {
                let content = extractor.extract_text(&bytes)?;
                let (replaced, count) = replace_all(&content, &pattern, &replacement);

                let tree = DocumentTree::new()
                    .with_page_margins(PageMargins::default())
                    .with_block(Block::Paragraph(ParagraphSpec::new(replaced.as_str())));
                Ok((replaced, count, Some((docx_rs::Docx::new(), tree))))
            }
            EditMode::Append => {
                let mut docx = codec.decode(&bytes)?;
                let count = pattern.find_iter(&document_text(&docx)).count();
                let rewritten = replace_in_document(&mut docx, &pattern, &replacement);
                let text = document_text(&docx);

                let rewrite = if rewritten > 0 {
                    let tree = DocumentTree::new().with_metadata(stored_metadata(&bytes));
                    Some((docx, tree))
                } else {
                    None
                };
                Ok((text, count, rewrite))
            }
        })
        .await?;

        if let Some((base, tree)) = rewrite {
            self.save(path, base, tree).await?;
        }

        tracing::debug!(path = %path.display(), match_count, "search and replace finished");
        Ok(ReplaceSummary {
            match_count,
            preview: preview(&text, self.settings.preview_chars),
        })
    }

    pub async fn set_page_margins(&self, path: &Path, options: MarginOptions) -> Result<()> {
        let margins = PageMargins {
            top: margin("top", options.top)?,
            right: margin("right", options.right)?,
            bottom: margin("bottom", options.bottom)?,
            left: margin("left", options.left)?,
        };

        let (base, tree) = self.load_base(path).await?;
        let tree = tree.with_page_margins(margins);

        self.save(path, base, tree).await?;
        tracing::info!(path = %path.display(), ?margins, "page margins set");
        Ok(())
    }

    pub async fn get_document_info(&self, path: &Path) -> Result<DocumentInfo> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| DocError::io(format!("{}: {e}", path.display())))?;
        let bytes = read_document_file(path).await?;
        let text = self.extract(bytes).await?;

        let modified = metadata.modified()?;
        let created = metadata.created().unwrap_or_else(|e| {
            tracing::debug!("birth time unavailable ({e}), using modification time");
            modified
        });

        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(DocumentInfo {
            title,
            author: "Unknown".to_string(),
            subject: String::new(),
            keywords: Vec::new(),
            page_count: estimate_page_count(&text, self.settings.chars_per_page),
            word_count: count_words(&text),
            created: DateTime::<Utc>::from(created),
            modified: DateTime::<Utc>::from(modified),
        })
    }

    /// Read and decode the current file, returning the document to build on
    /// and the tree the new content is added to.
    ///
    /// Append mode keeps the decoded body and carries the stored core
    /// properties over, since docx-rs does not read them back. Replace mode
    /// only uses the decoded document as proof that the file is a valid
    /// container and starts from an empty one with default margins.
    async fn load_base(&self, path: &Path) -> Result<(docx_rs::Docx, DocumentTree)> {
        let bytes = read_document_file(path).await?;
        let mode = self.edit_mode();
        let codec = Arc::clone(&self.codec);

        run_blocking(move || {
            let existing = codec.decode(&bytes)?;
            Ok(match mode {
                EditMode::Append => (
                    existing,
                    DocumentTree::new().with_metadata(stored_metadata(&bytes)),
                ),
                EditMode::Replace => (
                    docx_rs::Docx::new(),
                    DocumentTree::new().with_page_margins(PageMargins::default()),
                ),
            })
        })
        .await
    }

    async fn extract(&self, bytes: Vec<u8>) -> Result<String> {
        let extractor = Arc::clone(&self.extractor);
        run_blocking(move || extractor.extract_text(&bytes)).await
    }

    async fn save(&self, path: &Path, base: docx_rs::Docx, tree: DocumentTree) -> Result<()> {
        let codec = Arc::clone(&self.codec);
        let bytes = run_blocking(move || codec.encode(base, &tree)).await?;
        write_document_file(path, &bytes).await
    }
}

/// Run container work on the blocking pool. A panic is re-raised on the
/// calling task so the transports report it as a failed execution.
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(DocError::io(format!("document task cancelled: {e}"))),
    }
}

/// Core properties already in the container, empty when the part is absent
fn stored_metadata(bytes: &[u8]) -> DocumentMetadata {
    read_core_properties(bytes).unwrap_or_else(|e| {
        tracing::debug!("no readable core properties ({e}), starting empty");
        DocumentMetadata::default()
    })
}

fn dimension(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| DocError::invalid_argument(format!("{name} must be >= 0, got {value}")))
}

fn margin(side: &str, value: Option<i64>) -> Result<u32> {
    match value {
        None => Ok(DEFAULT_MARGIN_TWIPS),
        Some(v) if v < 0 => Err(DocError::invalid_argument(format!(
            "{side} margin must be >= 0, got {v}"
        ))),
        Some(v) => u32::try_from(v)
            .map_err(|_| DocError::invalid_argument(format!("{side} margin {v} is too large"))),
    }
}
