//! Tool descriptors and dispatch
//!
//! Both transports expose the same seven tools. Parameters are checked
//! against a typed struct per tool before any operation runs, so a request
//! with the wrong shape never reaches the document layer.

use std::path::Path;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::document::{
    Alignment, CreateOptions, MarginOptions, ParagraphOptions, SearchReplaceOptions, TableOptions,
};
use crate::operations::{DocumentOperations, OperationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    CreateDocument,
    OpenDocument,
    AddParagraph,
    AddTable,
    SearchAndReplace,
    SetPageMargins,
    GetDocumentInfo,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::CreateDocument,
        Tool::OpenDocument,
        Tool::AddParagraph,
        Tool::AddTable,
        Tool::SearchAndReplace,
        Tool::SetPageMargins,
        Tool::GetDocumentInfo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::CreateDocument => "create_document",
            Tool::OpenDocument => "open_document",
            Tool::AddParagraph => "add_paragraph",
            Tool::AddTable => "add_table",
            Tool::SearchAndReplace => "search_and_replace",
            Tool::SetPageMargins => "set_page_margins",
            Tool::GetDocumentInfo => "get_document_info",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::CreateDocument => "Create a new Word document",
            Tool::OpenDocument => "Open a Word document and return its text",
            Tool::AddParagraph => "Add a paragraph to a document",
            Tool::AddTable => "Add a table to a document",
            Tool::SearchAndReplace => "Find and replace text",
            Tool::SetPageMargins => "Set page margins",
            Tool::GetDocumentInfo => "Get document information",
        }
    }

    /// Verb phrase used in failure messages
    fn action(self) -> &'static str {
        match self {
            Tool::CreateDocument => "create document",
            Tool::OpenDocument => "open document",
            Tool::AddParagraph => "add paragraph",
            Tool::AddTable => "add table",
            Tool::SearchAndReplace => "search and replace",
            Tool::SetPageMargins => "set page margins",
            Tool::GetDocumentInfo => "get document info",
        }
    }

    fn parameters(self) -> Value {
        let file_path = json!({ "type": "string", "description": "Path of the .docx file" });
        match self {
            Tool::CreateDocument => json!({
                "type": "object",
                "properties": {
                    "filePath": file_path,
                    "title": { "type": "string", "description": "Document title" },
                    "author": { "type": "string", "description": "Document author" },
                    "subject": { "type": "string", "description": "Document subject" },
                    "keywords": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Document keywords"
                    }
                },
                "required": ["filePath"]
            }),
            Tool::OpenDocument | Tool::GetDocumentInfo => json!({
                "type": "object",
                "properties": { "filePath": file_path },
                "required": ["filePath"]
            }),
            Tool::AddParagraph => json!({
                "type": "object",
                "properties": {
                    "filePath": file_path,
                    "text": { "type": "string", "description": "Paragraph text" },
                    "style": { "type": "string", "description": "Paragraph style id" },
                    "alignment": {
                        "type": "string",
                        "enum": Alignment::ALL,
                        "description": "Paragraph alignment"
                    },
                    "fontSize": { "type": "number", "description": "Font size in points" },
                    "bold": { "type": "boolean" },
                    "italic": { "type": "boolean" }
                },
                "required": ["filePath", "text"]
            }),
            Tool::AddTable => json!({
                "type": "object",
                "properties": {
                    "filePath": file_path,
                    "rows": { "type": "integer", "minimum": 0, "description": "Number of rows" },
                    "cols": { "type": "integer", "minimum": 0, "description": "Number of columns" },
                    "headers": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Header row"
                    },
                    "data": {
                        "type": "array",
                        "items": { "type": "array", "items": { "type": "string" } },
                        "description": "Cell text by row"
                    }
                },
                "required": ["filePath", "rows", "cols"]
            }),
            Tool::SearchAndReplace => json!({
                "type": "object",
                "properties": {
                    "filePath": file_path,
                    "searchText": { "type": "string", "description": "Regular expression to find" },
                    "replaceText": { "type": "string", "description": "Replacement text" },
                    "matchCase": { "type": "boolean", "description": "Case sensitive match" }
                },
                "required": ["filePath", "searchText", "replaceText"]
            }),
            Tool::SetPageMargins => {
                let twips = |side: &str| {
                    json!({
                        "type": "integer",
                        "minimum": 0,
                        "description": format!("{side} margin in twips (default 1440)")
                    })
                };
                json!({
                    "type": "object",
                    "properties": {
                        "filePath": file_path,
                        "top": twips("Top"),
                        "right": twips("Right"),
                        "bottom": twips("Bottom"),
                        "left": twips("Left")
                    },
                    "required": ["filePath"]
                })
            }
        }
    }
}

/// Static description of one tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

pub static TOOLS: Lazy<Vec<ToolDescriptor>> = Lazy::new(|| {
    Tool::ALL
        .into_iter()
        .map(|tool| ToolDescriptor {
            name: tool.name(),
            description: tool.description(),
            parameters: tool.parameters(),
        })
        .collect()
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unsupported tool: {0}")]
    UnknownTool(String),

    #[error("invalid parameters for {tool}: {message}")]
    InvalidParameters { tool: &'static str, message: String },
}

// Parameter shapes

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateDocumentParams {
    #[serde(alias = "path")]
    file_path: String,
    title: Option<String>,
    author: Option<String>,
    subject: Option<String>,
    keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PathParams {
    #[serde(alias = "path")]
    file_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct AddParagraphParams {
    #[serde(alias = "path")]
    file_path: String,
    text: String,
    style: Option<String>,
    alignment: Option<Alignment>,
    font_size: Option<f32>,
    bold: Option<bool>,
    italic: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct AddTableParams {
    #[serde(alias = "path")]
    file_path: String,
    rows: i64,
    cols: i64,
    headers: Option<Vec<String>>,
    data: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SearchAndReplaceParams {
    #[serde(alias = "path")]
    file_path: String,
    search_text: String,
    replace_text: String,
    match_case: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SetPageMarginsParams {
    #[serde(alias = "path")]
    file_path: String,
    top: Option<i64>,
    right: Option<i64>,
    bottom: Option<i64>,
    left: Option<i64>,
}

fn parse<P: DeserializeOwned>(tool: Tool, params: Value) -> Result<P, DispatchError> {
    serde_json::from_value(params).map_err(|e| DispatchError::InvalidParameters {
        tool: tool.name(),
        message: e.to_string(),
    })
}

/// Validate `params` for the named tool and run it
pub async fn call_tool(
    ops: &DocumentOperations,
    name: &str,
    params: Value,
) -> Result<(Tool, OperationResult), DispatchError> {
    let tool = Tool::from_name(name).ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;
    tracing::debug!(tool = tool.name(), "dispatching tool call");

    let result = match tool {
        Tool::CreateDocument => {
            let p: CreateDocumentParams = parse(tool, params)?;
            let options = CreateOptions {
                title: p.title,
                author: p.author,
                subject: p.subject,
                keywords: p.keywords.unwrap_or_default(),
            };
            let outcome = ops.create_document(Path::new(&p.file_path), options).await;
            OperationResult::from_result(tool.action(), outcome)
        }
        Tool::OpenDocument => {
            let p: PathParams = parse(tool, params)?;
            let outcome = ops.open_document(Path::new(&p.file_path)).await;
            OperationResult::from_result(tool.action(), outcome)
        }
        Tool::AddParagraph => {
            let p: AddParagraphParams = parse(tool, params)?;
            let options = ParagraphOptions {
                text: p.text,
                style: p.style,
                alignment: p.alignment,
                font_size: p.font_size,
                bold: p.bold,
                italic: p.italic,
            };
            let outcome = ops.add_paragraph(Path::new(&p.file_path), options).await;
            OperationResult::from_result(tool.action(), outcome)
        }
        Tool::AddTable => {
            let p: AddTableParams = parse(tool, params)?;
            let options = TableOptions {
                rows: p.rows,
                cols: p.cols,
                headers: p.headers,
                data: p.data,
            };
            let outcome = ops.add_table(Path::new(&p.file_path), options).await;
            OperationResult::from_result(tool.action(), outcome)
        }
        Tool::SearchAndReplace => {
            let p: SearchAndReplaceParams = parse(tool, params)?;
            let options = SearchReplaceOptions {
                search_text: p.search_text,
                replace_text: p.replace_text,
                match_case: p.match_case,
            };
            let outcome = ops.search_and_replace(Path::new(&p.file_path), options).await;
            OperationResult::from_result(tool.action(), outcome)
        }
        Tool::SetPageMargins => {
            let p: SetPageMarginsParams = parse(tool, params)?;
            let options = MarginOptions {
                top: p.top,
                right: p.right,
                bottom: p.bottom,
                left: p.left,
            };
            let outcome = ops.set_page_margins(Path::new(&p.file_path), options).await;
            OperationResult::from_result(tool.action(), outcome)
        }
        Tool::GetDocumentInfo => {
            let p: PathParams = parse(tool, params)?;
            let outcome = ops.get_document_info(Path::new(&p.file_path)).await;
            OperationResult::from_result(tool.action(), outcome)
        }
    };

    Ok((tool, result))
}

/// Human-readable reply for text-only channels
pub fn reply_text(tool: Tool, result: &OperationResult) -> String {
    if !result.success {
        return result.error.clone().unwrap_or_default();
    }

    let data = result.data.as_ref().unwrap_or(&Value::Null);
    let field = |key: &str| match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    match tool {
        Tool::CreateDocument => format!("Document created: {}", field("filePath")),
        Tool::OpenDocument => field("content"),
        Tool::AddParagraph => "Paragraph added".to_string(),
        Tool::AddTable => "Table added".to_string(),
        Tool::SearchAndReplace => format!(
            "Replacement complete: {} match(es)\nPreview: {}",
            field("matchCount"),
            field("preview")
        ),
        Tool::SetPageMargins => "Page margins set".to_string(),
        Tool::GetDocumentInfo => format!(
            "Document info:\n\
             Title: {}\n\
             Author: {}\n\
             Subject: {}\n\
             Keywords: {}\n\
             Pages: {}\n\
             Words: {}\n\
             Created: {}\n\
             Modified: {}",
            field("title"),
            field("author"),
            field("subject"),
            field("keywords"),
            field("pageCount"),
            field("wordCount"),
            field("created"),
            field("modified"),
        ),
    }
}
