//! Container encoding and decoding
//!
//! Turns a [`DocumentTree`] into .docx bytes with the docx-rs builder API and
//! reads existing containers back into docx-rs documents. Core properties
//! (title, author, subject, keywords) are not settable through the builder,
//! so they are written by replacing `docProps/core.xml` in the packed archive.

use std::io::{Cursor, Read, Write};

use chrono::{SecondsFormat, Utc};
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{DocError, Result};

use super::io::{CORE_PROPS_PART, validate_container};
use super::models::*;

/// Serializes document trees and decodes stored containers
pub trait ContainerCodec: Send + Sync {
    /// Decode stored bytes into an editable document
    fn decode(&self, bytes: &[u8]) -> Result<docx_rs::Docx>;

    /// Encode `tree` on top of `base` and return the packed container
    fn encode(&self, base: docx_rs::Docx, tree: &DocumentTree) -> Result<Vec<u8>>;
}

/// docx-rs backed codec
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxCodec;

impl ContainerCodec for DocxCodec {
    fn decode(&self, bytes: &[u8]) -> Result<docx_rs::Docx> {
        decode_container(bytes)
    }

    fn encode(&self, base: docx_rs::Docx, tree: &DocumentTree) -> Result<Vec<u8>> {
        let docx = apply_tree(base, tree)?;
        let packed = pack(docx)?;

        if tree.metadata.is_empty() {
            Ok(packed)
        } else {
            write_core_properties(&packed, &tree.metadata)
        }
    }
}

/// Validate and parse .docx bytes
pub(crate) fn decode_container(bytes: &[u8]) -> Result<docx_rs::Docx> {
    validate_container(bytes)?;
    docx_rs::read_docx(bytes).map_err(|e| DocError::decode(e.to_string()))
}

pub(crate) fn pack(docx: docx_rs::Docx) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| DocError::io(format!("failed to serialize document: {e}")))?;
    Ok(buf.into_inner())
}

fn apply_tree(base: docx_rs::Docx, tree: &DocumentTree) -> Result<docx_rs::Docx> {
    let mut docx = base;

    if let Some(margins) = tree.page_margins {
        docx = docx.page_margin(page_margin(margins)?);
    }

    for block in &tree.blocks {
        docx = match block {
            Block::Paragraph(spec) => docx.add_paragraph(build_paragraph(spec)),
            Block::Table(spec) => docx.add_table(build_table(spec)),
        };
    }

    Ok(docx)
}

fn page_margin(margins: PageMargins) -> Result<docx_rs::PageMargin> {
    let twips = |v: u32| {
        i32::try_from(v).map_err(|_| DocError::invalid_argument(format!("margin {v} is too large")))
    };

    Ok(docx_rs::PageMargin::new()
        .top(twips(margins.top)?)
        .right(twips(margins.right)?)
        .bottom(twips(margins.bottom)?)
        .left(twips(margins.left)?))
}

pub(crate) fn build_paragraph(spec: &ParagraphSpec) -> docx_rs::Paragraph {
    let mut run = docx_rs::Run::new().add_text(spec.text.as_str());
    if spec.bold {
        run = run.bold();
    }
    if spec.italic {
        run = run.italic();
    }
    if let Some(points) = spec.font_size {
        // w:sz is measured in half-points
        run = run.size((points * 2.0).round() as usize);
    }

    let mut para = docx_rs::Paragraph::new().add_run(run);
    if let Some(style) = &spec.style {
        para = para.style(style);
    }
    if let Some(alignment) = spec.alignment {
        para = para.align(alignment_type(alignment));
    }
    para
}

fn alignment_type(alignment: Alignment) -> docx_rs::AlignmentType {
    match alignment {
        Alignment::Left | Alignment::NumTab => docx_rs::AlignmentType::Left,
        Alignment::Center => docx_rs::AlignmentType::Center,
        Alignment::Right => docx_rs::AlignmentType::Right,
        Alignment::Start => docx_rs::AlignmentType::Start,
        Alignment::End => docx_rs::AlignmentType::End,
        Alignment::Both => docx_rs::AlignmentType::Both,
        Alignment::Distribute
        | Alignment::MediumKashida
        | Alignment::HighKashida
        | Alignment::LowKashida
        | Alignment::ThaiDistribute => docx_rs::AlignmentType::Distribute,
    }
}

fn build_table(spec: &TableSpec) -> docx_rs::Table {
    let cell = |text: &str, bold: bool| {
        let mut run = docx_rs::Run::new().add_text(text);
        if bold {
            run = run.bold();
        }
        docx_rs::TableCell::new().add_paragraph(docx_rs::Paragraph::new().add_run(run))
    };

    let mut rows = Vec::with_capacity(spec.rows + 1);
    if let Some(headers) = &spec.headers {
        rows.push(docx_rs::TableRow::new(
            headers.iter().map(|h| cell(h, true)).collect(),
        ));
    }
    for row in &spec.cells {
        rows.push(docx_rs::TableRow::new(
            row.iter().map(|text| cell(text, false)).collect(),
        ));
    }

    docx_rs::Table::new(rows)
}

/// Rewrite the packed archive with a core properties part built from `metadata`
fn write_core_properties(packed: &[u8], metadata: &DocumentMetadata) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(packed))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut found = false;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;

        if name == CORE_PROPS_PART {
            data = core_properties_xml(metadata).into_bytes();
            found = true;
        }

        writer.start_file(name, options)?;
        writer.write_all(&data)?;
    }

    if !found {
        return Err(DocError::decode(format!(
            "packed document has no {CORE_PROPS_PART} part"
        )));
    }

    Ok(writer.finish()?.into_inner())
}

fn core_properties_xml(metadata: &DocumentMetadata) -> String {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let element = |tag: &str, value: Option<&str>| match value {
        Some(v) => format!("<{tag}>{}</{tag}>", escape(v)),
        None => format!("<{tag}/>"),
    };
    let keywords = metadata.keywords.join(",");

    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    );
    xml.push_str(&element("dc:title", metadata.title.as_deref()));
    xml.push_str(&element("dc:subject", metadata.subject.as_deref()));
    xml.push_str(&element("dc:creator", metadata.author.as_deref()));
    xml.push_str(&element(
        "cp:keywords",
        (!keywords.is_empty()).then_some(keywords.as_str()),
    ));
    xml.push_str(&element("cp:lastModifiedBy", metadata.author.as_deref()));
    xml.push_str(&format!(
        r#"<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created>"#
    ));
    xml.push_str(&format!(
        r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>"#
    ));
    xml.push_str("</cp:coreProperties>");
    xml
}
