//! File I/O and container inspection
//!
//! This module handles reading and writing document files, validating that
//! bytes are a Word container, and reading raw package parts that docx-rs
//! does not expose (core properties, page geometry).

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::error::{DocError, Result};

use super::models::{DocumentMetadata, PageMargins};

pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
pub(crate) const CORE_PROPS_PART: &str = "docProps/core.xml";

/// Read a document file, reporting the path on failure
pub async fn read_document_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| DocError::io(format!("{}: {e}", path.display())))
}

/// Write a document file, replacing any existing content.
///
/// Not atomic: a failure mid-write can leave a truncated file behind, and
/// concurrent writers to one path are not coordinated.
pub async fn write_document_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| DocError::io(format!("{}: {e}", path.display())))
}

/// Validates that the bytes are a legitimate .docx container
pub(crate) fn validate_container(bytes: &[u8]) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocError::decode(format!("not a .docx container: {e}")))?;

    if archive.by_name(DOCUMENT_PART).is_err() {
        // Check if it might be an Excel file
        if archive.by_name("xl/workbook.xml").is_ok() {
            return Err(DocError::decode(
                "this appears to be an Excel workbook (.xlsx), not a Word document",
            ));
        }

        return Err(DocError::decode(format!(
            "invalid .docx container: missing {DOCUMENT_PART}"
        )));
    }

    Ok(())
}

/// Read one package part as UTF-8 text
pub fn read_part(bytes: &[u8], name: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut part = archive
        .by_name(name)
        .map_err(|_| DocError::decode(format!("missing part {name}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Page margins of the body section, if the container declares any
pub fn read_page_margins(bytes: &[u8]) -> Result<Option<PageMargins>> {
    let xml = read_part(bytes, DOCUMENT_PART)?;
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut margins = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"w:pgMar" =>
            {
                let mut found = PageMargins::default();
                for a in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&a.value);
                    let Ok(twips) = value.parse::<u32>() else {
                        continue;
                    };
                    match a.key.as_ref() {
                        b"w:top" => found.top = twips,
                        b"w:right" => found.right = twips,
                        b"w:bottom" => found.bottom = twips,
                        b"w:left" => found.left = twips,
                        _ => {}
                    }
                }
                // The body's sectPr is the last one in the part
                margins = Some(found);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(margins)
}

/// Title, creator, subject and keywords from the core properties part
pub fn read_core_properties(bytes: &[u8]) -> Result<DocumentMetadata> {
    let xml = read_part(bytes, CORE_PROPS_PART)?;
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut metadata = DocumentMetadata::default();
    let mut current: Option<Vec<u8>> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                current = Some(e.name().as_ref().to_vec());
            }
            Ok(Event::End(_)) => {
                current = None;
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current.as_deref() {
                    Some(b"dc:title") => metadata.title = Some(text),
                    Some(b"dc:creator") => metadata.author = Some(text),
                    Some(b"dc:subject") => metadata.subject = Some(text),
                    Some(b"cp:keywords") => {
                        metadata.keywords = text
                            .split(',')
                            .map(str::trim)
                            .filter(|k| !k.is_empty())
                            .map(String::from)
                            .collect();
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(metadata)
}
