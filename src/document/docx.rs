/*!
 * Text extraction from Office Open XML (.docx) packages.
 *
 * Two renderings of the same package are offered:
 * - `FlatTextStrategy` walks headers, body and footers in document order,
 *   emitting a blank line at every paragraph.
 * - `StructuredStrategy` keeps non-blank body paragraphs and flattens each
 *   top-level table row into tab-separated cells.
 */

use log::debug;
use once_cell::sync::Lazy;
use quick_xml::Reader as XmlReader;
use quick_xml::events::Event;
use regex::Regex;
use std::io::{Cursor, Read};
use zip::ZipArchive;
use zip::result::ZipError;

use super::ExtractionStrategy;
use crate::errors::DocumentError;

const BODY_PART: &str = "word/document.xml";

static HEADER_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^word/header[0-9]*\.xml$").expect("valid header regex"));

static FOOTER_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^word/footer[0-9]*\.xml$").expect("valid footer regex"));

/// A top-level block of the document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Paragraph text, runs concatenated
    Paragraph(String),
    /// Table rows, each a list of cell texts
    Table(Vec<Vec<String>>),
}

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

fn open_archive(bytes: &[u8]) -> Result<Archive<'_>, DocumentError> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocumentError::ReadFailed(format!("not a valid .docx package: {}", e)))
}

/// Read one part of the package as UTF-8; `None` if it does not exist
fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<Option<String>, DocumentError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(DocumentError::ReadFailed(format!(
                "failed to open {}: {}",
                name, e
            )));
        }
    };

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| DocumentError::ReadFailed(format!("failed to read {}: {}", name, e)))?;
    Ok(Some(content))
}

fn xml_error(part: &str, err: impl std::fmt::Display) -> DocumentError {
    DocumentError::ReadFailed(format!("malformed XML in {}: {}", part, err))
}

/// Render one XML part as flat text: `w:t` text, `w:tab` as a tab,
/// `w:br`/`w:cr` as a newline and a blank line at the start of every paragraph.
pub fn flatten_part(xml: &str) -> Result<String, DocumentError> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => out.push_str("\n\n"),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" => out.push_str("\n\n"),
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text = false;
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    out.push_str(&e.unescape().map_err(|err| xml_error("part", err))?);
                }
            }
            Ok(Event::CData(e)) => {
                if in_text {
                    out.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(xml_error("part", err)),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Parse the body part into top-level paragraphs and tables.
///
/// Cell text is the cell's paragraphs joined by newlines. Tables nested
/// inside cells are skipped.
pub fn parse_blocks(xml: &str) -> Result<Vec<Block>, DocumentError> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut blocks = Vec::new();
    let mut table_depth = 0usize;
    let mut paragraph: Option<String> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| xml_error(BODY_PART, err))?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        rows.clear();
                    }
                }
                b"w:tr" if table_depth == 1 => row.clear(),
                b"w:tc" if table_depth == 1 => cell.clear(),
                b"w:p" if table_depth <= 1 => paragraph = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(_) if table_depth > 1 => {}
            Event::Empty(e) => {
                match e.name().as_ref() {
                    b"w:p" => {
                        if table_depth == 0 {
                            blocks.push(Block::Paragraph(String::new()));
                        } else {
                            cell.push(String::new());
                        }
                    }
                    b"w:tab" => {
                        if let Some(p) = paragraph.as_mut() {
                            p.push('\t');
                        }
                    }
                    b"w:br" | b"w:cr" => {
                        if let Some(p) = paragraph.as_mut() {
                            p.push('\n');
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => {
                    if table_depth == 1 {
                        blocks.push(Block::Table(std::mem::take(&mut rows)));
                    }
                    table_depth = table_depth.saturating_sub(1);
                }
                b"w:tr" if table_depth == 1 => rows.push(std::mem::take(&mut row)),
                b"w:tc" if table_depth == 1 => row.push(cell.join("\n")),
                b"w:p" if table_depth <= 1 => {
                    if let Some(text) = paragraph.take() {
                        if table_depth == 0 {
                            blocks.push(Block::Paragraph(text));
                        } else {
                            cell.push(text);
                        }
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Text(e) => {
                if in_text && table_depth <= 1 {
                    if let Some(p) = paragraph.as_mut() {
                        p.push_str(&e.unescape().map_err(|err| xml_error(BODY_PART, err))?);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(blocks)
}

/// Render blocks as non-blank paragraphs first, then one
/// tab-joined line per table row with non-blank trimmed cells, all separated
/// by a blank line.
pub fn render_structured(blocks: &[Block]) -> String {
    let mut paragraphs: Vec<String> = blocks
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph(text) if !text.trim().is_empty() => Some(text.clone()),
            _ => None,
        })
        .collect();

    for block in blocks {
        if let Block::Table(rows) = block {
            for row in rows {
                let cells: Vec<&str> = row
                    .iter()
                    .map(|cell| cell.trim())
                    .filter(|cell| !cell.is_empty())
                    .collect();
                if !cells.is_empty() {
                    paragraphs.push(cells.join("\t"));
                }
            }
        }
    }

    paragraphs.join("\n\n")
}

/// Flat extraction: headers, body, footers, trimmed
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatTextStrategy;

impl ExtractionStrategy for FlatTextStrategy {
    fn name(&self) -> &'static str {
        "flat-text"
    }

    fn attempt(&self, bytes: &[u8], _password: Option<&str>) -> Result<String, DocumentError> {
        let mut archive = open_archive(bytes)?;
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();

        let mut text = String::new();
        for name in names.iter().filter(|n| HEADER_PART.is_match(n)) {
            if let Some(xml) = read_part(&mut archive, name)? {
                text.push_str(&flatten_part(&xml)?);
            }
        }

        let body = read_part(&mut archive, BODY_PART)?
            .ok_or_else(|| DocumentError::ReadFailed(format!("{} is missing", BODY_PART)))?;
        text.push_str(&flatten_part(&body)?);

        for name in names.iter().filter(|n| FOOTER_PART.is_match(n)) {
            if let Some(xml) = read_part(&mut archive, name)? {
                text.push_str(&flatten_part(&xml)?);
            }
        }

        debug!("flat-text strategy read {} chars", text.chars().count());
        Ok(text.trim().to_string())
    }
}

/// Structured extraction: body paragraphs and tables
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredStrategy;

impl ExtractionStrategy for StructuredStrategy {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn attempt(&self, bytes: &[u8], _password: Option<&str>) -> Result<String, DocumentError> {
        let mut archive = open_archive(bytes)?;
        let body = read_part(&mut archive, BODY_PART)?
            .ok_or_else(|| DocumentError::ReadFailed(format!("{} is missing", BODY_PART)))?;
        let blocks = parse_blocks(&body)?;
        debug!("structured strategy parsed {} block(s)", blocks.len());
        Ok(render_structured(&blocks))
    }
}
