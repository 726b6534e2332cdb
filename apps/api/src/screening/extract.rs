//! Text extraction from stored resumes, branching on file format.

use std::io::{self, Cursor, Read};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::screening::ingest::ResumeFormat;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported resume format: {0}")]
    Unsupported(String),

    #[error("Resume file is corrupt or unreadable: {0}")]
    Corrupt(String),

    #[error("Resume text is not valid UTF-8")]
    Encoding,

    #[error("No text could be extracted from the resume")]
    Empty,

    #[error("Failed to read resume: {0}")]
    Io(#[from] io::Error),
}

/// Reads the resume at `path` and returns its plain text.
pub async fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let format = ResumeFormat::from_path(path).ok_or_else(|| {
        ExtractionError::Unsupported(
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{e}"))
                .unwrap_or_else(|| "file without extension".to_string()),
        )
    })?;

    let bytes = tokio::fs::read(path).await?;

    // Parsers are CPU-bound and pdf-extract can panic on malformed input.
    let text = tokio::task::spawn_blocking(move || extract_from_bytes(format, &bytes))
        .await
        .map_err(|e| ExtractionError::Corrupt(format!("parser aborted: {e}")))??;

    debug!("Extracted {} chars from {}", text.len(), path.display());
    Ok(text)
}

pub fn extract_from_bytes(format: ResumeFormat, bytes: &[u8]) -> Result<String, ExtractionError> {
    let raw = match format {
        ResumeFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractionError::Corrupt(e.to_string()))?,
        ResumeFormat::Docx => docx_text(bytes)?,
        ResumeFormat::Text => {
            String::from_utf8(bytes.to_vec()).map_err(|_| ExtractionError::Encoding)?
        }
        ResumeFormat::Doc => {
            return Err(ExtractionError::Unsupported(
                "legacy .doc (Word 97-2003); save as .docx or PDF".to_string(),
            ))
        }
    };

    let text = normalize_whitespace(&raw);
    if text.is_empty() {
        return Err(ExtractionError::Empty);
    }
    Ok(text)
}

fn docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Corrupt(format!("not a valid .docx archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Corrupt(format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Corrupt(format!("unreadable word/document.xml: {e}")))?;

    Ok(document_xml_text(&xml))
}

/// Collects `<w:t>` runs from WordprocessingML, one line per paragraph.
fn document_xml_text(xml: &str) -> String {
    let mut out = String::new();
    let mut in_text = false;
    let mut in_tab_stops = false;
    let mut rest = xml;

    while let Some(start) = rest.find('<') {
        if in_text {
            out.push_str(&unescape_xml(&rest[..start]));
        }
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start + 1..start + len];
        rest = &rest[start + len + 1..];

        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");

        match (name, closing) {
            ("w:t", false) => in_text = !self_closing,
            ("w:t", true) => in_text = false,
            ("w:tabs", false) => in_tab_stops = !self_closing,
            ("w:tabs", true) => in_tab_stops = false,
            ("w:tab", false) if !in_tab_stops => out.push('\t'),
            ("w:br" | "w:cr", false) => out.push('\n'),
            ("w:p", false) if self_closing => out.push('\n'),
            ("w:p", true) => out.push('\n'),
            _ => {}
        }
    }

    out
}

fn unescape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Trims trailing whitespace per line and collapses runs of blank lines.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
