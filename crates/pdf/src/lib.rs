//! # legend-qa-pdf: PDF Text Extraction
//!
//! Produces the paragraph-delimited text the segmentation core expects: one
//! paragraph per PDF text object, paragraphs separated by a blank line.

use pdf::content::{Op, TextDrawAdjusted};
use pdf::file::FileOptions;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

// --- Error Definitions ---

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to read PDF file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse PDF content: {0}")]
    Parse(String),
    #[error("PDF extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// --- Data Structures ---

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PdfInfo {
    pub page_count: u32,
    pub file_size: usize,
}

// --- Extraction ---

/// Normalizes raw paragraphs: inner line breaks become spaces, surrounding
/// whitespace is trimmed, empty paragraphs are dropped, and the rest are
/// joined with a blank line.
pub fn normalize_paragraphs<I, S>(paragraphs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paragraphs
        .into_iter()
        .map(|p| p.as_ref().replace(['\r', '\n'], " ").trim().to_string())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Extracts text from all pages of a PDF synchronously.
///
/// Pages that cannot be decoded are skipped with a warning; only an
/// unreadable document is an error.
pub fn extract_text_from_pdf(pdf_data: &[u8]) -> Result<String, PdfError> {
    let file = FileOptions::cached()
        .load(pdf_data)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let resolver = file.resolver();
    let mut paragraphs: Vec<String> = Vec::new();

    for page_num in 0..file.num_pages() {
        let page = match file.get_page(page_num) {
            Ok(page) => page,
            Err(e) => {
                warn!("Error processing page {}: {}", page_num + 1, e);
                continue;
            }
        };
        let Some(content) = &page.contents else {
            continue;
        };
        let operations = match content.operations(&resolver) {
            Ok(operations) => operations,
            Err(e) => {
                warn!("Error processing page {}: {}", page_num + 1, e);
                continue;
            }
        };

        let mut current = String::new();
        for op in operations.iter() {
            match op {
                Op::TextDraw { text } => current.push_str(&text.to_string_lossy()),
                Op::TextDrawAdjusted { array } => {
                    for item in array {
                        if let TextDrawAdjusted::Text(text) = item {
                            current.push_str(&text.to_string_lossy());
                        }
                    }
                }
                Op::TextNewline => current.push(' '),
                Op::EndText => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            }
        }
        if !current.is_empty() {
            paragraphs.push(current);
        }
    }

    let text = normalize_paragraphs(&paragraphs);
    info!(
        "Successfully extracted {} characters from PDF",
        text.chars().count()
    );
    Ok(text)
}

/// Reads basic document information.
pub fn pdf_info(pdf_data: &[u8]) -> Result<PdfInfo, PdfError> {
    let file = FileOptions::cached()
        .load(pdf_data)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    Ok(PdfInfo {
        page_count: file.num_pages(),
        file_size: pdf_data.len(),
    })
}

/// Reads and extracts a PDF file on a blocking thread.
#[instrument]
pub async fn extract_text_from_path(path: &Path) -> Result<(String, PdfInfo), PdfError> {
    let data = tokio::fs::read(path).await.map_err(|source| PdfError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::task::spawn_blocking(move || {
        let info = pdf_info(&data)?;
        let text = extract_text_from_pdf(&data)?;
        Ok::<_, PdfError>((text, info))
    })
    .await?
}
