use regex::Regex;
use std::sync::LazyLock;

/// Paragraph delimiter agreed with the text extractor.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

static SPEAKER_COLON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(网友|段永平|大道|问|段)[:：]").expect("speaker colon pattern is valid")
});

static EXTRA_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("blank line pattern is valid"));

/// Standardizes speaker labels and blank lines before segmentation.
///
/// Half-width colons after the common speaker labels become `：`, and runs of
/// more than one blank line collapse into a single paragraph break.
pub fn preprocess_qa_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = SPEAKER_COLON.replace_all(text, "${1}：");
    EXTRA_BLANK_LINES
        .replace_all(&text, PARAGRAPH_SEPARATOR)
        .into_owned()
}

/// Splits a document on blank-line boundaries into trimmed, non-empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split(PARAGRAPH_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
