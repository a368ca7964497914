//! # Response Parsing
//!
//! Turns the model's free-form answer into Q&A candidates. Models wrap JSON in
//! code fences, prepend commentary or emit slightly broken arrays, so parsing
//! falls back from whole values to individual balanced objects, dropping
//! whatever cannot be read.

use crate::{segment::Block, segment::QaRules, types::QaRecord};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid fence regex"));

/// A question/answer pair as returned by the model, before post-processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaCandidate {
    pub question: String,
    pub answer: String,
}

impl QaCandidate {
    /// Reads a candidate from a JSON object with non-empty `question` and `answer` strings.
    fn from_value(value: &Value) -> Option<Self> {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            question: field("question")?,
            answer: field("answer")?,
        })
    }
}

/// Extracts every valid candidate from a model response.
pub fn parse_qa_response(response: &str) -> Vec<QaCandidate> {
    let fenced: Vec<&str> = JSON_FENCE
        .captures_iter(response)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    let fragments = if fenced.is_empty() {
        vec![response]
    } else {
        fenced
    };

    let candidates: Vec<QaCandidate> = fragments
        .into_iter()
        .flat_map(parse_fragment)
        .collect();
    debug!("Parsed {} Q&A candidates from response", candidates.len());
    candidates
}

fn parse_fragment(fragment: &str) -> Vec<QaCandidate> {
    match serde_json::from_str::<Value>(fragment.trim()) {
        Ok(Value::Array(items)) => items.iter().filter_map(QaCandidate::from_value).collect(),
        Ok(value @ Value::Object(_)) => QaCandidate::from_value(&value).into_iter().collect(),
        Ok(_) => Vec::new(),
        Err(_) => balanced_objects(fragment)
            .into_iter()
            .filter_map(|object| serde_json::from_str::<Value>(object).ok())
            .filter_map(|value| QaCandidate::from_value(&value))
            .collect(),
    }
}

/// Finds top-level `{...}` spans, ignoring braces inside string literals.
fn balanced_objects(text: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    objects.push(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }
    objects
}

/// Post-processes candidates into records tied to their source block.
///
/// Questions are stripped of speaker labels; candidates left without a
/// question are dropped. The block anchor, if any, becomes the topic.
pub fn into_records(candidates: Vec<QaCandidate>, block: &Block, rules: &QaRules) -> Vec<QaRecord> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let question = rules.clean_question_text(&candidate.question);
            if question.is_empty() {
                return None;
            }
            Some(QaRecord {
                question,
                answer: candidate.answer,
                source_text: block.content.clone(),
                topic: block.anchor.clone(),
                sliding_context: block.sliding_context.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_scan_ignores_braces_in_strings() {
        let text = r#"noise {"question": "a}b", "answer": "{c"} tail {"x": {"y": 1}}"#;
        assert_eq!(
            balanced_objects(text),
            vec![r#"{"question": "a}b", "answer": "{c"}"#, r#"{"x": {"y": 1}}"#]
        );
    }

    #[test]
    fn balanced_scan_handles_escaped_quotes() {
        let text = r#"{"question": "say \"hi}\"", "answer": "ok"}"#;
        assert_eq!(balanced_objects(text), vec![text]);
    }

    #[test]
    fn unclosed_object_is_ignored() {
        assert!(balanced_objects(r#"{"question": "a""#).is_empty());
    }
}
