//! # Q&A Marker Rules
//!
//! Detection of question/answer structure is a locale-specific heuristic, so
//! the markers live in a plain table that can be tuned from configuration.
//! A marker ending in a colon matches either the full-width `：` or the
//! half-width `:` form; any other marker matches literally.

use crate::config::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static FALLBACK_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x{4e00}-\x{9fa5}A-Za-z0-9（）【】「」《》‘’“”、,，.。·\s]{1,20}[：:]\s*")
        .expect("fallback label pattern is valid")
});

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The configurable marker table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct QaRuleTable {
    /// Explicit interrogative speaker labels.
    pub direct_question_markers: Vec<String>,
    /// Reported-speech openers that provoke a response without asking.
    pub indirect_question_markers: Vec<String>,
    /// Labels of the answering speaker.
    pub answer_markers: Vec<String>,
    /// Speaker labels stripped from the front of extracted questions.
    pub known_prefixes: Vec<String>,
}

impl Default for QaRuleTable {
    fn default() -> Self {
        Self {
            direct_question_markers: strings(&[
                "网友：",
                "问：",
                "问题：",
                "提问：",
                "主持人：",
                "观众：",
                "记者：",
                "Q：",
            ]),
            indirect_question_markers: strings(&[
                "文章引用：",
                "引用：",
                "有人说",
                "有人认为",
                "有观点认为",
                "据说",
                "听说",
            ]),
            answer_markers: strings(&["段永平：", "段：", "大道："]),
            known_prefixes: strings(&[
                "网友",
                "记者",
                "问",
                "提问者",
                "主持人",
                "文章引用",
                "Q",
                "观众",
                "评论",
                "主持",
                "用户",
            ]),
        }
    }
}

/// Which marker tiers matched in a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QaSignal {
    pub direct_question: bool,
    pub indirect_question: bool,
    pub answer: bool,
}

impl QaSignal {
    /// An answer marker plus a question marker of either tier.
    pub fn has_qa(&self) -> bool {
        self.answer && (self.direct_question || self.indirect_question)
    }
}

/// The compiled form of a [`QaRuleTable`].
#[derive(Debug, Clone)]
pub struct QaRules {
    direct: Option<Regex>,
    indirect: Option<Regex>,
    answer: Option<Regex>,
    prefix: Option<Regex>,
}

fn marker_pattern(marker: &str) -> Option<String> {
    let marker = marker.trim();
    if marker.is_empty() {
        return None;
    }
    match marker.strip_suffix(['：', ':']) {
        Some(stem) if !stem.is_empty() => Some(format!("{}[：:]", regex::escape(stem))),
        _ => Some(regex::escape(marker)),
    }
}

fn compile_markers(markers: &[String]) -> Result<Option<Regex>, ConfigError> {
    let patterns: Vec<String> = markers.iter().filter_map(|m| marker_pattern(m)).collect();
    if patterns.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!("(?:{})", patterns.join("|")))
        .map(Some)
        .map_err(|e| ConfigError::InvalidRule(e.to_string()))
}

impl QaRules {
    pub fn compile(table: &QaRuleTable) -> Result<Self, ConfigError> {
        let prefixes: Vec<String> = table
            .known_prefixes
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();
        let prefix = if prefixes.is_empty() {
            None
        } else {
            Some(
                Regex::new(&format!(r"^(?:{})[：:]\s*", prefixes.join("|")))
                    .map_err(|e| ConfigError::InvalidRule(e.to_string()))?,
            )
        };

        Ok(Self {
            direct: compile_markers(&table.direct_question_markers)?,
            indirect: compile_markers(&table.indirect_question_markers)?,
            answer: compile_markers(&table.answer_markers)?,
            prefix,
        })
    }

    pub fn signal(&self, text: &str) -> QaSignal {
        let matches = |re: &Option<Regex>| re.as_ref().is_some_and(|re| re.is_match(text));
        QaSignal {
            direct_question: matches(&self.direct),
            indirect_question: matches(&self.indirect),
            answer: matches(&self.answer),
        }
    }

    /// Whether `text` contains a question/answer exchange.
    ///
    /// A question mark is never required: a quoted claim followed by an
    /// answer counts as an exchange.
    pub fn has_qa(&self, text: &str) -> bool {
        !text.is_empty() && self.signal(text).has_qa()
    }

    /// Removes a leading speaker label from an extracted question.
    ///
    /// Known prefixes are tried first; otherwise a short generic label
    /// (up to 20 characters followed by a colon) is stripped.
    pub fn clean_question_text(&self, question: &str) -> String {
        if let Some(m) = self.prefix.as_ref().and_then(|re| re.find(question)) {
            return question[m.end()..].trim().to_string();
        }
        FALLBACK_LABEL.replace(question, "").trim().to_string()
    }
}

impl Default for QaRules {
    fn default() -> Self {
        // The default table only contains escaped literals.
        Self::compile(&QaRuleTable::default()).expect("default QA rules compile")
    }
}
