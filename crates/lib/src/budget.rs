//! # Prompt Budgeting
//!
//! Token estimation, smart truncation and the prompt budgeter that picks
//! between the full and compact extraction templates.
//!
//! Exact tokenization is not available for local models, so every length
//! decision here goes through [`estimate_tokens`]: CJK ideographs weigh 1.5
//! tokens and everything else 0.75. The arithmetic is done in quarter tokens so
//! that the estimate is an exact integer function of the character counts.

use crate::prompts::extraction::{
    COMPACT_EXTRACTION_TEMPLATE, CONTEXT_MARKER, FULL_EXTRACTION_TEMPLATE, TOPIC_MARKER,
};
use crate::segment::{char_len, head_chars, tail_chars, PARAGRAPH_SEPARATOR};
use serde::Serialize;
use tracing::{debug, warn};

/// Appended to hard-truncated content.
pub const TRUNCATION_MARKER: &str = "……";

/// Longest sliding-context excerpt placed in a prompt header, in characters.
pub const MAX_CONTEXT_CHARS: usize = 200;

/// Sentence terminators used for sentence-level truncation.
const SENTENCE_TERMINATORS: &[char] = &['。', '！', '？', '!', '?'];

/// A paragraph-level cut is accepted when it keeps at least this share of the target.
const PARAGRAPH_RETENTION: f64 = 0.7;

/// Same floor for sentence-level cuts; below it the hard cut keeps more content.
const SENTENCE_RETENTION: f64 = 0.7;

/// Estimated tokens per CJK character, used to turn a token allowance into characters.
const CJK_TOKENS_PER_CHAR: f64 = 1.5;

pub fn is_cjk_ideograph(c: char) -> bool {
    matches!(
        c,
        '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}'
            | '\u{2A700}'..='\u{2EBEF}'
    )
}

/// Estimates the token count of `text`.
///
/// Monotonic in the number of characters and deterministic.
pub fn estimate_tokens(text: &str) -> usize {
    let quarters: usize = text
        .chars()
        .map(|c| if is_cjk_ideograph(c) { 6 } else { 3 })
        .sum();
    quarters.div_ceil(4)
}

/// Cuts `content` down to at most `max_chars` characters.
///
/// Prefers dropping trailing paragraphs, then trailing sentences, and only
/// then cuts mid-sentence, appending [`TRUNCATION_MARKER`]. Content that
/// already fits is returned unchanged.
pub fn smart_truncate(content: &str, max_chars: usize) -> String {
    if char_len(content) <= max_chars {
        return content.to_string();
    }

    let by_paragraph = keep_leading(content.split(PARAGRAPH_SEPARATOR), PARAGRAPH_SEPARATOR, max_chars);
    if !by_paragraph.is_empty() && retains(&by_paragraph, max_chars, PARAGRAPH_RETENTION) {
        return by_paragraph;
    }

    let by_sentence = keep_leading(content.split_inclusive(SENTENCE_TERMINATORS), "", max_chars);
    let by_sentence = by_sentence.trim_end();
    if !by_sentence.is_empty() && retains(by_sentence, max_chars, SENTENCE_RETENTION) {
        return by_sentence.to_string();
    }

    let marker_len = char_len(TRUNCATION_MARKER);
    if max_chars < marker_len {
        return head_chars(content, max_chars).to_string();
    }
    let mut cut = head_chars(content, max_chars - marker_len).to_string();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

fn retains(cut: &str, max_chars: usize, share: f64) -> bool {
    char_len(cut) as f64 >= max_chars as f64 * share
}

/// Joins leading `pieces` with `separator` while the result fits in `max_chars`.
fn keep_leading<'a>(
    pieces: impl Iterator<Item = &'a str>,
    separator: &str,
    max_chars: usize,
) -> String {
    let separator_len = char_len(separator);
    let mut kept = String::new();
    let mut kept_len = 0;
    for piece in pieces {
        let extra = if kept.is_empty() {
            char_len(piece)
        } else {
            separator_len + char_len(piece)
        };
        if kept_len + extra > max_chars {
            break;
        }
        if !kept.is_empty() {
            kept.push_str(separator);
        }
        kept.push_str(piece);
        kept_len += extra;
    }
    kept
}

/// Which assembly step produced a prompt.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PromptVariant {
    /// Full template, context header and untouched content.
    Full,
    /// Compact template, context header and untouched content.
    Compact,
    /// Compact template, context header and truncated content.
    Truncated,
    /// Compact template and truncated content, header dropped.
    Degraded,
}

impl PromptVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptVariant::Full => "full",
            PromptVariant::Compact => "compact",
            PromptVariant::Truncated => "truncated",
            PromptVariant::Degraded => "degraded",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetedPrompt {
    pub text: String,
    pub variant: PromptVariant,
    pub estimated_tokens: usize,
    /// Whether the block content was shortened.
    pub truncated: bool,
    /// Whether the prompt still exceeds the ceiling. Only possible in the degraded step.
    pub over_budget: bool,
}

/// Token costs of the templates for a given block size.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BudgetAnalysis {
    pub max_prompt_tokens: usize,
    pub max_block_size: usize,
    pub full_template_tokens: usize,
    pub compact_template_tokens: usize,
    /// Full template with a max-size CJK block and a full context header.
    pub full_worst_case_tokens: usize,
    /// Compact template with a max-size CJK block and a full context header.
    pub compact_worst_case_tokens: usize,
    pub recommended_max_block_size: usize,
}

impl BudgetAnalysis {
    pub fn full_fits(&self) -> bool {
        self.full_worst_case_tokens <= self.max_prompt_tokens
    }

    pub fn compact_fits(&self) -> bool {
        self.compact_worst_case_tokens <= self.max_prompt_tokens
    }
}

/// Assembles extraction prompts under a token ceiling.
#[derive(Debug, Clone)]
pub struct PromptBudgeter {
    max_prompt_tokens: usize,
    safety_margin: usize,
    min_usable_chars: usize,
    context_chars: usize,
    full_template: String,
    compact_template: String,
}

impl PromptBudgeter {
    pub fn new(max_prompt_tokens: usize) -> Self {
        Self {
            max_prompt_tokens,
            safety_margin: 100,
            min_usable_chars: 100,
            context_chars: MAX_CONTEXT_CHARS,
            full_template: FULL_EXTRACTION_TEMPLATE.to_string(),
            compact_template: COMPACT_EXTRACTION_TEMPLATE.to_string(),
        }
    }

    pub fn with_templates(mut self, full: impl Into<String>, compact: impl Into<String>) -> Self {
        self.full_template = full.into();
        self.compact_template = compact.into();
        self
    }

    pub fn with_safety_margin(mut self, tokens: usize) -> Self {
        self.safety_margin = tokens;
        self
    }

    /// Capped at [`MAX_CONTEXT_CHARS`].
    pub fn with_context_chars(mut self, chars: usize) -> Self {
        self.context_chars = chars.min(MAX_CONTEXT_CHARS);
        self
    }

    pub fn max_prompt_tokens(&self) -> usize {
        self.max_prompt_tokens
    }

    /// Builds the prompt for one block. Never fails.
    pub fn assemble(
        &self,
        content: &str,
        sliding_context: Option<&str>,
        anchor: Option<&str>,
    ) -> BudgetedPrompt {
        let header = self.context_header(sliding_context, anchor);

        let full = compose(&self.full_template, &header, content);
        let full_tokens = estimate_tokens(&full);
        if full_tokens <= self.max_prompt_tokens {
            return self.finish(full, PromptVariant::Full, false);
        }

        let compact = compose(&self.compact_template, &header, content);
        if estimate_tokens(&compact) <= self.max_prompt_tokens {
            debug!(
                "Full template needs ~{} tokens (limit {}), using compact template",
                full_tokens, self.max_prompt_tokens
            );
            return self.finish(compact, PromptVariant::Compact, false);
        }

        let overhead = estimate_tokens(&compose(&self.compact_template, &header, ""));
        let available_chars = chars_for_tokens(
            self.max_prompt_tokens
                .saturating_sub(overhead)
                .saturating_sub(self.safety_margin),
        );
        if available_chars > self.min_usable_chars {
            let cut = smart_truncate(content, available_chars);
            warn!(
                "Block content truncated from {} to {} chars to fit the prompt budget",
                char_len(content),
                char_len(&cut)
            );
            return self.finish(
                compose(&self.compact_template, &header, &cut),
                PromptVariant::Truncated,
                true,
            );
        }

        let bare_overhead = estimate_tokens(&compose(&self.compact_template, "", ""));
        let remaining_chars = chars_for_tokens(self.max_prompt_tokens.saturating_sub(bare_overhead));
        let cut = smart_truncate(content, remaining_chars);
        let truncated = cut != content;
        warn!(
            "Prompt budget of {} tokens leaves no room for context, degraded to {} content chars",
            self.max_prompt_tokens,
            char_len(&cut)
        );
        self.finish(
            compose(&self.compact_template, "", &cut),
            PromptVariant::Degraded,
            truncated,
        )
    }

    /// Estimates the template costs for blocks of up to `max_block_size` characters.
    pub fn analyze(&self, max_block_size: usize) -> BudgetAnalysis {
        let worst_content = "字".repeat(max_block_size);
        let worst_context = "字".repeat(self.context_chars);
        let header = self.context_header(Some(&worst_context), Some("关键词、关键词、关键词"));
        let compact_template_tokens = estimate_tokens(&self.compact_template);
        BudgetAnalysis {
            max_prompt_tokens: self.max_prompt_tokens,
            max_block_size,
            full_template_tokens: estimate_tokens(&self.full_template),
            compact_template_tokens,
            full_worst_case_tokens: estimate_tokens(&compose(&self.full_template, &header, &worst_content)),
            compact_worst_case_tokens: estimate_tokens(&compose(
                &self.compact_template,
                &header,
                &worst_content,
            )),
            recommended_max_block_size: chars_for_tokens(
                self.max_prompt_tokens
                    .saturating_sub(compact_template_tokens)
                    .saturating_sub(self.safety_margin),
            ),
        }
    }

    fn context_header(&self, sliding_context: Option<&str>, anchor: Option<&str>) -> String {
        let mut header = String::new();
        if let Some(context) = sliding_context.map(str::trim).filter(|c| !c.is_empty()) {
            header.push_str(CONTEXT_MARKER);
            header.push_str(tail_chars(context, self.context_chars));
            header.push('\n');
        }
        if let Some(anchor) = anchor.map(str::trim).filter(|a| !a.is_empty()) {
            header.push_str(TOPIC_MARKER);
            header.push_str(anchor);
            header.push('\n');
        }
        if !header.is_empty() {
            header.push('\n');
        }
        header
    }

    fn finish(&self, text: String, variant: PromptVariant, truncated: bool) -> BudgetedPrompt {
        let estimated_tokens = estimate_tokens(&text);
        let over_budget = estimated_tokens > self.max_prompt_tokens;
        if over_budget {
            warn!(
                "Prompt still estimated at {} tokens, over the {} token limit",
                estimated_tokens, self.max_prompt_tokens
            );
        }
        BudgetedPrompt {
            text,
            variant,
            estimated_tokens,
            truncated,
            over_budget,
        }
    }
}

fn compose(template: &str, header: &str, content: &str) -> String {
    format!("{template}\n\n{header}{content}")
}

fn chars_for_tokens(tokens: usize) -> usize {
    (tokens as f64 / CJK_TOKENS_PER_CHAR).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_weighs_cjk_double() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("段永平"), 5); // 4.5 rounded up
        assert_eq!(estimate_tokens("abcd"), 3);
        assert_eq!(estimate_tokens("问abc"), 4); // 1.5 + 2.25
    }

    #[test]
    fn cjk_classification() {
        assert!(is_cjk_ideograph('段'));
        assert!(!is_cjk_ideograph('：'));
        assert!(!is_cjk_ideograph('a'));
        assert!(!is_cjk_ideograph('。'));
    }

    #[test]
    fn compose_separates_template_and_body() {
        assert_eq!(compose("T", "", "body"), "T\n\nbody");
        assert_eq!(compose("T", "H\n\n", "body"), "T\n\nH\n\nbody");
    }

    #[test]
    fn header_keeps_the_context_tail() {
        let budgeter = PromptBudgeter::new(4000).with_context_chars(3);
        let header = budgeter.context_header(Some("一二三四五"), Some("投资、价值"));
        assert_eq!(header, "【上文语境】三四五\n【本段主题】投资、价值\n\n");
        assert_eq!(budgeter.context_header(Some("  "), None), "");
    }

    #[test]
    fn context_chars_are_capped() {
        let budgeter = PromptBudgeter::new(4000).with_context_chars(500);
        assert_eq!(budgeter.context_chars, MAX_CONTEXT_CHARS);
    }

    #[test]
    fn short_leading_sentence_falls_through_to_the_hard_cut() {
        let cut = smart_truncate("好。长长长长长长长长", 5);
        assert_eq!(cut, "好。长……");
    }

    #[test]
    fn hard_cut_respects_tiny_limits() {
        assert_eq!(smart_truncate("一二三四五", 1), "一");
        assert_eq!(smart_truncate("一二三四五", 0), "");
    }
}
