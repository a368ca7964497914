//! # Topic Anchor Prompt

/// Phrase present in every anchor prompt; also used by tests to route mock replies.
pub const ANCHOR_INSTRUCTION: &str = "核心主题关键词";

/// Builds the keyword-generation prompt for `text`.
pub fn anchor_prompt(text: &str, keywords_count: usize) -> String {
    format!(
        "请提取以下文本的{ANCHOR_INSTRUCTION}，共{keywords_count}个。\n要求：只输出关键词本身，用顿号“、”分隔，不要编号，不要解释。\n\n文本：\n{text}"
    )
}

/// Builds the text summarized for a per-pair topic.
pub fn pair_topic_text(question: &str, answer: &str) -> String {
    format!("问题: {question}\n答案: {answer}")
}
