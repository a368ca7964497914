use super::{blocks::Block, rules::QaRules};
use tracing::info;

/// Keeps only blocks in which the Q&A rules detect an exchange.
pub fn filter_qa_blocks(blocks: Vec<Block>, rules: &QaRules) -> Vec<Block> {
    let original = blocks.len();
    let kept: Vec<Block> = blocks
        .into_iter()
        .filter(|block| rules.has_qa(&block.content))
        .collect();
    info!(
        "QA filtering: {} blocks remaining (from {})",
        kept.len(),
        original
    );
    kept
}

/// Keeps the leading `ratio` fraction of `items`.
///
/// A ratio of 1.0 or more keeps everything and 0.0 or less keeps nothing;
/// anything in between keeps at least one item.
pub fn sample_leading<T>(mut items: Vec<T>, ratio: f64) -> Vec<T> {
    if ratio >= 1.0 {
        return items;
    }
    if ratio <= 0.0 || ratio.is_nan() {
        items.clear();
        return items;
    }
    let original = items.len();
    let sample_size = ((original as f64 * ratio) as usize).max(1);
    items.truncate(sample_size);
    info!(
        "Applied sampling ratio {:.1}%: {} of {} blocks selected",
        ratio * 100.0,
        items.len(),
        original
    );
    items
}
