//! # Metadata Generation Tests
//!
//! Sliding context and topic anchors, with a mocked model.

use legend_qa::metadata::{parse_anchor, MetadataGenerator};
use legend_qa::prompts::anchor::ANCHOR_INSTRUCTION;
use legend_qa::{AnchorMode, Block, ExtractionConfig};
use legend_qa_test_utils::MockAiProvider;

fn blocks(contents: &[String]) -> Vec<Block> {
    contents
        .iter()
        .map(|c| Block::new(c.clone(), 1, false))
        .collect()
}

fn block_mode() -> ExtractionConfig {
    ExtractionConfig {
        anchor_mode: AnchorMode::Block,
        ..ExtractionConfig::default()
    }
}

#[tokio::test]
async fn test_sliding_context_comes_from_the_previous_block() {
    // --- 1. Arrange ---
    let provider = MockAiProvider::new();
    let config = ExtractionConfig {
        enable_llm_anchor: false,
        ..ExtractionConfig::default()
    };
    let contents = vec![
        format!("{}{}", "甲".repeat(300), "乙".repeat(200)),
        "短块。".to_string(),
        "第三块。".to_string(),
    ];

    // --- 2. Act ---
    let enriched = MetadataGenerator::new(&provider, &config)
        .enrich(blocks(&contents))
        .await;

    // --- 3. Assert ---
    assert_eq!(enriched[0].sliding_context, None);
    assert_eq!(enriched[1].sliding_context.as_deref(), Some("乙".repeat(200).as_str()));
    assert_eq!(enriched[2].sliding_context.as_deref(), Some("短块。"));
    assert!(enriched.iter().all(|b| b.anchor.is_none()));
    assert!(provider.get_calls().is_empty());
}

#[tokio::test]
async fn test_sliding_context_length_is_capped() {
    let provider = MockAiProvider::new();
    let config = ExtractionConfig {
        enable_llm_anchor: false,
        sliding_context_chars: 500,
        ..ExtractionConfig::default()
    };
    let contents = vec![
        format!("{}{}", "甲".repeat(300), "乙".repeat(200)),
        "短块。".to_string(),
    ];

    let enriched = MetadataGenerator::new(&provider, &config)
        .enrich(blocks(&contents))
        .await;

    assert_eq!(enriched[1].sliding_context.as_deref(), Some("乙".repeat(200).as_str()));
}

#[tokio::test]
async fn test_sliding_context_can_be_disabled() {
    let provider = MockAiProvider::new();
    let config = ExtractionConfig {
        enable_sliding_context: false,
        enable_llm_anchor: false,
        ..ExtractionConfig::default()
    };

    let enriched = MetadataGenerator::new(&provider, &config)
        .enrich(blocks(&["一。".to_string(), "二。".to_string()]))
        .await;

    assert!(enriched.iter().all(|b| b.sliding_context.is_none()));
}

#[tokio::test]
async fn test_block_anchors_are_generated_in_order() {
    // --- 1. Arrange ---
    let provider = MockAiProvider::new();
    provider.add_response("苹果", "关键词：苹果，消费品，长期持有");
    provider.add_response("茅台", "「茅台」、「护城河」、「定价权」、「多余」");

    // --- 2. Act ---
    let enriched = MetadataGenerator::new(&provider, &block_mode())
        .enrich(blocks(&[
            "段永平：苹果是好公司。".to_string(),
            "段永平：茅台也是。".to_string(),
        ]))
        .await;

    // --- 3. Assert ---
    assert_eq!(enriched[0].anchor.as_deref(), Some("苹果、消费品、长期持有"));
    assert_eq!(enriched[1].anchor.as_deref(), Some("茅台、护城河、定价权"));
    assert_eq!(provider.count_calls(ANCHOR_INSTRUCTION), 2);
}

#[tokio::test]
async fn test_anchor_failure_does_not_stop_enrichment() {
    let provider = MockAiProvider::new();
    provider.add_failure("坏", "model crashed");
    provider.add_response("空", "   ");
    provider.add_response("好", "投资");

    let enriched = MetadataGenerator::new(&provider, &block_mode())
        .enrich(blocks(&["坏块。".to_string(), "空块。".to_string(), "好块。".to_string()]))
        .await;

    assert_eq!(enriched[0].anchor, None);
    assert_eq!(enriched[1].anchor, None);
    assert_eq!(enriched[2].anchor.as_deref(), Some("投资"));
    assert_eq!(enriched[1].sliding_context.as_deref(), Some("坏块。"));
}

#[tokio::test]
async fn test_pair_mode_skips_block_anchors() {
    let provider = MockAiProvider::new();
    provider.set_default_response("不应被调用");

    let enriched = MetadataGenerator::new(&provider, &ExtractionConfig::default())
        .enrich(blocks(&["一。".to_string(), "二。".to_string()]))
        .await;

    assert!(enriched.iter().all(|b| b.anchor.is_none()));
    assert!(provider.get_calls().is_empty());
}

#[tokio::test]
async fn test_anchor_prompt_sees_only_the_start_of_long_text() {
    let provider = MockAiProvider::new();
    provider.set_default_response("长文");
    let text = format!("{}{}", "前".repeat(1500), "后".repeat(500));

    let anchor = MetadataGenerator::new(&provider, &ExtractionConfig::default())
        .generate_anchor(&text)
        .await;

    assert_eq!(anchor.as_deref(), Some("长文"));
    let calls = provider.get_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains(ANCHOR_INSTRUCTION));
    assert!(calls[0].contains(&"前".repeat(1500)));
    assert!(!calls[0].contains('后'));
}

#[test]
fn test_parse_anchor_respects_the_keyword_count() {
    assert_eq!(parse_anchor("投资、公司、长期、现金流", 2).as_deref(), Some("投资、公司"));
    assert_eq!(parse_anchor("核心主题关键词：价值投资", 3).as_deref(), Some("价值投资"));
    assert_eq!(parse_anchor("\"\"", 3), None);
}
