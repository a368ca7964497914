//! # Segmentation Tests
//!
//! Checks the hybrid block builder against its partition and size guarantees,
//! plus preprocessing, QA filtering and sampling.

use legend_qa::segment::{
    char_len, filter_qa_blocks, preprocess_qa_text, sample_leading, split_paragraphs, BlockBounds,
    HybridBlockBuilder, QaRules, PARAGRAPH_SEPARATOR,
};
use legend_qa::Block;
use legend_qa_test_utils::{
    answer_paragraph, filler_paragraph, question_paragraph, SAMPLE_TRANSCRIPT,
};

fn bounds(min_size: usize, max_size: usize, qa_allowance_ratio: f64) -> BlockBounds {
    BlockBounds {
        min_size,
        max_size,
        qa_allowance_ratio,
    }
}

fn build(paragraphs: &[String], bounds: BlockBounds) -> Vec<Block> {
    let rules = QaRules::default();
    let refs: Vec<&str> = paragraphs.iter().map(String::as_str).collect();
    HybridBlockBuilder::new(bounds, &rules).build(&refs)
}

/// Paragraphs of pseudo-random lengths, each made of its own character.
fn varied_paragraphs(count: usize, max_len: usize) -> Vec<String> {
    let mut seed: u64 = 0x2545_f491;
    (0..count)
        .map(|i| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let len = 1 + (seed >> 33) as usize % max_len;
            let c = char::from_u32(0x4E00 + i as u32).unwrap();
            c.to_string().repeat(len)
        })
        .collect()
}

fn block_paragraphs(block: &Block) -> Vec<&str> {
    block.content.split(PARAGRAPH_SEPARATOR).collect()
}

#[test]
fn test_scenario_single_exchange_becomes_one_block() {
    let input = "网友：什么是投资？\n\n段永平：投资就是买公司。";
    let paragraphs: Vec<String> = split_paragraphs(input).into_iter().map(String::from).collect();

    let blocks = build(&paragraphs, bounds(10, 1000, 1.2));

    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].has_qa);
    assert_eq!(blocks[0].content, input);
    assert_eq!(blocks[0].paragraph_count, 2);
}

#[test]
fn test_scenario_plain_paragraphs_pack_greedily() {
    let paragraphs: Vec<String> = (0..5).map(|_| filler_paragraph(400)).collect();

    let blocks = build(&paragraphs, bounds(50, 1000, 1.2));

    let sizes: Vec<usize> = blocks.iter().map(Block::char_len).collect();
    assert_eq!(sizes, vec![802, 802, 400]);
    assert!(blocks.iter().all(|b| !b.has_qa));
}

#[test]
fn test_scenario_qa_allowance_accepts_up_to_the_relaxed_ceiling() {
    // 500 + 2 + 648 = 1150, inside max * 1.2 = 1200.
    let paragraphs = vec![question_paragraph(500), answer_paragraph(648)];

    let blocks = build(&paragraphs, bounds(50, 1000, 1.2));

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].char_len(), 1150);
    assert!(blocks[0].has_qa);
}

#[test]
fn test_scenario_qa_allowance_is_bounded() {
    // 500 + 2 + 699 = 1201, one past the relaxed ceiling.
    let paragraphs = vec![question_paragraph(500), answer_paragraph(699)];

    let blocks = build(&paragraphs, bounds(50, 1000, 1.2));

    let sizes: Vec<usize> = blocks.iter().map(Block::char_len).collect();
    assert_eq!(sizes, vec![500, 699]);
}

#[test]
fn test_allowance_needs_an_exchange() {
    // Same lengths as the accepted case, but without an answer marker.
    let paragraphs = vec![question_paragraph(500), filler_paragraph(648)];

    let blocks = build(&paragraphs, bounds(50, 1000, 1.2));

    assert_eq!(blocks.len(), 2);
}

#[test]
fn test_blocks_partition_paragraphs_in_order() {
    let paragraphs = varied_paragraphs(80, 450);

    let blocks = build(&paragraphs, bounds(0, 300, 1.2));

    let rebuilt: Vec<&str> = blocks.iter().flat_map(block_paragraphs).collect();
    let original: Vec<&str> = paragraphs.iter().map(String::as_str).collect();
    assert_eq!(rebuilt, original);
}

#[test]
fn test_dropped_blocks_leave_contiguous_runs() {
    let paragraphs = varied_paragraphs(80, 450);
    let original: Vec<&str> = paragraphs.iter().map(String::as_str).collect();

    let blocks = build(&paragraphs, bounds(150, 300, 1.2));

    let mut next_index = 0;
    for block in &blocks {
        assert!(block.char_len() >= 150, "block below min_size survived");
        let parts = block_paragraphs(block);
        let start = original[next_index..]
            .iter()
            .position(|p| *p == parts[0])
            .map(|offset| next_index + offset)
            .expect("block starts with a later paragraph");
        assert_eq!(&original[start..start + parts.len()], parts.as_slice());
        next_index = start + parts.len();
    }
}

#[test]
fn test_size_bound_with_mixed_content() {
    let mut paragraphs = Vec::new();
    for (i, len) in varied_paragraphs(60, 500).iter().map(|p| char_len(p)).enumerate() {
        let len = len.max(10);
        paragraphs.push(match i % 3 {
            0 => question_paragraph(len),
            1 => answer_paragraph(len),
            _ => filler_paragraph(len),
        });
    }
    let bounds = bounds(0, 400, 1.3);

    let blocks = build(&paragraphs, bounds);

    assert!(!blocks.is_empty());
    for block in &blocks {
        let len = block.char_len();
        let within_max = len <= bounds.max_size;
        let single_paragraph = block.paragraph_count == 1;
        let allowed_qa = block.has_qa && len <= bounds.qa_ceiling();
        assert!(
            within_max || single_paragraph || allowed_qa,
            "block of {len} chars with {} paragraphs breaks the size bound",
            block.paragraph_count
        );
    }
}

#[test]
fn test_oversized_paragraph_stays_whole() {
    let paragraphs = vec![
        filler_paragraph(100),
        filler_paragraph(2500),
        filler_paragraph(100),
    ];

    let blocks = build(&paragraphs, bounds(50, 1000, 1.2));

    let sizes: Vec<usize> = blocks.iter().map(Block::char_len).collect();
    assert_eq!(sizes, vec![100, 2500, 100]);
    assert!(blocks.iter().all(|b| b.paragraph_count == 1));
}

#[test]
fn test_short_blocks_are_dropped() {
    let paragraphs = vec![filler_paragraph(990), filler_paragraph(30)];

    let blocks = build(&paragraphs, bounds(50, 1000, 1.2));

    // 990 + 2 + 30 overflows, and the 30-char remainder is too short to keep.
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].char_len(), 990);
}

#[test]
fn test_empty_input_yields_no_blocks() {
    assert!(build(&[], bounds(0, 1000, 1.2)).is_empty());
    assert!(split_paragraphs("").is_empty());
    assert!(split_paragraphs("\n\n  \n\n").is_empty());
}

#[test]
fn test_preprocessing_normalizes_labels_and_blank_lines() {
    let text = preprocess_qa_text("网友:您好\n\n\n\n段永平:你好\n\n\n\n\n问:还有呢");

    assert_eq!(text, "网友：您好\n\n段永平：你好\n\n问：还有呢");
    assert_eq!(split_paragraphs(&text).len(), 3);
}

#[test]
fn test_sample_transcript_segments_into_one_qa_block() {
    let text = preprocess_qa_text(SAMPLE_TRANSCRIPT);
    let paragraphs: Vec<String> = split_paragraphs(&text).into_iter().map(String::from).collect();
    assert_eq!(paragraphs.len(), 6);

    let blocks = build(&paragraphs, bounds(100, 1500, 1.2));

    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].has_qa);
    assert!(blocks[0].content.starts_with("网友：什么是stop doing list？"));
}

#[test]
fn test_qa_filter_keeps_only_exchanges() {
    let rules = QaRules::default();
    let blocks = vec![
        Block::new("网友：为什么？\n\n段永平：因为。".to_string(), 2, true),
        Block::new(filler_paragraph(200), 1, false),
        Block::new("段永平：只有回答。".to_string(), 1, false),
        Block::new("有人说投资很难。\n\n大道：其实不难。".to_string(), 2, true),
    ];

    let kept = filter_qa_blocks(blocks, &rules);

    assert_eq!(kept.len(), 2);
    assert!(kept[0].content.starts_with("网友"));
    assert!(kept[1].content.starts_with("有人说"));
}

#[test]
fn test_sampling_keeps_a_leading_fraction() {
    let blocks: Vec<Block> = (0..10)
        .map(|i| Block::new(format!("block {i}"), 1, false))
        .collect();

    let sampled = sample_leading(blocks.clone(), 0.25);
    assert_eq!(sampled.len(), 2);
    assert_eq!(sampled[0].content, "block 0");

    assert_eq!(sample_leading(blocks.clone(), 0.01).len(), 1);
    assert_eq!(sample_leading(blocks.clone(), 1.0).len(), 10);
    assert!(sample_leading(blocks, 0.0).is_empty());
}
