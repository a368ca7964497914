//! # Q&A Rule Tests

use legend_qa::segment::{QaRuleTable, QaRules, QaSignal};

#[test]
fn test_question_and_answer_markers_make_an_exchange() {
    let rules = QaRules::default();

    assert!(rules.has_qa("问：为什么要长期持有？\n\n段永平：因为买的是公司。"));
    assert!(rules.has_qa("网友:怎么看苹果？\n\n大道:好公司。"));
    assert!(!rules.has_qa("段永平：买股票就是买公司。"));
    assert!(!rules.has_qa("网友：有人在吗？"));
    assert!(!rules.has_qa(""));
}

#[test]
fn test_indirect_questions_count_without_a_question_mark() {
    let rules = QaRules::default();
    let text = "文章引用：价值投资在中国行不通。\n\n段：其实哪里都行得通。";

    assert_eq!(
        rules.signal(text),
        QaSignal {
            direct_question: false,
            indirect_question: true,
            answer: true,
        }
    );
    assert!(rules.has_qa(text));
}

#[test]
fn test_custom_rule_table() {
    let table = QaRuleTable {
        direct_question_markers: vec!["Interviewer:".to_string()],
        indirect_question_markers: vec![],
        answer_markers: vec!["Guest:".to_string()],
        known_prefixes: vec!["Interviewer".to_string()],
    };
    let rules = QaRules::compile(&table).unwrap();

    assert!(rules.has_qa("Interviewer：Why?\n\nGuest: Because."));
    assert!(!rules.has_qa("网友：为什么？\n\n段永平：因为。"));
    assert_eq!(rules.clean_question_text("Interviewer: Why?"), "Why?");
}

#[test]
fn test_markers_are_matched_literally() {
    let table = QaRuleTable {
        direct_question_markers: vec!["Q(1)：".to_string()],
        ..QaRuleTable::default()
    };
    let rules = QaRules::compile(&table).unwrap();

    assert!(rules.has_qa("Q(1)：什么？\n\n段：这个。"));
    assert!(!rules.has_qa("Q1：什么？\n\n段：这个。"));
}

#[test]
fn test_clean_question_text_strips_speaker_labels() {
    let rules = QaRules::default();

    assert_eq!(rules.clean_question_text("网友：什么是投资？"), "什么是投资？");
    assert_eq!(rules.clean_question_text("Q: 什么是能力圈？"), "什么是能力圈？");
    assert_eq!(rules.clean_question_text("小明同学：怎么选股？"), "怎么选股？");
    assert_eq!(rules.clean_question_text("怎么选股？"), "怎么选股？");
    assert_eq!(rules.clean_question_text("网友："), "");
}
