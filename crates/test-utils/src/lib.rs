use legend_qa::errors::PromptError;
use legend_qa::providers::ai::{AiProvider, GenerationOptions};
use async_trait::async_trait;
use serde_json::json;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
enum MockReply {
    Text(String),
    Fail(String),
}

#[derive(Clone, Debug)]
pub struct MockAiProvider {
    model: String,
    responses: Arc<Mutex<Vec<(String, MockReply)>>>,
    default_response: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-programs a response for any prompt containing `key`.
    /// Keys are checked in the order they were added.
    pub fn add_response(&self, key: &str, response: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses.push((key.to_string(), MockReply::Text(response.to_string())));
    }

    /// Makes every prompt containing `key` fail with an API error.
    pub fn add_failure(&self, key: &str, message: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses.push((key.to_string(), MockReply::Fail(message.to_string())));
    }

    /// The response used when no key matches.
    pub fn set_default_response(&self, response: &str) {
        *self.default_response.lock().unwrap() = Some(response.to_string());
    }

    /// Retrieves the recorded prompts for assertion.
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded prompts containing `key`.
    pub fn count_calls(&self, key: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|prompt| prompt.contains(key))
            .count()
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, PromptError> {
        self.calls.lock().unwrap().push(prompt.to_string());

        let responses = self.responses.lock().unwrap();
        for (key, reply) in responses.iter() {
            if prompt.contains(key.as_str()) {
                return match reply {
                    MockReply::Text(text) => Ok(text.clone()),
                    MockReply::Fail(message) => Err(PromptError::AiApi {
                        status: 500,
                        body: message.clone(),
                    }),
                };
            }
        }

        if let Some(default) = self.default_response.lock().unwrap().clone() {
            return Ok(default);
        }

        Err(PromptError::AiApi {
            status: 404,
            body: format!("MockAiProvider: No response programmed for prompt. Got: '{prompt}'"),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// --- Fixtures ---

/// A short transcript with three exchanges, one of them introduced by a quotation.
pub const SAMPLE_TRANSCRIPT: &str = "网友:什么是stop doing list？\n\n段永平：所谓要做对的事情实际上是通过不做不对的事情来实现的。发现错了就要停下来，不管多大的代价往往都是最小的代价。\n\n\n\n网友：您怎么看待长期持有？\n\n段永平：买股票就是买公司，买公司就是买公司未来的现金流。如果你不想持有十年，就不要持有十分钟。\n\n文章引用：有人认为价值投资很难学会。\n\n段：价值投资确实不容易，但有悟性的人可以提高。关键是要懂得什么是自己不懂的东西。";

/// Renders `pairs` the way a well-behaved model answers: a fenced JSON array.
pub fn extraction_response(pairs: &[(&str, &str)]) -> String {
    let items: Vec<_> = pairs
        .iter()
        .map(|(question, answer)| json!({ "question": question, "answer": answer }))
        .collect();
    format!("```json\n{}\n```", serde_json::Value::Array(items))
}

/// A paragraph of exactly `chars` characters with no Q&A markers.
pub fn filler_paragraph(chars: usize) -> String {
    "好".repeat(chars)
}

/// A paragraph of exactly `chars` characters that starts with a question label.
pub fn question_paragraph(chars: usize) -> String {
    let label = "网友：";
    let len = label.chars().count();
    assert!(chars >= len, "paragraph too short for its label");
    format!("{label}{}", "问".repeat(chars - len))
}

/// A paragraph of exactly `chars` characters that starts with an answer label.
pub fn answer_paragraph(chars: usize) -> String {
    let label = "段永平：";
    let len = label.chars().count();
    assert!(chars >= len, "paragraph too short for its label");
    format!("{label}{}", "答".repeat(chars - len))
}

// --- Test-Specific Helpers ---
#[cfg(feature = "pdf")]
pub mod helpers {
    use anyhow::Result;
    use printpdf::{
        BuiltinFont, Layer, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, Pt, TextItem,
        TextMatrix, TextRenderingMode,
    };

    /// Generates a single-page PDF with one text line per entry of `lines`.
    pub fn generate_test_pdf(lines: &[&str]) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new("Transcript");
        let mut page = PdfPage::new(Mm(210.0), Mm(297.0), vec![]);
        let layer_id = doc.add_layer(&Layer::new("Layer 1"));

        let font_bytes = BuiltinFont::Helvetica.get_subset_font().bytes;
        let font = ParsedFont::from_bytes(&font_bytes, 0, &mut Vec::new())
            .ok_or_else(|| anyhow::anyhow!("Failed to parse built-in font"))?;
        let font_id = doc.add_font(&font);

        let mut ops = vec![Op::BeginLayer {
            layer_id: layer_id.clone(),
        }];
        for (i, line) in lines.iter().enumerate() {
            ops.extend([
                Op::StartTextSection,
                Op::SetFontSize {
                    size: Pt(12.0),
                    font: font_id.clone(),
                },
                Op::SetTextMatrix {
                    matrix: TextMatrix::Translate(
                        Mm(10.0).into(),
                        Mm(280.0 - 10.0 * i as f32).into(),
                    ),
                },
                Op::SetTextRenderingMode {
                    mode: TextRenderingMode::Fill,
                },
                Op::WriteText {
                    items: vec![TextItem::Text(line.to_string())],
                    font: font_id.clone(),
                },
                Op::EndTextSection,
            ]);
        }
        ops.push(Op::EndLayer { layer_id });

        page.ops = ops;
        doc.pages.push(page);

        let mut warnings = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            eprintln!("PDF generation warnings: {warnings:?}");
        }

        Ok(bytes)
    }
}
