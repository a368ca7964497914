//! # Q&A Extraction Prompts
//!
//! Two variants of the same instructions. The full template explains every
//! question form and carries worked examples; the compact one keeps only the
//! rules and the output format, for blocks that would not fit otherwise.

/// The full extraction template, with worked examples.
pub const FULL_EXTRACTION_TEMPLATE: &str = r#"你是一个专业的中文问答对提取专家。请从给定的原文中提取**所有**有效的问答对。

🎯 核心任务：
1. 识别所有形式的提问或话题引入
2. 匹配对应的段永平回答
3. 确保问答配对准确完整

📋 提取规则：
1. **问题来源**（多种形式）：
   - 直接提问：网友、问、观众、主持人、Q等开头
   - 文章引用：文章引用、引用、有人说等引出的观点或问题
   - 间接提问：通过描述、举例引出的问题
   - 话题讨论：任何引发段永平回应的内容

2. **答案来源**：仅限段永平、段、大道的回答（排除方丈、其他人）

3. **配对原则**：
   - 一个问题/话题对应一个段永平的回答
   - 问题可以是直接提问，也可以是引用、描述等形式
   - 保持问题和答案的完整性和上下文

4. **输出格式**：JSON数组 [{"question": "问题或话题", "answer": "段永平的回答"}]

❌ 不要提取的内容：
- 方丈的回答
- 其他专家、学者的观点（除非段永平对此有回应）
- 纯描述性文字（除非段永平对此有回应）
- 目录、标题等

✅ 提取示例：

原文1（直接提问）：
网友：什么是stop doing list？
段永平：所谓要做对的事情实际上是通过不做不对的事情来实现的。

原文2（文章引用形式）：
文章引用："微信之父"张小龙就曾说，乔布斯最厉害的地方是他1秒钟就能变成傻瓜。
段：是不是张小龙说的不知道，但这话其实很有道理。

原文3（描述引出）：
有人认为价值投资很难学会。
段：价值投资确实不容易，但有悟性的人可以提高。

输出：
[
  {"question": "什么是stop doing list？", "answer": "所谓要做对的事情实际上是通过不做不对的事情来实现的。"},
  {"question": "文章引用：微信之父张小龙就曾说，乔布斯最厉害的地方是他1秒钟就能变成傻瓜。", "answer": "是不是张小龙说的不知道，但这话其实很有道理。"},
  {"question": "有人认为价值投资很难学会。", "answer": "价值投资确实不容易，但有悟性的人可以提高。"}
]

🔍 请仔细分析以下原文，识别所有引发段永平回应的内容（包括直接提问、文章引用、描述等），并提取所有符合条件的问答对："#;

/// The compact extraction template: rules and output format only.
pub const COMPACT_EXTRACTION_TEMPLATE: &str = r#"从原文中提取所有问答对。
规则：
1. 问题：网友/问/观众/主持人/Q等直接提问，或文章引用/有人说/有人认为等引出的观点，或任何引发段永平回应的内容
2. 答案：仅限段永平、段、大道的回答，排除方丈及其他人
3. 一个问题对应一个回答，保持原文完整，不要改写
4. 只输出JSON数组：[{"question": "...", "answer": "..."}]，没有问答对时输出 []
原文："#;

/// Introduces the trailing excerpt of the previous block.
pub const CONTEXT_MARKER: &str = "【上文语境】";

/// Introduces the topic keywords of the current block.
pub const TOPIC_MARKER: &str = "【本段主题】";
