use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::SearchError;
use crate::models::{RawDecision, RoutingDecision};

/// Low temperature keeps routing close to deterministic.
const CLASSIFY_TEMPERATURE: f32 = 0.3;

const MAX_QUERY_CHARS: usize = 500;

const ROUTER_SYSTEM_PROMPT: &str = "Bạn phân loại câu hỏi tìm kiếm Kinh Thánh tiếng Việt. CHỈ TRẢ VỀ JSON.

LOẠI TÌM KIẾM:

1. exact: có TÊN SÁCH và SỐ CHƯƠNG rõ ràng.
   Ví dụ: \"Thi thiên 23\", \"Giăng 3:16\", \"Sáng thế ký chương 5\", \"Ma-thi-ơ 6\"
   → searchType=\"exact\", bookCode, bookName, chapter

2. semantic: chỉ có chủ đề, cảm xúc, tình huống; KHÔNG có số chương.
   Ví dụ: \"Cô đơn\", \"Làm sao để tha thứ\", \"Chúa tạo ra con người phải không\",
   \"Tình yêu trong Giăng\" (có tên sách nhưng không có số chương)
   → searchType=\"semantic\", clarifiedQuery

3. scoped: chủ đề được giới hạn trong một sách (có thể kèm chương).
   Ví dụ: \"Tình yêu trong Giăng chương 3\", \"Phép lạ trong Ma-thi-ơ\"
   → searchType=\"scoped\", clarifiedQuery, bookCode, bookName, chapter (nếu có)

4. invalid: rõ ràng không thuộc phạm vi: toán học, khoa học thuần túy, tin tức,
   chính trị, thể thao, giải trí, trò chơi, lập trình, công nghệ, công thức nấu ăn,
   triệu chứng bệnh, hoặc chuỗi ký tự vô nghĩa.
   → searchType=\"invalid\"
   LUÔN CHẤP NHẬN câu hỏi về tâm linh, đạo đức, cảm xúc, triết lý sống,
   và nhân vật Kinh Thánh.

QUY TẮC:
- Tên sách + số chương rõ ràng → LUÔN là exact.
- Tên sách không có số chương → KHÔNG BAO GIỜ là exact.
- bookCode là mã 3 ký tự: GEN, EXO, PSA, PRO, ISA, MAT, MRK, LUK, JHN, ACT, ROM, 1CO, 1JN, REV...
- clarifiedQuery là cụm từ tìm kiếm tối ưu (tối đa 12 từ), mở rộng bằng các khái niệm
  thần học liên quan, không chép nguyên văn câu hỏi.
  Ví dụ: \"tha thứ\" → \"tha thứ, yêu kẻ thù, lòng thương xót\";
  \"cô đơn\" → \"cô đơn, Chúa ở cùng, không bỏ rơi, an ủi\".

JSON:
{\"searchType\":\"exact|semantic|scoped|invalid\",\"clarifiedQuery\":\"...\",\"bookCode\":\"...\",\"bookName\":\"...\",\"chapter\":0}";

/// Free-text query → routing decision.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, query: &str) -> Result<RoutingDecision, SearchError>;
}

/// Classifier backed by a JSON-mode chat completion.
pub struct LlmClassifier {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClassifier {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, query: &str) -> Result<RoutingDecision, SearchError> {
        let query = sanitize_for_prompt(&truncate_to_char_boundary(query, MAX_QUERY_CHARS));

        let response = match self.config.provider.as_str() {
            "ollama" => call_ollama(&self.client, &self.config, &query).await,
            "openai" => call_openai(&self.client, &self.config, &query).await,
            other => Err(anyhow::anyhow!("Unknown LLM provider: {other}")),
        }
        .map_err(SearchError::classification)?;

        tracing::debug!("Classifier raw output: {response}");
        parse_decision(&response)
    }
}

/// Parse the model's reply into a validated decision. Prose or markdown
/// fences around the JSON object are tolerated.
pub fn parse_decision(content: &str) -> Result<RoutingDecision, SearchError> {
    let json_str = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content,
    };

    let raw: RawDecision = serde_json::from_str(json_str).map_err(|e| {
        SearchError::Classification(format!("unparsable decision ({e}): {content}"))
    })?;

    RoutingDecision::try_from(raw)
}

/// Strip chat-template control tokens so user text cannot impersonate a role.
pub fn sanitize_for_prompt(text: &str) -> String {
    const TOKENS: [&str; 4] = ["<|im_start|>", "<|im_end|>", "<|endoftext|>", "<|eot_id|>"];
    let mut out = text.to_string();
    for token in TOKENS {
        out = out.replace(token, "");
    }
    out
}

fn truncate_to_char_boundary(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

fn router_messages(query: &str) -> Vec<Message> {
    vec![
        Message {
            role: "system".to_string(),
            content: ROUTER_SYSTEM_PROMPT.to_string(),
        },
        Message {
            role: "user".to_string(),
            content: query.to_string(),
        },
    ]
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

async fn call_ollama(client: &reqwest::Client, config: &LlmConfig, query: &str) -> Result<String> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaChatRequest {
        model: config.chat_model.clone(),
        messages: router_messages(query),
        stream: false,
        format: "json",
        options: OllamaOptions {
            temperature: CLASSIFY_TEMPERATURE,
        },
    };

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama chat API for classification")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let body: OllamaChatResponse = resp
        .json()
        .await
        .context("Failed to parse Ollama chat response")?;
    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

async fn call_openai(client: &reqwest::Client, config: &LlmConfig, query: &str) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: config.chat_model.clone(),
        messages: router_messages(query),
        temperature: CLASSIFY_TEMPERATURE,
        response_format: ResponseFormat {
            kind: "json_object",
        },
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI chat API for classification")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let body: OpenAiChatResponse = resp
        .json()
        .await
        .context("Failed to parse OpenAI chat response")?;
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("OpenAI chat response has no content")
}
