use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use receipt_domain::{
    receipt_json_schema, ExtractionOutcome, InferenceConfig, ReceiptExtraction, ReceiptExtractor,
};

const SYSTEM_PROMPT: &str = "You are an expert at extracting information from receipts. \
Extract the relevant information and format it as JSON with the following schema: ";
const USER_PROMPT: &str = "Extract receipt information";
const NO_CONTENT: &str = "Failed to extract receipt information";
const NOT_JSON: &str = "Failed to parse response as JSON";
const FALLBACK_MIME: &str = "image/jpeg";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    schema: Value,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Vision extractor speaking the OpenAI-compatible chat completions API.
pub struct VisionReceiptExtractor {
    client: Client,
    config: InferenceConfig,
}

impl VisionReceiptExtractor {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("failed to build inference http client")?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_with_retries(&self, request: &ChatRequest<'_>) -> Result<Option<ChatResponse>> {
        let url = self.endpoint();
        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self
                    .config
                    .retry_backoff_ms
                    .saturating_mul(1u64 << (attempt - 1).min(16));
                warn!(attempt, backoff_ms = backoff, "retrying inference request");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    last_err = Some(anyhow!("inference request to {} failed: {}", url, err));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let body = match response.bytes().await {
                    Ok(body) => body,
                    Err(err) => {
                        last_err = Some(anyhow!("reading inference response failed: {}", err));
                        continue;
                    }
                };
                // A body that does not look like a completion counts as no content.
                return Ok(match serde_json::from_slice::<ChatResponse>(&body) {
                    Ok(completion) => Some(completion),
                    Err(err) => {
                        debug!("inference response is not a completion: {}", err);
                        None
                    }
                });
            }

            let body = response.text().await.unwrap_or_default();
            let err = anyhow!("inference service returned {}: {}", status, body);
            if !is_retryable(status) {
                return Err(err);
            }
            last_err = Some(err);
        }

        Err(last_err.unwrap_or_else(|| anyhow!("inference request was never sent")))
    }
}

#[async_trait]
impl ReceiptExtractor for VisionReceiptExtractor {
    async fn extract(&self, image: &Path, content_type: &str) -> Result<ExtractionOutcome> {
        let bytes = tokio::fs::read(image)
            .await
            .with_context(|| format!("failed to read image {}", image.display()))?;
        let request = build_request(&self.config.model, &bytes, content_type);
        debug!(model = %self.config.model, bytes = bytes.len(), "sending image to vision model");

        let response = self.send_with_retries(&request).await?;
        let outcome = parse_completion(response.as_ref());
        match &outcome {
            ExtractionOutcome::Receipt(receipt) => info!(
                business = receipt.business_name.as_deref().unwrap_or("<unknown>"),
                items = receipt.line_items().len(),
                "receipt extracted"
            ),
            ExtractionOutcome::Failed { error } => warn!("extraction failed: {}", error),
        }
        Ok(outcome)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn image_mime(content_type: &str) -> &str {
    let mime = content_type.trim();
    if mime.starts_with("image/") {
        mime
    } else {
        FALLBACK_MIME
    }
}

fn data_url(bytes: &[u8], content_type: &str) -> String {
    format!("data:{};base64,{}", image_mime(content_type), STANDARD.encode(bytes))
}

fn build_request<'a>(model: &'a str, image: &[u8], content_type: &str) -> ChatRequest<'a> {
    let schema = receipt_json_schema();
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(format!("{}{}", SYSTEM_PROMPT, schema)),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: USER_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url(image, content_type),
                        },
                    },
                ]),
            },
        ],
        response_format: ResponseFormat {
            kind: "json_object",
            schema,
        },
    }
}

/// Turns a completion into a receipt, or into the error sentinel when the
/// model answered with nothing usable.
pub fn parse_completion(response: Option<&ChatResponse>) -> ExtractionOutcome {
    let content = response
        .and_then(|response| response.choices.first())
        .and_then(|choice| choice.message.content.as_deref())
        .map(str::trim)
        .filter(|content| !content.is_empty());
    let Some(content) = content else {
        return ExtractionOutcome::failed(NO_CONTENT);
    };

    let value = match serde_json::from_str::<Value>(strip_code_fence(content)) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            debug!("model returned non-object JSON: {}", other);
            return ExtractionOutcome::failed(NOT_JSON);
        }
        Err(err) => {
            debug!("model returned non-JSON content: {}", err);
            return ExtractionOutcome::failed(NOT_JSON);
        }
    };

    match serde_json::from_value::<ReceiptExtraction>(value) {
        Ok(receipt) => ExtractionOutcome::Receipt(receipt),
        Err(err) => {
            debug!("model JSON does not fit a receipt: {}", err);
            ExtractionOutcome::failed(NOT_JSON)
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
