use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::{error, info};

use crate::models::GenerationRequest;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY is not configured")] Configuration,
    #[error("HTTP error: {0}")] Http(String),
    #[error("{0}")] Generation(String),
    #[error("Failed to decode response: {0}")] Decode(String),
}

/// Single request/response call to a text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeminiError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::Configuration)?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model, api_key
        );
        info!(
            "🔗 Making request to: {} (prompt {} chars, video attached: {})",
            url.replace(api_key, "***"),
            request.prompt.len(),
            request.video_url.is_some()
        );

        let body = build_body(&request);
        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| GeminiError::Http(e.to_string()))?;
        info!("📥 Response status: {}", status);

        if !status.is_success() {
            error!("❌ Gemini API generation failed with status {}: {}", status, response_text);
            return Err(GeminiError::Http(format!("status={} body={}", status, response_text)));
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| GeminiError::Decode(e.to_string()))?;

        let result = validate_response(&parsed);
        match &result {
            Ok(text) => info!("✅ Generated {} chars of text", text.len()),
            Err(e) => error!("❌ Generation rejected: {}", e),
        }
        result
    }
}

// --- Request Body ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPart<'a> {
    text: Option<&'a str>,
    file_data: Option<FileData<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    mime_type: &'static str,
    file_uri: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

fn build_body(request: &GenerationRequest) -> GenerateContentBody<'_> {
    let mut parts = vec![RequestPart { text: Some(&request.prompt), file_data: None }];
    if let Some(video) = &request.video_url {
        parts.push(RequestPart {
            text: None,
            file_data: Some(FileData { mime_type: "video/mp4", file_uri: video }),
        });
    }
    GenerateContentBody {
        contents: vec![RequestContent { role: "user", parts }],
        generation_config: GenerationConfig { temperature: request.effective_temperature() },
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Other(serde_json::Value),
}

impl Candidate {
    fn text(&self) -> String {
        self.content.parts.iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::Other(_) => None,
            })
            .collect()
    }
}

/// Checks, in order: prompt block, missing candidates, abnormal finish reason.
fn validate_response(resp: &GeminiResponse) -> Result<String, GeminiError> {
    if let Some(reason) = resp.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()) {
        return Err(GeminiError::Generation(format!(
            "Content generation failed: prompt blocked (reason: {})", reason
        )));
    }

    let candidate = resp.candidates.first().ok_or_else(|| {
        GeminiError::Generation("Content generation failed: no candidates returned.".into())
    })?;

    match candidate.finish_reason.as_deref() {
        None | Some("STOP") => Ok(candidate.text()),
        Some("SAFETY") => Err(GeminiError::Generation(
            "Content generation failed: response blocked due to safety settings.".into(),
        )),
        Some(other) => Err(GeminiError::Generation(format!(
            "Content generation failed: stopped due to {}.", other
        ))),
    }
}
