// src/services/gemini_service.rs
use crate::config::GeminiConfig;
use crate::errors::RestyleError;
use crate::models::{GeneratedImage, SourceImage};
use crate::services::{ImageProcessor, Restyler};
use crate::style::{Intensity, StyleOptions};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;

const ERROR_BODY_LIMIT: usize = 500;

pub struct GeminiRestyler {
    api_key: String,
    model: String,
    base_url: String,
    max_source_dimension: u32,
    client: Client,
    processor: Arc<ImageProcessor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

fn intensity_guidance(intensity: Intensity) -> &'static str {
    match intensity {
        Intensity::Low => {
            "Apply the style subtly. Keep most of the photographic detail and realism."
        }
        Intensity::Medium => {
            "Apply the style clearly while keeping subjects, faces and composition recognizable."
        }
        Intensity::High => {
            "Fully transform the photo into the new style. Only the composition and main subjects need to remain."
        }
    }
}

pub fn build_prompt(options: &StyleOptions) -> String {
    let mut prompt = String::from(
        "Restyle the provided photo into a new artistic image. Preserve the original composition and subjects.\n",
    );

    let description = options.description.trim();
    if !description.is_empty() {
        prompt.push_str(&format!("Style description: {}\n", description));
    }
    prompt.push_str(&format!(
        "Restyle intensity: {}. {}\n",
        options.intensity,
        intensity_guidance(options.intensity)
    ));
    prompt.push_str(&format!("Lighting mood: {}.\n", options.lighting));
    prompt.push_str(&format!("Color tone: {}.\n", options.color));
    prompt.push_str(&format!("Texture: {}.\n", options.texture));

    let influence = options.influence.trim();
    if !influence.is_empty() {
        prompt.push_str(&format!("Artistic influence: {}.\n", influence));
    }
    prompt.push_str("Respond with the restyled image only.");
    prompt
}

fn truncate(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{}...", truncated)
}

/// Pulls a readable message out of a failed response body.
fn error_message_from_body(status: reqwest::StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
            .filter(|m| !m.trim().is_empty())
        {
            return message.trim().to_string();
        }
    }
    if trimmed.is_empty() {
        return format!("Image service returned {}", status);
    }
    truncate(trimmed, ERROR_BODY_LIMIT)
}

fn is_safety_reason(reason: &str) -> bool {
    matches!(
        reason,
        "SAFETY" | "IMAGE_SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII"
    )
}

fn extract_image(
    response: GeminiResponse,
    model: &str,
    prompt: &str,
) -> Result<GeneratedImage, RestyleError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(RestyleError::Generation(format!(
            "The request was blocked by the content policy ({})",
            reason
        )));
    }

    let mut texts = Vec::new();
    let mut safety_stop = None;
    for candidate in response.candidates {
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if is_safety_reason(reason) {
                safety_stop = Some(reason.to_string());
            }
        }
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(inline) = part.inline_data {
                if inline.mime_type.starts_with("image/") {
                    let bytes = general_purpose::STANDARD.decode(inline.data).map_err(|e| {
                        RestyleError::Generation(format!("Failed to decode image: {}", e))
                    })?;
                    return Ok(GeneratedImage::from_bytes(bytes, inline.mime_type, prompt));
                }
            }
            if let Some(text) = part.text {
                let text = text.trim().to_string();
                if !text.is_empty() {
                    texts.push(text);
                }
            }
        }
    }

    if let Some(reason) = safety_stop {
        return Err(RestyleError::Generation(format!(
            "The image was rejected by the content policy ({})",
            reason
        )));
    }

    let mut message = format!("No image returned by the model ({})", model);
    if !texts.is_empty() {
        message.push_str(&format!(": {}", truncate(&texts.join(" "), ERROR_BODY_LIMIT)));
    }
    Err(RestyleError::Generation(message))
}

impl GeminiRestyler {
    pub fn new(config: &GeminiConfig, processor: Arc<ImageProcessor>) -> Result<Self, RestyleError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RestyleError::Generation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_source_dimension: config.max_source_dimension,
            client,
            processor,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl Restyler for GeminiRestyler {
    async fn restyle(
        &self,
        image: &SourceImage,
        options: &StyleOptions,
    ) -> Result<GeneratedImage, RestyleError> {
        let start = Instant::now();
        let processor = Arc::clone(&self.processor);
        let data = image.data.clone();
        let max_size = self.max_source_dimension;
        let (payload_image, mime_type) =
            tokio::task::spawn_blocking(move || processor.resize_if_needed(&data, max_size))
                .await
                .map_err(|e| {
                    RestyleError::ImageProcessing(format!("Image preparation task failed: {}", e))
                })??;

        let prompt = build_prompt(options);
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": prompt },
                    {
                        "inlineData": {
                            "mimeType": mime_type,
                            "data": general_purpose::STANDARD.encode(&payload_image)
                        }
                    }
                ]
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE", "TEXT"]
            }
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RestyleError::Generation(format!("Image service request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::warn!(
                "Gemini error: status={}, body={}",
                status,
                truncate(&error_text, ERROR_BODY_LIMIT)
            );
            return Err(RestyleError::Generation(error_message_from_body(
                status,
                &error_text,
            )));
        }

        let result: GeminiResponse = response.json().await.map_err(|e| {
            RestyleError::Generation(format!("Failed to parse image service response: {}", e))
        })?;

        let generated = extract_image(result, &self.model, &prompt)?;
        log::debug!(
            "Gemini returned {} ({} bytes) in {}ms",
            generated.mime_type,
            generated.data.len(),
            start.elapsed().as_millis()
        );
        Ok(generated)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
