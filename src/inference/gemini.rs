// Google Gemini implementation of InferenceClient.
//
// Uses the Generative Language REST API's structured-output mode: the
// report schema goes in `generationConfig.responseSchema` with a JSON MIME
// type, and the model answers with a JSON document in its first text part.
//
// API docs: https://ai.google.dev/api/generate-content

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::traits::InferenceClient;
use crate::pipeline::error::RawPayloadError;
use crate::report::schema::ReportSchema;

/// Default model used for trend analysis.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Generative Language API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini structured-output client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for `model` at `base_url` (the public endpoint is
    /// [`DEFAULT_BASE_URL`]; proxies and tests point elsewhere).
    pub fn with_base_url(api_key: String, model: String, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn infer(&self, prompt: &str, schema: &ReportSchema) -> Result<Value> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema.json_schema(),
            },
        };

        debug!(
            model = %self.model,
            schema = schema.name(),
            prompt_chars = prompt.chars().count(),
            "Calling Gemini generateContent"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to call Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RawPayloadError::new(format!("Gemini API returned {status}"), body).into());
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        let text = result.first_text().ok_or_else(|| {
            anyhow::anyhow!(
                "Gemini returned no text candidate (finish reason: {})",
                result.first_finish_reason().unwrap_or("unknown")
            )
        })?;

        serde_json::from_str(&text).map_err(|e| {
            anyhow::Error::new(RawPayloadError::new(
                format!("Gemini output is not valid JSON: {e}"),
                text.clone(),
            ))
        })
    }
}

// --- Gemini API request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if it has any.
    fn first_text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }

    fn first_finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}
