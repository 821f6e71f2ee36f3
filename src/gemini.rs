//! Gemini `generateContent` client used by the remote instruction source.

use serde::{Deserialize, Serialize};

use crate::generate::GenerateError;

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Base endpoint URL.
    pub endpoint: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token cap for the instruction array.
    pub max_output_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-3-flash-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            max_output_tokens: 1000,
            timeout_secs: 30,
        }
    }
}

impl GeminiConfig {
    /// Config from the `GEMINI_API_KEY` environment variable, if set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(Self {
            api_key,
            ..Self::default()
        })
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerateError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, self.config.api_key
        )
    }

    /// Send one user text and return the model's text reply.
    pub async fn complete(&self, text: &str) -> Result<String, GenerateError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: text.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.build_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Response(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GenerateError::Http(e.to_string()))?;

        parse_envelope(&body)
    }
}

// Gemini API request/response structures

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContentResponse,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Unwrap the provider envelope down to the nested text payload.
fn parse_envelope(body: &str) -> Result<String, GenerateError> {
    let parsed: GeminiResponse =
        serde_json::from_str(body).map_err(|e| GenerateError::Parse(e.to_string()))?;

    if let Some(error) = parsed.error {
        return Err(GenerateError::Response(format!(
            "Gemini API error: {}",
            error.message
        )));
    }

    parsed
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| GenerateError::Response("no content in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_generate_content() {
        let config = GeminiConfig::default();
        assert!(config.endpoint.contains("generativelanguage.googleapis.com"));
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_output_tokens, 1000);
    }

    #[test]
    fn build_url_includes_model_and_key() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: "test-key".to_string(),
            ..GeminiConfig::default()
        })
        .unwrap();
        let url = client.build_url();
        assert!(url.contains(":generateContent"));
        assert!(url.contains("key=test-key"));
    }

    #[test]
    fn envelope_unwraps_nested_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"[{\"type\":\"circle\"}]"}]}}]}"#;
        assert_eq!(parse_envelope(body).unwrap(), r#"[{"type":"circle"}]"#);
    }

    #[test]
    fn envelope_without_candidates_is_an_error() {
        assert!(parse_envelope(r#"{"candidates":[]}"#).is_err());
        assert!(parse_envelope(r#"{}"#).is_err());
        assert!(parse_envelope("not json").is_err());
    }

    #[test]
    fn envelope_surfaces_api_errors() {
        let body = r#"{"error":{"message":"quota exceeded"}}"#;
        let err = parse_envelope(body).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }
}
