use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{prompt::build_translation_prompt, TranslationRequest, Translator};
use crate::config::TranslateConfig;
use crate::error::{Result, ZirnevisError};

/// Gemini `generateContent` request body
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// Gemini `generateContent` response body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

impl GenerateContentResponse {
    pub fn from_body(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Concatenated, trimmed text of the first candidate
    pub fn text(&self) -> Result<String> {
        let Some(candidate) = self.candidates.first() else {
            let reason = self
                .prompt_feedback
                .as_ref()
                .and_then(|feedback| feedback.block_reason.clone())
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(ZirnevisError::Translation(format!("Gemini returned no translation: {}", reason)));
        };

        let text: String = candidate
            .content
            .iter()
            .flat_map(|content| content.parts.iter())
            .map(|part| part.text.as_str())
            .collect();
        let text = text.trim();

        if text.is_empty() {
            return Err(ZirnevisError::Translation(format!(
                "Empty translation received (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text.to_string())
    }
}

/// Translator backed by the Gemini REST API
pub struct GeminiTranslator {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiTranslator {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Build from configuration, failing when no API key is set
    pub fn from_config(config: &TranslateConfig) -> Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            ZirnevisError::Config(format!(
                "Gemini API key is not configured. Please set {}. Translation functionality will be disabled.",
                config.api_key_env
            ))
        })?;

        Self::new(api_key, config.endpoint.clone(), Duration::from_secs(config.timeout_secs))
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, model)
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String> {
        let body = GenerateContentRequest::from_prompt(build_translation_prompt(request));
        let url = self.generate_url(&request.model);

        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ZirnevisError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ZirnevisError::Translation(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ZirnevisError::Translation(format!("Failed to read response: {}", e)))?;
        let parsed = GenerateContentResponse::from_body(&body)?;

        let translation = parsed.text()?;
        debug!("Raw Gemini response: {}", translation);
        Ok(translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        GenerateContentResponse::from_body(json).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest::from_prompt("hello".to_string());
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_response_text_is_joined_and_trimmed() {
        let response = parse(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"  سلام "},{"text":"دنیا\n"}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(response.text().unwrap(), "سلام دنیا");
    }

    #[test]
    fn test_empty_candidate_is_an_error() {
        let response = parse(r#"{"candidates":[{"content":{"parts":[{"text":"   "}]},"finishReason":"MAX_TOKENS"}]}"#);
        let err = response.text().unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_blocked_prompt_is_an_error() {
        let response = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        let err = response.text().unwrap_err();
        assert!(matches!(err, ZirnevisError::Translation(_)));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_malformed_body_is_a_json_error() {
        let err = GenerateContentResponse::from_body("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ZirnevisError::Json(_)));
    }

    #[test]
    fn test_generate_url() {
        let translator = GeminiTranslator::new("key", "https://example.test/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            translator.generate_url("gemini-2.5-flash-preview-04-17"),
            "https://example.test/v1beta/models/gemini-2.5-flash-preview-04-17:generateContent"
        );
    }
}
