use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CompareError;
use crate::summary::{build_prompt, Summarizer, SummaryInput};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_SNIPPET_CHARS: usize = 4000;

/// Explicit configuration for [`GeminiSummarizer`].
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL; the `/v1beta/models/...` path is appended.
    pub endpoint: String,
    pub timeout: Duration,
    /// Maximum characters of each raw Splunk text placed in the prompt.
    pub snippet_chars: usize,
}

impl SummarizerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(60),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars;
        self
    }
}

/// Summarizer backed by the Gemini `generateContent` REST API.
pub struct GeminiSummarizer {
    inner: reqwest::Client,
    config: SummarizerConfig,
}

impl GeminiSummarizer {
    /// Fails with [`CompareError::Config`] when the API key or model is blank.
    pub fn new(config: SummarizerConfig) -> Result<Self, CompareError> {
        if config.api_key.trim().is_empty() {
            return Err(CompareError::Config(
                "Generative AI API key is not configured".to_string(),
            ));
        }
        if config.model.trim().is_empty() {
            return Err(CompareError::Config("model name must not be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("perfcompare/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: client,
            config,
        })
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn response_text(response: GenerateResponse) -> Result<String, CompareError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(CompareError::Summarizer(
            "model returned no candidates".to_string(),
        ));
    };
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(CompareError::Summarizer(format!(
            "model returned an empty response (finish reason: {reason})"
        )));
    }
    Ok(text)
}

impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, input: &SummaryInput<'_>) -> Result<String, CompareError> {
        let prompt = build_prompt(input, self.config.snippet_chars)?;
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: &prompt }],
            }],
        };

        tracing::debug!(model = %self.config.model, prompt_chars = prompt.len(), "requesting AI summary");

        let response = self
            .inner
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompareError::Summarizer(format!("request failed: {e}")))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CompareError::Summarizer(format!("reading response failed: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&bytes)
                .map(|env| env.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(CompareError::Summarizer(message));
        }

        let parsed: GenerateResponse = serde_json::from_slice(&bytes)
            .map_err(|e| CompareError::Summarizer(format!("invalid response: {e}")))?;
        let text = response_text(parsed)?;
        tracing::info!(chars = text.len(), "received AI summary");
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = SummarizerConfig::new("key-123");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.snippet_chars, DEFAULT_SNIPPET_CHARS);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn blank_api_key_fails_construction() {
        let result = GeminiSummarizer::new(SummarizerConfig::new("   "));
        match result {
            Err(CompareError::Config(msg)) => assert!(msg.contains("API key")),
            Err(other) => panic!("expected config error, got {other:?}"),
            Ok(_) => panic!("expected construction to fail"),
        }
    }

    #[test]
    fn blank_model_fails_construction() {
        let result = GeminiSummarizer::new(SummarizerConfig::new("k").model(""));
        assert!(matches!(result, Err(CompareError::Config(_))));
    }

    #[test]
    fn url_joins_endpoint_and_model() {
        let summarizer = GeminiSummarizer::new(
            SummarizerConfig::new("k")
                .endpoint("http://localhost:9999/")
                .model("gemini-test"),
        )
        .unwrap();
        assert_eq!(
            summarizer.url(),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn response_text_concatenates_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"**1. Executive"},{"text":" Summary**"}]},
                "finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(response).unwrap(), "**1. Executive Summary**");
    }

    #[test]
    fn response_without_candidates_is_error() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            response_text(response),
            Err(CompareError::Summarizer(_))
        ));
    }

    #[test]
    fn blocked_response_reports_finish_reason() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        let err = response_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: "hello" }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }
}
