//! Blocking HTTP client for an OpenAI-compatible chat completion endpoint

use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};

use super::{CompletionRequest, LlmService};
use crate::config::AiConfig;

/// Chat-completion client
///
/// Built once at startup from config and passed by reference wherever an
/// `LlmService` is needed. The timeout lives on the underlying HTTP client;
/// a request that exceeds it returns an error and the in-flight call is
/// abandoned.
pub struct OpenAiClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

impl LlmService for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            anyhow::bail!("No API key configured");
        };

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .with_context(|| format!("Completion request to {url} failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("AI service returned status {status}: {body}");
        }

        let parsed: ChatResponse = response
            .json()
            .context("Failed to parse completion response")?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .context("Completion response contained no choices")?;

        Ok(choice.message.content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(api_key: Option<&str>) -> AiConfig {
        AiConfig {
            api_key: api_key.map(str::to_string),
            base_url: "http://127.0.0.1:1/v1/".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_missing_api_key_fails_fast() -> Result<()> {
        let client = OpenAiClient::new(&test_config(None))?;
        let err = client
            .complete(&CompletionRequest::structured("sys", "user"))
            .unwrap_err();

        assert!(err.to_string().contains("No API key"));
        Ok(())
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() -> Result<()> {
        let client = OpenAiClient::new(&test_config(Some("key")))?;
        assert_eq!(client.base_url, "http://127.0.0.1:1/v1");
        Ok(())
    }

    #[test]
    fn test_chat_request_serialization() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "system",
                content: "hi",
            }],
            temperature: 0.3,
            max_tokens: 800,
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");

        let without_format = ChatRequest {
            response_format: None,
            ..body
        };
        let json = serde_json::to_value(&without_format).unwrap();
        assert!(json.get("response_format").is_none());
    }
}
