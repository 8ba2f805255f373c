use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{ChatClient, ChatRequest};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Chat-completions client for the hosted model behind every narrative,
/// strategy, and sentiment call.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openai_api_key()?.to_string();
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = std::env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build openai http client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    async fn create_completion(&self, req: &ChatRequest) -> anyhow::Result<ChatCompletionResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );

        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": req.system },
                { "role": "user", "content": req.user }
            ],
            "temperature": req.temperature,
        });
        if req.json_response {
            body["response_format"] = json!({ "type": "json_object" });
        }
        if let Some(max_tokens) = req.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("openai request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read openai response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError {
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
            }
            .into());
        }

        serde_json::from_str::<ChatCompletionResponse>(&text).map_err(|e| {
            LlmDiagnosticsError {
                stage: "decode",
                detail: e.to_string(),
                raw_output: Some(text),
            }
            .into()
        })
    }
}

#[async_trait::async_trait]
impl ChatClient for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> anyhow::Result<String> {
        let res = self.create_completion(&request).await?;
        let choice = res.choices.into_iter().next().ok_or_else(|| {
            anyhow::Error::from(LlmDiagnosticsError {
                stage: "decode",
                detail: "response contained no choices".to_string(),
                raw_output: None,
            })
        })?;
        Ok(choice.message.content)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_completion_payload() {
        let res: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "{\"ok\":true}" }, "finish_reason": "stop" }
            ]
        }))
        .unwrap();
        assert_eq!(res.choices[0].message.content, "{\"ok\":true}");
    }
}
