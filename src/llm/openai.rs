use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{is_usable_api_key, Config, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::error::{Error, Result};
use crate::llm::provider::{CompletionRequest, LLMProvider};

pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OpenAIProvider {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Result<Self> {
        Self::with_options(
            api_key,
            model,
            DEFAULT_BASE_URL.to_string(),
            std::time::Duration::from_secs(120),
        )
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_options(
            config.openai_api_key.clone(),
            Some(config.openai_model.clone()),
            config.openai_base_url.clone(),
            config.llm_timeout(),
        )
    }

    fn with_options(
        api_key: Option<String>,
        model: Option<String>,
        base_url: String,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let api_key = match self.api_key.as_deref() {
            Some(key) if is_usable_api_key(Some(key)) => key,
            _ => {
                return Err(Error::Config(
                    "OPENAI_API_KEY is not set".to_string(),
                ))
            }
        };

        tracing::debug!(
            "Sending {} prompt chars to {} (max_tokens={})",
            request.prompt.chars().count(),
            self.model,
            request.max_tokens
        );

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::LLMApi(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::LLMApi(format!("Failed to parse OpenAI response: {}", e)))?;

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::EmptyResponse);
        }

        tracing::debug!("Received {} chars from {}", text.chars().count(), self.model);
        Ok(text)
    }

    fn is_configured(&self) -> bool {
        is_usable_api_key(self.api_key.as_deref())
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

fn classify_failure(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED => Error::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(message),
        _ => Error::LLMApi(format!("OpenAI API error ({}): {}", status, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_failure() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        match classify_failure(StatusCode::UNAUTHORIZED, body) {
            Error::Authentication(msg) => assert_eq!(msg, "Incorrect API key provided"),
            other => panic!("unexpected: {:?}", other),
        }

        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            Error::RateLimited(_)
        ));

        match classify_failure(StatusCode::BAD_GATEWAY, "upstream down") {
            Error::LLMApi(msg) => assert!(msg.contains("upstream down")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_placeholder_key_is_not_configured() {
        let provider =
            OpenAIProvider::new(Some("your_openai_api_key_here".to_string()), None).unwrap();
        assert!(!provider.is_configured());
        assert_eq!(provider.model(), "gpt-3.5-turbo");

        let provider = OpenAIProvider::new(Some("sk-live".to_string()), None).unwrap();
        assert!(provider.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_makes_no_request() {
        let provider = OpenAIProvider::new(None, None).unwrap();
        let err = provider
            .complete(CompletionRequest::new("system", "prompt", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
