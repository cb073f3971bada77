//! OpenAI-compatible API client base implementation
//!
//! Groq and OpenAI both speak the `chat/completions` dialect, so a single
//! generic provider serves them; each backend only supplies an
//! [`OpenAICompatibleConfig`].

use crate::chat::{ChatMessage, ChatProvider, ChatResponse, ChatRole, Usage};
use crate::error::LLMError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Generic OpenAI-compatible provider
pub struct OpenAICompatibleProvider<T: OpenAICompatibleConfig> {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub client: Client,
    _phantom: PhantomData<T>,
}

/// Configuration trait for OpenAI-compatible providers
pub trait OpenAICompatibleConfig: Send + Sync {
    /// The name of the provider (e.g., "Groq", "OpenAI")
    const PROVIDER_NAME: &'static str;

    /// Default base URL for the provider
    const DEFAULT_BASE_URL: &'static str;

    /// Default model for the provider
    const DEFAULT_MODEL: &'static str;

    /// Chat completions endpoint path (usually "chat/completions")
    const CHAT_ENDPOINT: &'static str = "chat/completions";
}

/// Generic OpenAI-compatible chat message
#[derive(Serialize, Debug)]
pub struct OpenAICompatibleChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Generic OpenAI-compatible chat request
#[derive(Serialize, Debug)]
pub struct OpenAICompatibleChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<OpenAICompatibleChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
}

/// Generic OpenAI-compatible chat response
#[derive(Deserialize, Debug)]
pub struct OpenAICompatibleChatResponse {
    pub choices: Vec<OpenAICompatibleChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
pub struct OpenAICompatibleChatChoice {
    pub message: OpenAICompatibleChatMsg,
}

#[derive(Deserialize, Debug)]
pub struct OpenAICompatibleChatMsg {
    pub role: String,
    pub content: Option<String>,
}

impl ChatResponse for OpenAICompatibleChatResponse {
    fn text(&self) -> Option<String> {
        self.choices.first().and_then(|c| c.message.content.clone())
    }

    fn usage(&self) -> Option<Usage> {
        self.usage.clone()
    }
}

impl std::fmt::Display for OpenAICompatibleChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.choices.first().and_then(|c| c.message.content.as_deref()) {
            Some(content) => write!(f, "{content}"),
            None => write!(f, ""),
        }
    }
}

impl<T: OpenAICompatibleConfig> OpenAICompatibleProvider<T> {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        timeout_seconds: Option<u64>,
        system: Option<String>,
    ) -> Result<Self, LLMError> {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(std::time::Duration::from_secs(sec));
        }

        let mut base = base_url.unwrap_or_else(|| T::DEFAULT_BASE_URL.to_owned());
        // Url::join drops the last path segment unless it ends with a slash.
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            LLMError::InvalidRequest(format!("Invalid {} base URL {base}: {e}", T::PROVIDER_NAME))
        })?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            model: model.unwrap_or_else(|| T::DEFAULT_MODEL.to_string()),
            max_tokens,
            temperature,
            system,
            timeout_seconds,
            client: builder.build()?,
            _phantom: PhantomData,
        })
    }

    fn build_request<'a>(&'a self, messages: &'a [ChatMessage]) -> OpenAICompatibleChatRequest<'a> {
        let mut openai_msgs: Vec<OpenAICompatibleChatMessage> = messages
            .iter()
            .map(|msg| OpenAICompatibleChatMessage {
                role: match msg.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                },
                content: &msg.content,
            })
            .collect();

        if let Some(system) = &self.system {
            openai_msgs.insert(
                0,
                OpenAICompatibleChatMessage {
                    role: "system",
                    content: system,
                },
            );
        }

        OpenAICompatibleChatRequest {
            model: &self.model,
            messages: openai_msgs,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        }
    }
}

#[async_trait]
impl<T: OpenAICompatibleConfig> ChatProvider for OpenAICompatibleProvider<T> {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        if self.api_key.is_empty() {
            return Err(LLMError::AuthError(format!(
                "Missing {} API key",
                T::PROVIDER_NAME
            )));
        }

        let body = self.build_request(messages);

        let url = self
            .base_url
            .join(T::CHAT_ENDPOINT)
            .map_err(|e| LLMError::HttpError(e.to_string()))?;

        let request = self.client.post(url).bearer_auth(&self.api_key).json(&body);

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("{} request payload: {}", T::PROVIDER_NAME, json);
            }
        }

        let response = request.send().await?;

        log::debug!("{} HTTP status: {}", T::PROVIDER_NAME, response.status());

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let error_text = response.text().await?;
            return Err(LLMError::AuthError(format!(
                "{} rejected the API key ({status}): {error_text}",
                T::PROVIDER_NAME
            )));
        }
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(LLMError::ResponseFormatError {
                message: format!("{} API returned error status: {status}", T::PROVIDER_NAME),
                raw_response: error_text,
            });
        }

        let resp_text = response.text().await?;
        match serde_json::from_str::<OpenAICompatibleChatResponse>(&resp_text) {
            Ok(response) => Ok(Box::new(response)),
            Err(e) => Err(LLMError::ResponseFormatError {
                message: format!("Failed to decode {} API response: {e}", T::PROVIDER_NAME),
                raw_response: resp_text,
            }),
        }
    }

    fn name(&self) -> &str {
        T::PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestConfig;

    impl OpenAICompatibleConfig for TestConfig {
        const PROVIDER_NAME: &'static str = "Test";
        const DEFAULT_BASE_URL: &'static str = "http://localhost:9/v1";
        const DEFAULT_MODEL: &'static str = "test-model";
    }

    #[test]
    fn base_url_gets_a_trailing_slash() {
        let provider =
            OpenAICompatibleProvider::<TestConfig>::new("k", None, None, None, None, None, None)
                .unwrap();
        assert_eq!(provider.base_url.as_str(), "http://localhost:9/v1/");
        assert_eq!(
            provider.base_url.join(TestConfig::CHAT_ENDPOINT).unwrap().as_str(),
            "http://localhost:9/v1/chat/completions"
        );
        assert_eq!(provider.model, "test-model");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = OpenAICompatibleProvider::<TestConfig>::new(
            "k",
            Some("not a url".into()),
            None,
            None,
            None,
            None,
            None,
        )
        .err()
        .unwrap();
        assert!(matches!(err, LLMError::InvalidRequest(_)));
    }

    #[test]
    fn request_body_matches_the_wire_format() {
        let provider = OpenAICompatibleProvider::<TestConfig>::new(
            "k",
            None,
            Some("llama3-8b-8192".into()),
            None,
            Some(0.8),
            None,
            Some("be brief".into()),
        )
        .unwrap();
        let messages = [ChatMessage::user().content("Write Python code on this topic: x").build()];
        let body = serde_json::to_value(provider.build_request(&messages)).unwrap();
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["stream"], false);
        assert_eq!(
            body["messages"],
            serde_json::json!([
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "Write Python code on this topic: x"}
            ])
        );
        let temperature = body["temperature"].as_f64().unwrap();
        assert!((temperature - 0.8).abs() < 1e-6);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn empty_choices_yield_no_text() {
        let resp: OpenAICompatibleChatResponse =
            serde_json::from_str(r#"{"choices":[],"usage":null}"#).unwrap();
        assert_eq!(resp.text(), None);
        assert_eq!(resp.to_string(), "");
    }
}
