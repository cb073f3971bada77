//! Runtime configuration, read from the environment (and a `.env` file).

use std::str::FromStr;
use std::sync::Arc;

use crate::{
    builder::{LLMBackend, LLMBuilder},
    chat::ChatProvider,
    error::LLMError,
};

/// Sampling temperature used for every stage unless overridden.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
/// Address the web page is served on unless overridden.
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

pub const MODEL_ENV: &str = "PYGPT_MODEL";
pub const TEMPERATURE_ENV: &str = "PYGPT_TEMPERATURE";
pub const BASE_URL_ENV: &str = "PYGPT_BASE_URL";
pub const BACKEND_ENV: &str = "PYGPT_BACKEND";
pub const BIND_ENV: &str = "PYGPT_BIND";

/// Where the API key for a backend is looked up.
pub fn api_key_env(backend: LLMBackend) -> &'static str {
    match backend {
        LLMBackend::Groq => "GROQ_API_KEY",
        LLMBackend::OpenAI => "OPENAI_API_KEY",
    }
}

/// Unset and blank variables are treated alike.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend: LLMBackend,
    pub api_key: Option<String>,
    /// `None` means the backend's default model.
    pub model: Option<String>,
    pub temperature: f32,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub bind: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: LLMBackend::Groq,
            api_key: None,
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            base_url: None,
            max_tokens: None,
            timeout_seconds: None,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, LLMError> {
        if let Ok(path) = dotenv::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LLMError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| non_blank(lookup(key));

        if let Some(backend) = get(BACKEND_ENV) {
            config.backend = LLMBackend::from_str(&backend)?;
        }
        config.api_key = get(api_key_env(config.backend));
        config.model = get(MODEL_ENV);
        if let Some(temperature) = get(TEMPERATURE_ENV) {
            config.temperature = temperature.trim().parse().map_err(|_| {
                LLMError::InvalidRequest(format!(
                    "{TEMPERATURE_ENV} must be a number, got '{temperature}'"
                ))
            })?;
        }
        config.base_url = get(BASE_URL_ENV);
        if let Some(bind) = get(BIND_ENV) {
            config.bind = bind;
        }

        Ok(config)
    }

    /// Switches to `backend`, re-reading its API key from `lookup`.
    ///
    /// Staying on the current backend keeps the key already loaded.
    pub fn switch_backend<F>(&mut self, backend: LLMBackend, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if backend != self.backend {
            self.backend = backend;
            self.api_key = non_blank(lookup(api_key_env(backend)));
        }
    }

    /// Builder carrying every setting of this configuration.
    pub fn llm_builder(&self) -> Result<LLMBuilder, LLMError> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            LLMError::AuthError(format!(
                "{} is not set; export it or put it in a .env file",
                api_key_env(self.backend)
            ))
        })?;

        let mut builder = LLMBuilder::new()
            .backend(self.backend)
            .api_key(api_key)
            .temperature(self.temperature);
        if let Some(model) = &self.model {
            builder = builder.model(model);
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(timeout) = self.timeout_seconds {
            builder = builder.timeout_seconds(timeout);
        }
        Ok(builder)
    }

    /// The provider every stage talks to.
    pub fn build_provider(&self) -> Result<Arc<dyn ChatProvider>, LLMError> {
        let provider = self.llm_builder()?.build()?;
        Ok(Arc::from(provider))
    }
}
