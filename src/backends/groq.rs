//! Groq API client implementation for chat functionality.
//!
//! This module provides integration with Groq's LLM models through their API.

use crate::providers::openai_compatible::{OpenAICompatibleConfig, OpenAICompatibleProvider};

/// Groq configuration for the generic provider
pub struct GroqConfig;

impl OpenAICompatibleConfig for GroqConfig {
    const PROVIDER_NAME: &'static str = "Groq";
    const DEFAULT_BASE_URL: &'static str = "https://api.groq.com/openai/v1/";
    const DEFAULT_MODEL: &'static str = "llama3-8b-8192";
}

pub type Groq = OpenAICompatibleProvider<GroqConfig>;

#[cfg(test)]
const LLM_API_KEY_ENV: &str = "GROQ_API_KEY";

#[tokio::test]
async fn test_groq_chat() -> Result<(), Box<dyn std::error::Error>> {
    use crate::{
        builder::{LLMBackend, LLMBuilder},
        chat::ChatMessage,
    };

    let api_key = match std::env::var(LLM_API_KEY_ENV) {
        Ok(key) => key,
        Err(_) => {
            eprintln!("test test_groq_chat ... ignored, {LLM_API_KEY_ENV} not set");
            return Ok(());
        }
    };
    let llm = LLMBuilder::new()
        .backend(LLMBackend::Groq)
        .api_key(api_key)
        .model("llama3-8b-8192")
        .max_tokens(512)
        .temperature(0.8)
        .build()
        .expect("Failed to build LLM");
    let messages = vec![ChatMessage::user()
        .content("Write Python code on this topic: bubble sort")
        .build()];
    let response = llm.chat(&messages).await?;
    assert!(
        !response.text().unwrap_or_default().is_empty(),
        "Expected response message, got {:?}",
        response.text()
    );
    let usage = response.usage().expect("Expected usage information to be present");
    assert!(usage.prompt_tokens > 0, "Expected prompt tokens, got {}", usage.prompt_tokens);
    assert!(
        usage.completion_tokens > 0,
        "Expected completion tokens, got {}",
        usage.completion_tokens
    );
    Ok(())
}
