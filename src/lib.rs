//! PYGPT turns a topic into Python code, a description of that code, and an
//! example of the description, by chaining three prompts through a hosted LLM.
//!
//! # Overview
//! - [`prompt`]: the three fixed `{variable}` templates
//! - [`chat`], [`providers`], [`backends`], [`builder`]: talking to Groq (or
//!   any OpenAI-compatible endpoint)
//! - [`chain`]: sequential composition of the stages, with fail-fast semantics
//! - [`memory`]: the append-only per-stage transcripts
//! - `api`: the web page and JSON endpoints (feature `api`)
//!
//! ```no_run
//! use std::sync::Arc;
//! use pygpt::{builder::{LLMBackend, LLMBuilder}, chain::CodeGenChain};
//!
//! # async fn run() -> Result<(), pygpt::error::LLMError> {
//! let llm = LLMBuilder::new()
//!     .backend(LLMBackend::Groq)
//!     .api_key(std::env::var("GROQ_API_KEY").unwrap_or_default())
//!     .temperature(0.8)
//!     .build()?;
//! let mut chain = CodeGenChain::new(Arc::from(llm))?;
//! let result = chain.generate("bubble sort").await?;
//! println!("{}\n{}\n{}", result.code, result.description, result.example);
//! # Ok(())
//! # }
//! ```

// Re-export for convenience
pub use async_trait::async_trait;

/// Backend configurations for supported providers
pub mod backends;

/// Builder pattern for configuring and instantiating LLM providers
pub mod builder;

/// Sequential prompt chains, including the code generation pipeline
pub mod chain;

/// Chat-based interactions with language models
pub mod chat;

/// Configuration from environment and `.env`
pub mod config;

/// Error types and handling
pub mod error;

/// Conversation memory backing the per-stage transcripts
pub mod memory;

/// Prompt templates
pub mod prompt;

/// Shared OpenAI-compatible HTTP client
pub mod providers;

#[cfg(feature = "api")]
pub mod api;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
/// This is a no-op if the feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
