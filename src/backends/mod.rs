#[cfg(feature = "groq")]
pub mod groq;

#[cfg(feature = "openai")]
pub mod openai;
