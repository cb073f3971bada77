//! Memory module for storing conversation history.
//!
//! Every chain stage keeps its own [`ConversationBufferMemory`]: an unbounded,
//! append-only log of what the stage was asked and what it answered. There is
//! no way to remove messages: a transcript only grows.

pub mod buffer;

pub use buffer::{ConversationBufferMemory, Exchange};
