//! Unbounded conversation buffer.

use serde::Serialize;

use crate::chat::{ChatMessage, ChatRole};

/// One prompt/answer pair recorded by a chain stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub input: String,
    pub output: String,
}

/// Append-only memory that keeps every message of a conversation.
///
/// Unlike a sliding window nothing is ever evicted, so the buffer grows for as
/// long as the owning session lives.
///
/// ```
/// use pygpt::memory::ConversationBufferMemory;
///
/// let mut memory = ConversationBufferMemory::new("name", "chat_history");
/// memory.save_context("bubble sort", "def bubble_sort(xs): ...");
///
/// assert_eq!(memory.exchanges().len(), 1);
/// assert_eq!(memory.buffer(), "Human: bubble sort\nAI: def bubble_sort(xs): ...");
/// ```
#[derive(Debug, Clone)]
pub struct ConversationBufferMemory {
    input_key: String,
    memory_key: String,
    human_prefix: String,
    ai_prefix: String,
    messages: Vec<ChatMessage>,
}

impl ConversationBufferMemory {
    /// Create an empty buffer.
    ///
    /// # Arguments
    ///
    /// * `input_key` - Chain variable whose value is recorded as the human turn
    /// * `memory_key` - Name under which the rendered buffer is exposed
    pub fn new(input_key: impl Into<String>, memory_key: impl Into<String>) -> Self {
        Self {
            input_key: input_key.into(),
            memory_key: memory_key.into(),
            human_prefix: "Human".to_string(),
            ai_prefix: "AI".to_string(),
            messages: Vec::new(),
        }
    }

    /// Override the prefixes used by [`buffer`](Self::buffer).
    pub fn with_prefixes(mut self, human: impl Into<String>, ai: impl Into<String>) -> Self {
        self.human_prefix = human.into();
        self.ai_prefix = ai.into();
        self
    }

    pub fn input_key(&self) -> &str {
        &self.input_key
    }

    pub fn memory_key(&self) -> &str {
        &self.memory_key
    }

    /// Records one input/output pair.
    pub fn save_context(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.messages
            .push(ChatMessage::user().content(input).build());
        self.messages
            .push(ChatMessage::assistant().content(output).build());
    }

    /// All stored messages in chronological order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Stored messages paired up as (input, output) exchanges.
    ///
    /// A trailing user message without an answer is not reported.
    pub fn exchanges(&self) -> Vec<Exchange> {
        let mut exchanges = Vec::with_capacity(self.messages.len() / 2);
        let mut pending: Option<&str> = None;
        for msg in &self.messages {
            match msg.role {
                ChatRole::User => pending = Some(&msg.content),
                ChatRole::Assistant => exchanges.push(Exchange {
                    input: pending.take().unwrap_or_default().to_string(),
                    output: msg.content.clone(),
                }),
            }
        }
        exchanges
    }

    /// Renders the transcript as `Human: ...` / `AI: ...` lines.
    pub fn buffer(&self) -> String {
        self.messages
            .iter()
            .map(|m| {
                let prefix = match m.role {
                    ChatRole::User => &self.human_prefix,
                    ChatRole::Assistant => &self.ai_prefix,
                };
                format!("{prefix}: {}", m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchanges_follow_insertion_order() {
        let mut memory = ConversationBufferMemory::new("code", "chat_history");
        memory.save_context("a", "1");
        memory.save_context("b", "2");

        let exchanges = memory.exchanges();
        assert_eq!(exchanges.len(), 2);
        assert_eq!(exchanges[0], Exchange { input: "a".into(), output: "1".into() });
        assert_eq!(exchanges[1].input, "b");
        assert_eq!(memory.messages().len(), 4);
    }

    #[test]
    fn buffer_uses_custom_prefixes() {
        let mut memory =
            ConversationBufferMemory::new("name", "chat_history").with_prefixes("You", "Bot");
        memory.save_context("hi", "hello");
        assert_eq!(memory.buffer(), "You: hi\nBot: hello");
    }

    #[test]
    fn empty_buffer_renders_nothing() {
        let memory = ConversationBufferMemory::new("description", "description_history");
        assert!(memory.buffer().is_empty());
        assert!(memory.exchanges().is_empty());
        assert!(memory.messages().is_empty());
    }
}
