//! The topic → code → description → example pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{LLMChain, SequentialChain};
use crate::{
    chat::ChatProvider,
    error::LLMError,
    memory::{ConversationBufferMemory, Exchange},
    prompt::{PromptTemplate, CODE_TEMPLATE, DESCRIPTION_TEMPLATE, EXAMPLE_TEMPLATE},
};

pub const NO_CODE: &str = "No code generated.";
pub const NO_DESCRIPTION: &str = "No description generated.";
pub const NO_EXAMPLE: &str = "No example generated.";

/// Input variable holding the user's topic.
const TOPIC_KEY: &str = "name";

/// The three pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Code,
    Description,
    Example,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Code, Stage::Description, Stage::Example];

    fn index(self) -> usize {
        match self {
            Stage::Code => 0,
            Stage::Description => 1,
            Stage::Example => 2,
        }
    }

    /// Variable the stage reads.
    pub fn input_key(self) -> &'static str {
        match self {
            Stage::Code => TOPIC_KEY,
            Stage::Description => "code",
            Stage::Example => "description",
        }
    }

    /// Variable the stage writes.
    pub fn output_key(self) -> &'static str {
        match self {
            Stage::Code => "code",
            Stage::Description => "description",
            Stage::Example => "example",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Stage::Code => CODE_TEMPLATE,
            Stage::Description => DESCRIPTION_TEMPLATE,
            Stage::Example => EXAMPLE_TEMPLATE,
        }
    }

    fn memory_key(self) -> &'static str {
        match self {
            Stage::Code | Stage::Description => "chat_history",
            Stage::Example => "description_history",
        }
    }

    /// Text shown instead of an empty answer.
    pub fn placeholder(self) -> &'static str {
        match self {
            Stage::Code => NO_CODE,
            Stage::Description => NO_DESCRIPTION,
            Stage::Example => NO_EXAMPLE,
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub topic: String,
    pub code: String,
    pub description: String,
    pub example: String,
}

impl GenerationResult {
    fn from_outputs(topic: &str, outputs: &HashMap<String, String>) -> Self {
        let pick = |stage: Stage| {
            outputs
                .get(stage.output_key())
                .filter(|text| !text.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| stage.placeholder().to_string())
        };
        Self {
            topic: topic.to_string(),
            code: pick(Stage::Code),
            description: pick(Stage::Description),
            example: pick(Stage::Example),
        }
    }

    pub fn get(&self, stage: Stage) -> &str {
        match stage {
            Stage::Code => &self.code,
            Stage::Description => &self.description,
            Stage::Example => &self.example,
        }
    }
}

/// Per-stage transcripts of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcripts {
    pub code: Vec<Exchange>,
    pub description: Vec<Exchange>,
    pub example: Vec<Exchange>,
}

impl Transcripts {
    pub fn get(&self, stage: Stage) -> &[Exchange] {
        match stage {
            Stage::Code => &self.code,
            Stage::Description => &self.description,
            Stage::Example => &self.example,
        }
    }
}

/// Generates code for a topic, describes it, then gives an example of the
/// description. Each stage keeps its own transcript across runs.
///
/// Stage inputs are the previous stage's raw answers: placeholders only ever
/// appear in the returned [`GenerationResult`].
pub struct CodeGenChain {
    chain: SequentialChain,
}

impl CodeGenChain {
    pub fn new(llm: Arc<dyn ChatProvider>) -> Result<Self, LLMError> {
        let chains = Stage::ALL
            .iter()
            .map(|&stage| -> Result<LLMChain, LLMError> {
                let prompt = PromptTemplate::new(stage.template(), &[stage.input_key()])?;
                Ok(LLMChain::new(prompt, stage.output_key()).with_memory(
                    ConversationBufferMemory::new(stage.input_key(), stage.memory_key()),
                ))
            })
            .collect::<Result<Vec<_>, LLMError>>()?;

        let chain = SequentialChain::new(
            llm,
            chains,
            &[TOPIC_KEY],
            &[
                Stage::Code.output_key(),
                Stage::Description.output_key(),
                Stage::Example.output_key(),
            ],
        )?;

        Ok(Self { chain })
    }

    /// Runs the three stages for `topic`.
    ///
    /// The topic is used exactly as given; only an empty one is rejected,
    /// before any model call.
    pub async fn generate(&mut self, topic: &str) -> Result<GenerationResult, LLMError> {
        if topic.is_empty() {
            return Err(LLMError::InvalidRequest("Topic must not be empty".to_string()));
        }

        let inputs = HashMap::from([(TOPIC_KEY.to_string(), topic.to_string())]);
        let outputs = self.chain.run(inputs).await?;
        log::info!("Generated code, description and example for '{topic}'");

        Ok(GenerationResult::from_outputs(topic, &outputs))
    }

    pub fn memory(&self, stage: Stage) -> Option<&ConversationBufferMemory> {
        self.chain
            .chains()
            .get(stage.index())
            .and_then(LLMChain::memory)
    }

    /// Transcript of one stage as (input, output) pairs.
    pub fn transcript(&self, stage: Stage) -> Vec<Exchange> {
        self.memory(stage)
            .map(ConversationBufferMemory::exchanges)
            .unwrap_or_default()
    }

    pub fn transcripts(&self) -> Transcripts {
        Transcripts {
            code: self.transcript(Stage::Code),
            description: self.transcript(Stage::Description),
            example: self.transcript(Stage::Example),
        }
    }

    /// Transcript of one stage rendered as `Human:`/`AI:` lines.
    pub fn buffer(&self, stage: Stage) -> String {
        self.memory(stage)
            .map(ConversationBufferMemory::buffer)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatMessage, ChatResponse, TextResponse};
    use async_trait::async_trait;

    struct Canned(&'static [&'static str]);

    #[async_trait]
    impl ChatProvider for Canned {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
            let prompt = &messages[0].content;
            let answer = if prompt.starts_with("Write") {
                self.0[0]
            } else if prompt.starts_with("Describe") {
                self.0[1]
            } else {
                self.0[2]
            };
            Ok(Box::new(TextResponse::new(answer)))
        }
    }

    #[tokio::test]
    async fn empty_answers_become_placeholders() {
        let mut chain = CodeGenChain::new(Arc::new(Canned(&["", "  \n", ""]))).unwrap();
        let result = chain.generate("bubble sort").await.unwrap();

        assert_eq!(result.code, "No code generated.");
        assert_eq!(result.description, "No description generated.");
        assert_eq!(result.example, "No example generated.");
    }

    #[tokio::test]
    async fn placeholders_are_not_fed_forward() {
        let mut chain = CodeGenChain::new(Arc::new(Canned(&["", "desc", "ex"]))).unwrap();
        chain.generate("bubble sort").await.unwrap();

        let description = chain.transcript(Stage::Description);
        assert_eq!(description[0].input, "");
        assert_eq!(description[0].output, "desc");
    }

    #[tokio::test]
    async fn empty_topic_is_rejected() {
        let mut chain = CodeGenChain::new(Arc::new(Canned(&["a", "b", "c"]))).unwrap();
        let err = chain.generate("").await.unwrap_err();
        assert!(matches!(err, LLMError::InvalidRequest(_)));
        assert!(chain.transcripts().code.is_empty());
    }

    #[tokio::test]
    async fn whitespace_topic_still_runs() {
        let mut chain = CodeGenChain::new(Arc::new(Canned(&["a", "b", "c"]))).unwrap();
        let result = chain.generate("   ").await.unwrap();
        assert_eq!(result.topic, "   ");
        assert_eq!(result.code, "a");
        assert_eq!(chain.transcript(Stage::Code)[0].input, "   ");
    }

    #[tokio::test]
    async fn buffer_renders_the_code_history() {
        let mut chain = CodeGenChain::new(Arc::new(Canned(&["print(1)", "b", "c"]))).unwrap();
        chain.generate("printing").await.unwrap();
        assert_eq!(chain.buffer(Stage::Code), "Human: printing\nAI: print(1)");
    }
}
