//! Prompt chains: single LLM calls composed into a fixed sequence.

mod codegen;

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    chat::{ChatMessage, ChatProvider},
    error::LLMError,
    memory::ConversationBufferMemory,
    prompt::PromptTemplate,
};

pub use codegen::{
    CodeGenChain, GenerationResult, Stage, Transcripts, NO_CODE, NO_DESCRIPTION, NO_EXAMPLE,
};

/// One step: format a prompt, ask the model, name the answer.
#[derive(Debug, Clone)]
pub struct LLMChain {
    prompt: PromptTemplate,
    output_key: String,
    memory: Option<ConversationBufferMemory>,
}

impl LLMChain {
    /// Creates a step whose answer is stored under `output_key`.
    pub fn new(prompt: PromptTemplate, output_key: impl Into<String>) -> Self {
        Self {
            prompt,
            output_key: output_key.into(),
            memory: None,
        }
    }

    /// Attaches a memory recording every successful call.
    pub fn with_memory(mut self, memory: ConversationBufferMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    pub fn memory(&self) -> Option<&ConversationBufferMemory> {
        self.memory.as_ref()
    }

    /// Runs the step against `llm`.
    ///
    /// A response without text counts as an empty answer, not as an error.
    /// The memory is only written once the model has answered.
    pub async fn call(
        &mut self,
        llm: &dyn ChatProvider,
        inputs: &HashMap<String, String>,
    ) -> Result<String, LLMError> {
        let prompt = self.prompt.format(inputs)?;
        log::debug!("Prompt for '{}': {}", self.output_key, prompt);

        let messages = [ChatMessage::user().content(prompt).build()];
        let response = llm.chat(&messages).await?;
        let text = response.text().unwrap_or_default();

        if let Some(memory) = &mut self.memory {
            let input = inputs.get(memory.input_key()).cloned().unwrap_or_default();
            memory.save_context(input, text.clone());
        }

        Ok(text)
    }
}

/// Runs [`LLMChain`]s in order, each one seeing the inputs and every earlier
/// output.
///
/// The first failing step aborts the run; later steps are not executed.
pub struct SequentialChain {
    llm: Arc<dyn ChatProvider>,
    chains: Vec<LLMChain>,
    input_variables: Vec<String>,
    output_variables: Vec<String>,
}

impl SequentialChain {
    /// Builds the chain, checking that every step's variables are produced
    /// by an input or an earlier step, and that every requested output is
    /// produced by some step.
    pub fn new(
        llm: Arc<dyn ChatProvider>,
        chains: Vec<LLMChain>,
        input_variables: &[&str],
        output_variables: &[&str],
    ) -> Result<Self, LLMError> {
        let mut known: Vec<&str> = input_variables.to_vec();
        for chain in &chains {
            if let Some(missing) = chain
                .prompt
                .input_variables()
                .iter()
                .find(|v| !known.contains(&v.as_str()))
            {
                return Err(LLMError::InvalidRequest(format!(
                    "Step '{}' needs '{missing}', which nothing before it provides",
                    chain.output_key
                )));
            }
            known.push(&chain.output_key);
        }
        if let Some(missing) = output_variables.iter().find(|v| !known.contains(v)) {
            return Err(LLMError::InvalidRequest(format!(
                "Output variable '{missing}' is not produced by any step"
            )));
        }

        Ok(Self {
            llm,
            chains,
            input_variables: input_variables.iter().map(|v| v.to_string()).collect(),
            output_variables: output_variables.iter().map(|v| v.to_string()).collect(),
        })
    }

    pub fn chains(&self) -> &[LLMChain] {
        &self.chains
    }

    /// Executes all steps and returns the requested output variables.
    pub async fn run(
        &mut self,
        inputs: HashMap<String, String>,
    ) -> Result<HashMap<String, String>, LLMError> {
        if let Some(missing) = self.input_variables.iter().find(|v| !inputs.contains_key(*v)) {
            return Err(LLMError::InvalidRequest(format!(
                "Missing chain input '{missing}'"
            )));
        }

        let mut values = inputs;
        let total = self.chains.len();
        for (i, chain) in self.chains.iter_mut().enumerate() {
            log::info!(
                "Running step {}/{total} '{}' with {}",
                i + 1,
                chain.output_key,
                self.llm.name()
            );
            let text = chain.call(self.llm.as_ref(), &values).await.map_err(|e| {
                log::warn!("Step '{}' failed: {e}", chain.output_key);
                e
            })?;
            values.insert(chain.output_key.clone(), text);
        }

        Ok(self
            .output_variables
            .iter()
            .filter_map(|k| values.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }
}
