//! Server-side rendering of the single page.

use minijinja::{context, Environment};
use serde::Serialize;

use crate::{
    chain::{GenerationResult, Stage, Transcripts},
    error::LLMError,
    memory::Exchange,
};

/// The `.html` suffix turns on minijinja's HTML auto-escaping.
const PAGE_TEMPLATE: &str = "page.html";

/// What one render of the page shows.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    /// Topic to prefill the input box with
    pub topic: Option<&'a str>,
    pub result: Option<&'a GenerationResult>,
    pub error: Option<String>,
    pub transcripts: Option<&'a Transcripts>,
}

/// One collapsible history panel.
#[derive(Debug, Serialize)]
struct HistoryPanel {
    id: &'static str,
    title: &'static str,
    history: String,
}

fn history_title(stage: Stage) -> &'static str {
    match stage {
        Stage::Code => "Code Generation History",
        Stage::Description => "Description History",
        Stage::Example => "Example History",
    }
}

/// Renders a transcript the way the conversation buffer prints it.
fn render_history(exchanges: &[Exchange]) -> String {
    exchanges
        .iter()
        .map(|e| format!("Human: {}\nAI: {}", e.input, e.output))
        .collect::<Vec<_>>()
        .join("\n")
}

fn panels(transcripts: &Transcripts) -> Vec<HistoryPanel> {
    Stage::ALL
        .iter()
        .map(|&stage| HistoryPanel {
            id: stage.output_key(),
            title: history_title(stage),
            history: render_history(transcripts.get(stage)),
        })
        .collect()
}

/// Holds the compiled page template.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, LLMError> {
        let mut env = Environment::new();
        env.add_template(PAGE_TEMPLATE, include_str!("page.html"))?;
        Ok(Self { env })
    }

    /// Renders the whole page.
    pub fn render(&self, view: &PageView<'_>) -> Result<String, LLMError> {
        let template = self.env.get_template(PAGE_TEMPLATE)?;
        let html = template.render(context! {
            topic => view.topic.unwrap_or_default(),
            result => view.result,
            error => view.error.as_deref(),
            panels => view.transcripts.map(panels).unwrap_or_default(),
        })?;
        Ok(html)
    }
}
