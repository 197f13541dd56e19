use std::sync::Arc;

use futures::StreamExt;
use tracing::warn;

use quill_core::{Agent, AgentError};

/// Stand-in summary when the summarization agent answers with nothing.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "Empty response, please retry.";

/// Wraps the summarization agent behind a single call returning the final text.
#[derive(Clone)]
pub struct Summarizer {
    agent: Arc<dyn Agent>,
}

impl Summarizer {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self { agent }
    }

    /// Summarize `text`. An empty answer yields [`EMPTY_RESPONSE_PLACEHOLDER`]
    /// so the generation can still proceed; collaborator failures surface.
    pub async fn summarize(&self, text: &str) -> Result<String, AgentError> {
        match complete(self.agent.as_ref(), text).await {
            Err(AgentError::EmptyResponse) => {
                warn!(agent = self.agent.name(), "summarizer returned empty response");
                Ok(EMPTY_RESPONSE_PLACEHOLDER.to_string())
            }
            other => other,
        }
    }
}

/// Run one turn to completion and return the last full answer.
pub async fn complete(agent: &dyn Agent, prompt: &str) -> Result<String, AgentError> {
    let mut updates = agent.run(prompt).await?;
    let mut last = String::new();
    while let Some(update) = updates.next().await {
        last = update?;
    }
    if last.is_empty() {
        return Err(AgentError::EmptyResponse);
    }
    Ok(last)
}
