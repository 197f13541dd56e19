use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::errors::AgentError;

/// Updates from a collaborator run. Each item is the collaborator's full
/// accumulated answer so far, not an increment.
pub type AgentStream = Pin<Box<dyn Stream<Item = Result<String, AgentError>> + Send>>;

/// A text-generation collaborator (summarization or writing agent).
///
/// One call runs one single-turn conversation with `prompt` as the user turn.
/// The returned stream is finite and not restartable.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, prompt: &str) -> Result<AgentStream, AgentError>;
}
