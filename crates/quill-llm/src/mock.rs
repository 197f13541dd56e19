use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;

use quill_core::{Agent, AgentError, AgentStream};

/// Pre-programmed responses for deterministic testing without API calls.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Yield these accumulated-text updates, then finish.
    Updates(Vec<String>),
    /// Yield these updates, then fail mid-stream.
    FailAfter(Vec<String>, AgentError),
    /// Return an error from the run() call itself.
    Error(AgentError),
    /// Wait a duration, then resolve the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    /// Stream `parts` the way a full-replay collaborator does: every update
    /// carries all text so far.
    pub fn chunks(parts: &[&str]) -> Self {
        Self::Updates(accumulate(parts))
    }

    /// Single update carrying the whole text.
    pub fn text(text: &str) -> Self {
        Self::Updates(vec![text.to_string()])
    }

    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

fn accumulate(parts: &[&str]) -> Vec<String> {
    let mut acc = String::new();
    parts
        .iter()
        .map(|p| {
            acc.push_str(p);
            acc.clone()
        })
        .collect()
}

/// Mock agent that answers runs from a queue and records every prompt.
pub struct MockAgent {
    name: String,
    responses: Mutex<VecDeque<MockResponse>>,
    prompts: Mutex<Vec<String>>,
}

impl MockAgent {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self::named("mock", responses)
    }

    pub fn named(name: &str, responses: Vec<MockResponse>) -> Self {
        Self {
            name: name.to_string(),
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue another response behind the existing ones.
    pub fn push(&self, response: MockResponse) {
        self.responses.lock().push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, prompt: &str) -> Result<AgentStream, AgentError> {
        self.prompts.lock().push(prompt.to_string());
        let next = self.responses.lock().pop_front();
        let Some(mut current) = next else {
            return Err(AgentError::InvalidRequest(format!(
                "MockAgent: no response configured for call {}",
                self.call_count()
            )));
        };

        // Unrolls nested delays iteratively to avoid recursive async.
        loop {
            match current {
                MockResponse::Updates(updates) => {
                    return Ok(Box::pin(stream::iter(
                        updates.into_iter().map(Ok::<String, AgentError>),
                    )));
                }
                MockResponse::FailAfter(updates, error) => {
                    let items = updates
                        .into_iter()
                        .map(Ok::<String, AgentError>)
                        .chain(std::iter::once(Err(error)));
                    return Ok(Box::pin(stream::iter(items)));
                }
                MockResponse::Error(e) => return Err(e),
                MockResponse::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    current = *inner;
                }
            }
        }
    }
}
