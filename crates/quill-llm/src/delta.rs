use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use futures::Stream;
use pin_project_lite::pin_project;

use quill_core::{Agent, AgentError, AgentStream};

/// Forward delta between the previously seen full text and a new one.
///
/// A prefix-compatible update yields only its new suffix. Anything else is a
/// reset and yields the whole new text. `previous` is replaced either way.
/// Returns `None` when nothing new arrived.
pub fn extract_delta(previous: &mut String, full: String) -> Option<String> {
    let delta = match full.strip_prefix(previous.as_str()) {
        Some(suffix) => suffix.to_string(),
        None => full.clone(),
    };
    *previous = full;
    (!delta.is_empty()).then_some(delta)
}

pin_project! {
    /// Converts a stream of accumulated answers into a stream of increments.
    pub struct DeltaStream<S> {
        #[pin]
        inner: S,
        accumulated: String,
    }
}

impl<S> DeltaStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            accumulated: String::new(),
        }
    }
}

impl<S> Stream for DeltaStream<S>
where
    S: Stream<Item = Result<String, AgentError>>,
{
    type Item = Result<String, AgentError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(full)) => {
                    if let Some(delta) = extract_delta(this.accumulated, full) {
                        return Poll::Ready(Some(Ok(delta)));
                    }
                }
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => return Poll::Ready(None),
            }
        }
    }
}

/// Wraps the writing agent: one call per generation, increments out.
#[derive(Clone)]
pub struct WritingAdapter {
    agent: Arc<dyn Agent>,
}

impl WritingAdapter {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self { agent }
    }

    pub async fn generate_stream(&self, prompt: &str) -> Result<DeltaStream<AgentStream>, AgentError> {
        let updates = self.agent.run(prompt).await?;
        Ok(DeltaStream::new(updates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAgent, MockResponse};
    use futures::StreamExt;

    #[test]
    fn prefix_update_yields_suffix() {
        let mut prev = "Once".to_string();
        assert_eq!(extract_delta(&mut prev, "Once upon".into()), Some(" upon".into()));
        assert_eq!(prev, "Once upon");
    }

    #[test]
    fn identical_update_yields_nothing() {
        let mut prev = "same".to_string();
        assert_eq!(extract_delta(&mut prev, "same".into()), None);
    }

    #[test]
    fn non_prefix_update_is_a_reset() {
        let mut prev = "The cat".to_string();
        assert_eq!(extract_delta(&mut prev, "A dog".into()), Some("A dog".into()));
        assert_eq!(prev, "A dog");
    }

    #[test]
    fn multibyte_suffix() {
        let mut prev = "月光".to_string();
        assert_eq!(extract_delta(&mut prev, "月光洒落".into()), Some("洒落".into()));
    }

    #[tokio::test]
    async fn concatenated_deltas_equal_final_text() {
        let updates = vec!["It".to_string(), "It was".into(), "It was".into(), "It was night.".into()];
        let stream = DeltaStream::new(futures::stream::iter(updates.into_iter().map(Ok::<String, AgentError>)));
        let chunks: Vec<String> = stream.map(Result::unwrap).collect().await;
        assert_eq!(chunks, vec!["It", " was", " night."]);
        assert_eq!(chunks.concat(), "It was night.");
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let items: Vec<Result<String, AgentError>> =
            vec![Ok("a".into()), Err(AgentError::RateLimited), Ok("ab".into())];
        let stream = DeltaStream::new(futures::stream::iter(items));
        let out: Vec<_> = stream.collect().await;
        assert_eq!(out.len(), 3);
        assert!(out[1].is_err());
        assert_eq!(out[2].as_ref().unwrap(), "b");
    }

    #[tokio::test]
    async fn adapter_streams_from_agent() {
        let agent = Arc::new(MockAgent::new(vec![MockResponse::chunks(&["Rain ", "fell."])]));
        let adapter = WritingAdapter::new(agent.clone());
        let chunks: Vec<String> = adapter
            .generate_stream("prompt")
            .await
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(chunks, vec!["Rain ", "fell."]);
        assert_eq!(agent.prompts(), vec!["prompt".to_string()]);
    }

    #[tokio::test]
    async fn adapter_surfaces_run_error() {
        let agent = Arc::new(MockAgent::new(vec![MockResponse::Error(
            AgentError::AuthenticationFailed("bad key".into()),
        )]));
        let adapter = WritingAdapter::new(agent);
        assert!(matches!(
            adapter.generate_stream("p").await,
            Err(AgentError::AuthenticationFailed(_))
        ));
    }
}
