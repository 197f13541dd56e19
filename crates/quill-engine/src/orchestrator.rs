//! Generation orchestrator: runs one operation against one session and
//! streams its events.
//!
//! Each operation holds the session's lock for its whole lifetime, so a
//! second request on the same session is rejected instead of racing on the
//! segment history. The operation runs in a spawned task that feeds a bounded
//! channel. The returned stream is the receiving end. Once the client drops
//! it, the run stops at its next await, releases the session, and commits
//! nothing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, OwnedMutexGuard};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

use quill_core::{GenerationEvent, RestartRollback, SessionId};
use quill_llm::{Summarizer, WritingAdapter};
use quill_store::{Session, SessionStore};

use crate::classifier::{classify, Classification};
use crate::error::EngineError;
use crate::operation::{Operation, OperationKind};
use crate::prompt::{self, Trailer};

/// Emitted as the final content event of every successful generation. Never
/// part of the stored segment.
pub const SEGMENT_SEPARATOR: &str =
    "\n--------------------------------------------------\n";

pub type EventStream = ReceiverStream<GenerationEvent>;

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Sources longer than this many characters are summarized first.
    pub threshold: usize,
    /// Pause after each content chunk. Zero disables it.
    pub chunk_delay: Duration,
    pub channel_capacity: usize,
    pub restart_rollback: RestartRollback,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            threshold: 100_000,
            chunk_delay: Duration::from_millis(10),
            channel_capacity: 32,
            restart_rollback: RestartRollback::Discard,
        }
    }
}

pub struct GenerationOrchestrator {
    store: Arc<SessionStore>,
    summarizer: Summarizer,
    writer: WritingAdapter,
    config: OrchestratorConfig,
}

impl GenerationOrchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        summarizer: Summarizer,
        writer: WritingAdapter,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            summarizer,
            writer,
            config,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn classify(&self, text_length: usize) -> Classification {
        classify(text_length, self.config.threshold)
    }

    /// Begin `op` on the session. Fails before any event is produced when
    /// the session is unknown or already has an operation in flight.
    pub fn start(&self, session_id: &SessionId, op: Operation) -> Result<EventStream, EngineError> {
        let handle = self
            .store
            .get(session_id)
            .ok_or_else(|| EngineError::SessionNotFound(session_id.clone()))?;
        let session = handle
            .try_lock_owned()
            .map_err(|_| EngineError::SessionBusy(session_id.clone()))?;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let kind = op.kind();
        let watcher_tx = tx.clone();
        let run = Run {
            store: Arc::clone(&self.store),
            summarizer: self.summarizer.clone(),
            writer: self.writer.clone(),
            config: self.config.clone(),
            events: EventSink { tx },
        };
        info!(session_id = %session_id, operation = %kind, "generation started");
        let task = tokio::spawn(run.execute(session, op));

        // A run that dies without a terminal event still owes the client one.
        let watched_id = session_id.clone();
        tokio::spawn(async move {
            if let Err(join_err) = task.await {
                let err = EngineError::Internal(format!("generation task failed: {join_err}"));
                error!(session_id = %watched_id, operation = %kind, error = %err, "generation aborted");
                let _ = watcher_tx
                    .send(GenerationEvent::Error(kind.error_message(&err.to_string())))
                    .await;
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

struct EventSink {
    tx: mpsc::Sender<GenerationEvent>,
}

impl EventSink {
    async fn send(&self, event: GenerationEvent) -> Result<(), EngineError> {
        self.tx.send(event).await.map_err(|_| EngineError::Disconnected)
    }

    async fn status(&self, message: &str) -> Result<(), EngineError> {
        self.send(GenerationEvent::Status(message.to_string())).await
    }

    /// Drive `fut` unless the client goes away first.
    async fn unless_closed<F: Future>(&self, fut: F) -> Result<F::Output, EngineError> {
        tokio::select! {
            biased;
            _ = self.tx.closed() => Err(EngineError::Disconnected),
            out = fut => Ok(out),
        }
    }
}

struct Run {
    store: Arc<SessionStore>,
    summarizer: Summarizer,
    writer: WritingAdapter,
    config: OrchestratorConfig,
    events: EventSink,
}

impl Run {
    async fn execute(self, mut session: OwnedMutexGuard<Session>, op: Operation) {
        let kind = op.kind();
        let session_id = session.id().clone();

        if let Some(overrides) = op.overrides() {
            session.apply_overrides(overrides.word_limit.clone(), overrides.requirements.clone());
        }
        let popped = match kind {
            OperationKind::Restart => session.pop_last_segment(),
            _ => None,
        };

        match self.generate(&session, kind).await {
            Ok(segment) => {
                session.push_segment(segment);
                self.store.touch(&session_id);
                info!(
                    session_id = %session_id,
                    operation = %kind,
                    segments = session.segments().len(),
                    "segment committed"
                );
                if self
                    .events
                    .send(GenerationEvent::Complete(kind.complete_message().to_string()))
                    .await
                    .is_err()
                {
                    debug!(session_id = %session_id, "client gone before completion event");
                }
            }
            Err(err) => {
                if let Some(segment) = popped {
                    self.roll_back(&mut session, segment);
                }
                match err {
                    EngineError::Disconnected => {
                        debug!(session_id = %session_id, operation = %kind, "client disconnected, segment discarded");
                    }
                    err => {
                        warn!(
                            session_id = %session_id,
                            operation = %kind,
                            kind = err.error_kind(),
                            error = %err,
                            "generation failed"
                        );
                        let detail = match &err {
                            EngineError::Agent(inner) => inner.to_string(),
                            other => other.to_string(),
                        };
                        let _ = self
                            .events
                            .send(GenerationEvent::Error(kind.error_message(&detail)))
                            .await;
                    }
                }
            }
        }
    }

    fn roll_back(&self, session: &mut Session, popped: String) {
        match self.config.restart_rollback {
            RestartRollback::Restore => {
                debug!(session_id = %session.id(), "restoring segment popped by failed restart");
                session.push_segment(popped);
            }
            RestartRollback::Discard => {
                debug!(session_id = %session.id(), "discarding segment popped by failed restart");
            }
        }
    }

    /// Assemble the prompt, stream the writing agent, and return the full
    /// segment once the separator has been delivered.
    async fn generate(&self, session: &Session, kind: OperationKind) -> Result<String, EngineError> {
        let classification = classify(session.text_length(), self.config.threshold);
        info!(
            session_id = %session.id(),
            text_length = session.text_length(),
            threshold = self.config.threshold,
            classification = ?classification,
            "classified source"
        );

        let prompt = self.assemble(session, kind, classification).await?;

        let mut chunks = self
            .events
            .unless_closed(self.writer.generate_stream(&prompt))
            .await??;
        let mut segment = String::new();
        while let Some(chunk) = self.events.unless_closed(chunks.next()).await? {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            segment.push_str(&chunk);
            self.events.send(GenerationEvent::Content(chunk)).await?;
            if !self.config.chunk_delay.is_zero() {
                self.events
                    .unless_closed(tokio::time::sleep(self.config.chunk_delay))
                    .await?;
            }
        }

        self.events
            .send(GenerationEvent::Content(SEGMENT_SEPARATOR.to_string()))
            .await?;
        Ok(segment)
    }

    async fn assemble(
        &self,
        session: &Session,
        kind: OperationKind,
        classification: Classification,
    ) -> Result<String, EngineError> {
        let original = session.original_text();
        let history = session.history();
        let trailer = Trailer {
            requirements: session.additional_requirements(),
            word_limit: session.word_limit(),
        };

        let prompt = match (kind, classification) {
            (OperationKind::Continue, _) => {
                self.events.status(kind.generating_status()).await?;
                prompt::continuation(original, &history, trailer)
            }
            (_, Classification::SummarizeFirst) => {
                self.events.status(kind.summarizing_status()).await?;
                let source = match kind {
                    OperationKind::Restart => prompt::restart_summary_source(original, &history),
                    _ => original.to_string(),
                };
                let summary = self
                    .events
                    .unless_closed(self.summarizer.summarize(&source))
                    .await??;
                self.events.status(kind.summary_done_status()).await?;
                prompt::initial_summarized(&summary, trailer)
            }
            (OperationKind::Restart, Classification::Direct) => {
                self.events.status(kind.generating_status()).await?;
                prompt::restart(original, &history, trailer)
            }
            (OperationKind::Initial, Classification::Direct) => {
                self.events.status(kind.generating_status()).await?;
                prompt::initial_direct(original, trailer)
            }
        };
        Ok(prompt)
    }
}
