use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use quill_core::SessionId;

use crate::session::Session;

/// Exclusive handle on one session. Holding the lock is holding the session.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

struct StoredSession {
    handle: SessionHandle,
    last_access: Mutex<Instant>,
}

impl StoredSession {
    fn touch(&self) {
        *self.last_access.lock() = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_access.lock())
    }
}

/// Result of creating a session.
#[derive(Clone, Debug)]
pub struct CreatedSession {
    pub id: SessionId,
    pub text_length: usize,
}

/// In-memory registry of sessions, keyed by id only.
///
/// Owned by whoever constructs it and shared by `Arc`; nothing is persisted.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, StoredSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, original_text: String, requirements: String) -> CreatedSession {
        let session = Session::new(original_text, requirements);
        let created = CreatedSession {
            id: session.id().clone(),
            text_length: session.text_length(),
        };

        self.sessions.insert(
            created.id.clone(),
            StoredSession {
                handle: Arc::new(tokio::sync::Mutex::new(session)),
                last_access: Mutex::new(Instant::now()),
            },
        );
        info!(session_id = %created.id, text_chars = created.text_length, "session created");
        created
    }

    /// Look up a session and mark it as accessed.
    pub fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| {
            entry.touch();
            Arc::clone(&entry.handle)
        })
    }

    pub fn touch(&self, id: &SessionId) {
        if let Some(entry) = self.sessions.get(id) {
            entry.touch();
        }
    }

    /// Delete a session. Returns `false` if it was not present.
    pub fn remove(&self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!(session_id = %id, "session removed");
        }
        removed
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove sessions idle for longer than `ttl`. Sessions with an
    /// operation in flight are kept regardless of age.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|id, entry| {
            if entry.idle_for(now) <= ttl {
                return true;
            }
            let busy = entry.handle.try_lock().is_err();
            if !busy {
                debug!(session_id = %id, "evicting idle session");
            }
            busy
        });
        before.saturating_sub(self.sessions.len())
    }
}

/// Periodically evict idle sessions until `cancel` fires.
pub fn start_eviction_task(
    store: Arc<SessionStore>,
    ttl: Duration,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = store.evict_idle(ttl);
                    if removed > 0 {
                        info!(removed = removed, remaining = store.len(), "idle session eviction");
                    }
                }
            }
        }
    })
}
