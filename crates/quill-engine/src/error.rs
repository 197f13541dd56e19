use quill_core::{AgentError, SessionId};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("session busy: {0}")]
    SessionBusy(SessionId),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("client disconnected")]
    Disconnected,

    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "session_not_found",
            Self::SessionBusy(_) => "session_busy",
            Self::Agent(e) => e.error_kind(),
            Self::Disconnected => "disconnected",
            Self::Internal(_) => "internal",
        }
    }
}
