use std::time::Duration;

/// Failures reported by a text-generation collaborator.
///
/// Nothing in the workflow retries these; they surface to the client as a
/// single error event and a human re-issues the request.
#[derive(Clone, Debug, thiserror::Error)]
pub enum AgentError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("rate limited")]
    RateLimited,
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),
    #[error("empty response")]
    EmptyResponse,
    #[error("timeout after {0:?}")]
    Timeout(Duration),
}

impl AgentError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::RateLimited => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::NetworkError(_) => "network_error",
            Self::StreamInterrupted(_) => "stream_interrupted",
            Self::EmptyResponse => "empty_response",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Classify an HTTP status code from a model server.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(body),
            400 | 404 | 422 => Self::InvalidRequest(body),
            429 => Self::RateLimited,
            _ => Self::ServerError { status, body },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_mapping() {
        assert!(matches!(
            AgentError::from_status(401, "nope".into()),
            AgentError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            AgentError::from_status(400, "bad".into()),
            AgentError::InvalidRequest(_)
        ));
        assert!(matches!(
            AgentError::from_status(429, String::new()),
            AgentError::RateLimited
        ));
        assert!(matches!(
            AgentError::from_status(502, "gateway".into()),
            AgentError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(AgentError::EmptyResponse.error_kind(), "empty_response");
        assert_eq!(
            AgentError::StreamInterrupted("eof".into()).error_kind(),
            "stream_interrupted"
        );
    }

    #[test]
    fn display_includes_detail() {
        let err = AgentError::ServerError {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "server error 500: boom");
    }
}
