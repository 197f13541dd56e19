use serde::{Deserialize, Serialize};

/// Events pushed to the client during one generation operation.
///
/// Ordering contract within a single stream:
///
/// Status* → Content+ → Complete   |   Status* → Error
///
/// The wire form is `{"type": "<kind>", "content": "<payload>"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum GenerationEvent {
    Status(String),
    Content(String),
    Complete(String),
    Error(String),
}

impl GenerationEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error(_))
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Content(_) => "content",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_type_and_content() {
        let json = serde_json::to_value(GenerationEvent::Content("abc".into())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "content", "content": "abc"}));

        let json = serde_json::to_value(GenerationEvent::Error("bad".into())).unwrap();
        assert_eq!(json["type"], "error");
    }

    #[test]
    fn parses_client_frame() {
        let evt: GenerationEvent =
            serde_json::from_str(r#"{"type":"status","content":"working"}"#).unwrap();
        assert_eq!(evt, GenerationEvent::Status("working".into()));
    }

    #[test]
    fn terminal_classification() {
        assert!(GenerationEvent::Complete("done".into()).is_terminal());
        assert!(GenerationEvent::Error("x".into()).is_terminal());
        assert!(!GenerationEvent::Content("x".into()).is_terminal());
        assert!(!GenerationEvent::Status("x".into()).is_terminal());
    }

    #[test]
    fn event_type_names() {
        assert_eq!(GenerationEvent::Complete("finished".into()).event_type(), "complete");
        assert_eq!(GenerationEvent::Status("s".into()).event_type(), "status");
    }
}
