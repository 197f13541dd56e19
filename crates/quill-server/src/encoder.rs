//! Wire encoding of generation events as SSE `data:` frames carrying
//! `{"type": ..., "content": ...}`.

use std::convert::Infallible;

use axum::response::sse::Event;
use futures::{Stream, StreamExt};

use quill_core::GenerationEvent;
use quill_engine::EventStream;

pub fn encode(event: &GenerationEvent) -> String {
    serde_json::to_string(event).unwrap_or_default()
}

pub fn to_sse_event(event: &GenerationEvent) -> Event {
    Event::default().data(encode(event))
}

pub fn sse_events(events: EventStream) -> impl Stream<Item = Result<Event, Infallible>> {
    events.map(|event| {
        if event.is_terminal() {
            tracing::debug!(event = event.event_type(), "generation stream finished");
        }
        Ok(to_sse_event(&event))
    })
}

/// Parse a raw SSE body back into events. Comments, keep-alives and frames
/// that are not event records are skipped.
pub fn decode_frames(body: &str) -> Vec<GenerationEvent> {
    body.split("\n\n")
        .filter_map(|frame| {
            let data: Vec<&str> = frame
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|d| d.strip_prefix(' ').unwrap_or(d))
                .collect();
            if data.is_empty() {
                return None;
            }
            serde_json::from_str(&data.join("\n")).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_type_and_content() {
        assert_eq!(
            encode(&GenerationEvent::Content("line\none".into())),
            r#"{"type":"content","content":"line\none"}"#
        );
        assert_eq!(
            encode(&GenerationEvent::Complete("done".into())),
            r#"{"type":"complete","content":"done"}"#
        );
    }

    #[test]
    fn decodes_frames_and_skips_comments() {
        let body = "data: {\"type\":\"status\",\"content\":\"go\"}\n\n\
                    :\n\n\
                    data: {\"type\":\"error\",\"content\":\"bad\"}\n\n";
        assert_eq!(
            decode_frames(body),
            vec![
                GenerationEvent::Status("go".into()),
                GenerationEvent::Error("bad".into()),
            ]
        );
    }

    #[test]
    fn empty_body_has_no_events() {
        assert!(decode_frames("").is_empty());
    }
}
