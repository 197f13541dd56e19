use serde::Deserialize;

use quill_core::AgentError;

/// One `data:` record from an OpenAI-compatible chat completion stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SseFrame {
    Data(String),
    Done,
}

/// Parse a block of SSE text into data frames.
///
/// Comment lines (`:`), `event:`/`id:` fields and blank lines are skipped.
/// Multiple `data:` lines inside one event are joined with `\n`.
pub fn parse_sse_lines(raw: &str) -> Vec<SseFrame> {
    let mut frames = Vec::new();
    let mut current: Option<String> = None;

    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            if let Some(data) = current.take() {
                frames.push(to_frame(data));
            }
            continue;
        }
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.strip_prefix(' ').unwrap_or(data);
        match current.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(data);
            }
            None => current = Some(data.to_string()),
        }
    }

    // Handle trailing event without blank line
    if let Some(data) = current {
        frames.push(to_frame(data));
    }

    frames
}

fn to_frame(data: String) -> SseFrame {
    if data.trim() == "[DONE]" {
        SseFrame::Done
    } else {
        SseFrame::Data(data)
    }
}

/// Pull the content increment out of one chunk payload.
///
/// `Ok(None)` for chunks without text (role announcements, usage, finish).
pub fn extract_delta(data: &str) -> Result<Option<String>, AgentError> {
    let chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|e| AgentError::StreamInterrupted(format!("malformed chunk: {e}")))?;

    if let Some(err) = chunk.error {
        return Err(AgentError::StreamInterrupted(err.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content))
}

// --- Deserialization types for chat completion chunks ---

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}
