use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tracing::info;

use quill_core::SessionId;
use quill_engine::{GenerationOrchestrator, Operation, Overrides};

use crate::encoder;
use crate::error::{ApiError, UploadError};
use crate::upload;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<GenerationOrchestrator>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub session_id: SessionId,
    pub text_length: usize,
    pub used_summary: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerationQuery {
    pub word_limit: Option<String>,
    pub requirements: Option<String>,
}

impl From<GenerationQuery> for Overrides {
    fn from(query: GenerationQuery) -> Self {
        Self {
            word_limit: query.word_limit,
            requirements: query.requirements,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub active_sessions: Vec<SessionId>,
    pub session_count: usize,
}

pub async fn process(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let multipart = multipart.map_err(|rejection| UploadError::Multipart(rejection.body_text()))?;
    let submission = upload::read_submission(multipart).await?;
    let created = state
        .orchestrator
        .store()
        .create(submission.text, submission.requirements);
    let used_summary = state.orchestrator.classify(created.text_length).uses_summary();

    Ok(Json(SubmitResponse {
        success: true,
        session_id: created.id,
        text_length: created.text_length,
        used_summary,
    }))
}

fn open_stream(
    state: &AppState,
    session_id: &SessionId,
    op: Operation,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let events = state.orchestrator.start(session_id, op)?;
    Ok(Sse::new(encoder::sse_events(events)).keep_alive(KeepAlive::default()))
}

pub async fn stream_initial(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    open_stream(&state, &session_id, Operation::Initial)
}

pub async fn continue_story(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Query(query): Query<GenerationQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    open_stream(&state, &session_id, Operation::Continue(query.into()))
}

pub async fn restart_story(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Query(query): Query<GenerationQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    open_stream(&state, &session_id, Operation::Restart(query.into()))
}

pub async fn clear(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Json<ClearResponse> {
    let removed = state.orchestrator.store().remove(&session_id);
    if !removed {
        info!(session_id = %session_id, "clear requested for unknown session");
    }
    Json(ClearResponse {
        success: removed,
        message: if removed {
            "Session cleared".into()
        } else {
            "Session not found".into()
        },
    })
}

pub async fn debug_sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    let active_sessions = state.orchestrator.store().ids();
    Json(SessionsResponse {
        session_count: active_sessions.len(),
        active_sessions,
    })
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "sessions": state.orchestrator.store().len(),
    }))
}
