//! Overlay API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::error;

use hlsrelay_core::{Overlay, OverlayError};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct OverlayErrorResponse {
    pub error: String,
}

type ErrorReply = (StatusCode, Json<OverlayErrorResponse>);

fn error_reply(e: OverlayError) -> ErrorReply {
    let (status, error) = match e {
        OverlayError::Validation(message) => (StatusCode::BAD_REQUEST, message),
        OverlayError::InvalidId(_) => (StatusCode::BAD_REQUEST, "Invalid Overlay ID".to_string()),
        OverlayError::NotFound(_) => (StatusCode::NOT_FOUND, "Overlay not found".to_string()),
        OverlayError::Database(message) => {
            error!(error = %message, "Overlay store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    };
    (status, Json(OverlayErrorResponse { error }))
}

/// Create an overlay
pub async fn create_overlay(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<CreatedResponse>), ErrorReply> {
    let id = state.overlays().create(body).map_err(error_reply)?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Overlay created".to_string(),
            id,
        }),
    ))
}

/// List all overlays
pub async fn list_overlays(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Overlay>>, ErrorReply> {
    state.overlays().list().map(Json).map_err(error_reply)
}

/// Merge fields into an overlay
pub async fn update_overlay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<MessageResponse>, ErrorReply> {
    state.overlays().update(&id, patch).map_err(error_reply)?;
    Ok(Json(MessageResponse {
        message: "Overlay updated".to_string(),
    }))
}

/// Delete an overlay
pub async fn delete_overlay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ErrorReply> {
    state.overlays().delete(&id).map_err(error_reply)?;
    Ok(Json(MessageResponse {
        message: "Overlay deleted".to_string(),
    }))
}
