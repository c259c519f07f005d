//! Stream API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use hlsrelay_core::StreamError;

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a stream
#[derive(Debug, Deserialize)]
pub struct StartStreamBody {
    #[serde(rename = "rtspUrl")]
    pub rtsp_url: Option<String>,
}

/// Response for a started stream
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartStreamResponse {
    pub message: String,
    pub stream_id: String,
    pub hls_url: String,
}

/// Response for listing active streams
#[derive(Debug, Serialize)]
pub struct ListStreamsResponse {
    pub streams: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response, with the transcoder's last log lines when it failed to start
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_tail: Option<Vec<String>>,
}

type ErrorReply = (StatusCode, Json<StreamErrorResponse>);

fn error_reply(e: StreamError) -> ErrorReply {
    let status = match &e {
        StreamError::InvalidSource { .. } => {
            return (
                StatusCode::BAD_REQUEST,
                Json(StreamErrorResponse {
                    error: "Invalid RTSP URL".to_string(),
                    log_tail: None,
                }),
            );
        }
        StreamError::JobNotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(StreamErrorResponse {
            error: e.to_string(),
            log_tail: e.log_tail().map(<[String]>::to_vec),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Start converting an RTSP feed. Replies once the playlist is available.
pub async fn start_stream(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartStreamBody>>,
) -> Result<Json<StartStreamResponse>, ErrorReply> {
    let rtsp_url = body
        .and_then(|Json(body)| body.rtsp_url)
        .unwrap_or_default();

    match state.streams().start(&rtsp_url).await {
        Ok(started) => {
            info!(stream_id = %started.id, "Streaming initiated");
            Ok(Json(StartStreamResponse {
                message: "Streaming initiated".to_string(),
                stream_id: started.id,
                hls_url: started.playlist_url,
            }))
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Failed to start stream");
            Err(error_reply(e))
        }
    }
}

/// Stop an active stream
pub async fn stop_stream(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ErrorReply> {
    match state.streams().stop(&id).await {
        Ok(true) => Ok(Json(MessageResponse {
            message: format!("Stream {} stopped.", id),
        })),
        Ok(false) => Err(error_reply(StreamError::JobNotFound { id })),
        Err(e) => {
            error!(stream_id = %id, error = %e, "Failed to stop stream");
            Err(error_reply(e))
        }
    }
}

/// List ids of active streams
pub async fn list_streams(State(state): State<Arc<AppState>>) -> Json<ListStreamsResponse> {
    Json(ListStreamsResponse {
        streams: state.streams().active_ids(),
    })
}
