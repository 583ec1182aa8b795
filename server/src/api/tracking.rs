use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use logbook_lib::{track_point::TrackPoint, track_session::TrackSession};
use serde::Serialize;

use crate::{api::error_status, auth::AuthedUser, server_state::ServerState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    session_id: i64,
}

#[derive(Serialize)]
pub struct OkResponse {
    ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Serialize)]
pub struct StopResponse {
    ok: bool,
    session: TrackSession,
}

pub async fn start_tracking(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<StartResponse>, StatusCode> {
    let session = state
        .data_manager
        .start_session(user.user_id)
        .await
        .map_err(error_status)?;

    Ok(Json(StartResponse {
        session_id: session.session_id,
    }))
}

/// No-op 404 when the session is stopped or not owned by the caller.
pub async fn append_point(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Path(session_id): Path<i64>,
    Json(point): Json<TrackPoint>,
) -> Result<Json<OkResponse>, StatusCode> {
    state
        .data_manager
        .append_point(session_id, user.user_id, point)
        .await
        .map_err(error_status)?;

    Ok(Json(OkResponse::ok()))
}

/// One-way stop. A second stop finds nothing and answers 404.
pub async fn stop_tracking(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Path(session_id): Path<i64>,
) -> Result<Json<StopResponse>, StatusCode> {
    let session = state
        .data_manager
        .stop_session(session_id, user.user_id)
        .await
        .map_err(error_status)?;

    Ok(Json(StopResponse { ok: true, session }))
}

pub async fn get_session(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Path(session_id): Path<i64>,
) -> Result<Json<TrackSession>, StatusCode> {
    let session = state
        .data_manager
        .get_session(session_id, user.user_id)
        .await
        .map_err(error_status)?;

    Ok(Json(session))
}
