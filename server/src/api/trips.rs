use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use logbook_lib::{
    derive::derive_trip,
    trip::{Trip, TripDraft},
};
use serde::Deserialize;

use crate::{api::error_status, api::tracking::OkResponse, auth::AuthedUser, server_state::ServerState};

pub async fn list_trips(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<Vec<Trip>>, StatusCode> {
    let trips = state
        .data_manager
        .get_trips(user.user_id)
        .await
        .map_err(error_status)?;
    Ok(Json(trips))
}

pub async fn get_trip(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<Trip>, StatusCode> {
    let trip = state
        .data_manager
        .get_trip(trip_id, user.user_id)
        .await
        .map_err(error_status)?;
    Ok(Json(trip))
}

/// Manual entry. When a route is submitted, distance and bounds are derived
/// from it, whatever the body claims.
pub async fn create_trip(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Json(draft): Json<TripDraft>,
) -> Result<Json<Trip>, StatusCode> {
    let trip = state
        .data_manager
        .insert_trip(user.user_id, draft)
        .await
        .map_err(error_status)?;
    Ok(Json(trip))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FromSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub boat_id: Option<i64>,
}

/// Derivation path: turns a stopped session into a trip. A session without
/// points has nothing worth saving and is rejected before derivation runs.
pub async fn create_trip_from_session(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Path(session_id): Path<i64>,
    Json(request): Json<FromSessionRequest>,
) -> Result<Json<Trip>, StatusCode> {
    let session = state
        .data_manager
        .get_session(session_id, user.user_id)
        .await
        .map_err(error_status)?;

    let Some(ended_at) = session.state.ended_at() else {
        // Still recording, stop it first.
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    };
    if session.track_points.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let mut draft = derive_trip(
        &session.track_points,
        session.state.started_at(),
        ended_at,
        request.title,
    );
    draft.boat_id = request.boat_id;

    let trip = state
        .data_manager
        .insert_trip(user.user_id, draft)
        .await
        .map_err(error_status)?;
    Ok(Json(trip))
}

pub async fn update_trip(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Path(trip_id): Path<i64>,
    Json(draft): Json<TripDraft>,
) -> Result<Json<Trip>, StatusCode> {
    let trip = state
        .data_manager
        .update_trip(trip_id, user.user_id, draft)
        .await
        .map_err(error_status)?;
    Ok(Json(trip))
}

pub async fn delete_trip(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<OkResponse>, StatusCode> {
    state
        .data_manager
        .delete_trip(trip_id, user.user_id)
        .await
        .map_err(error_status)?;
    Ok(Json(OkResponse::ok()))
}
