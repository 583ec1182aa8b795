use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use logbook_lib::boat::{Boat, BoatDraft};

use crate::{api::error_status, api::tracking::OkResponse, auth::AuthedUser, server_state::ServerState};

pub async fn list_boats(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<Vec<Boat>>, StatusCode> {
    let boats = state
        .data_manager
        .get_boats(user.user_id)
        .await
        .map_err(error_status)?;
    Ok(Json(boats))
}

pub async fn create_boat(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Json(draft): Json<BoatDraft>,
) -> Result<Json<Boat>, StatusCode> {
    let boat = state
        .data_manager
        .insert_boat(user.user_id, draft)
        .await
        .map_err(error_status)?;
    Ok(Json(boat))
}

pub async fn update_boat(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Path(boat_id): Path<i64>,
    Json(draft): Json<BoatDraft>,
) -> Result<Json<Boat>, StatusCode> {
    let boat = state
        .data_manager
        .update_boat(boat_id, user.user_id, draft)
        .await
        .map_err(error_status)?;
    Ok(Json(boat))
}

pub async fn delete_boat(
    State(state): State<Arc<ServerState>>,
    AuthedUser(user): AuthedUser,
    Path(boat_id): Path<i64>,
) -> Result<Json<OkResponse>, StatusCode> {
    state
        .data_manager
        .delete_boat(boat_id, user.user_id)
        .await
        .map_err(error_status)?;
    Ok(Json(OkResponse::ok()))
}
