use std::sync::Arc;

use axum::{RequestPartsExt, extract::FromRequestParts, http::StatusCode, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use logbook_lib::user::User;

use crate::server_state::ServerState;

/// Resolves the bearer token to a user. Missing or unknown tokens are 401,
/// existence of other users' data is never revealed.
pub struct AuthedUser(pub User);

impl FromRequestParts<Arc<ServerState>> for AuthedUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServerState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        match state.data_manager.authenticate(bearer.token()).await {
            Ok(Some(user)) => Ok(AuthedUser(user)),
            Ok(None) => Err(StatusCode::UNAUTHORIZED),
            Err(err) => {
                tracing::error!("Failed to authenticate request: {err}");
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
