use std::future::Future;

use logbook_lib::{track_point::TrackPoint, track_session::TrackSession};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::TrackerError;

/// Transport to the session store. The authentication token is threaded
/// through explicitly, no ambient state.
pub trait SessionClient: Send + Sync + 'static {
    fn create_session(&self) -> impl Future<Output = Result<i64, TrackerError>> + Send;

    fn append_point(
        &self,
        session_id: i64,
        point: TrackPoint,
    ) -> impl Future<Output = Result<(), TrackerError>> + Send;

    fn stop_session(
        &self,
        session_id: i64,
    ) -> impl Future<Output = Result<TrackSession, TrackerError>> + Send;
}

/// Talks to the REST boundary of the logbook server.
#[derive(Clone)]
pub struct HttpSessionClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    session_id: i64,
}

#[derive(Deserialize)]
struct StopResponse {
    #[allow(dead_code)]
    ok: bool,
    session: TrackSession,
}

impl HttpSessionClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl SessionClient for HttpSessionClient {
    async fn create_session(&self) -> Result<i64, TrackerError> {
        let response = self
            .http
            .post(self.url("/api/tracking/start"))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|err| TrackerError::SessionCreate(err.to_string()))?;

        if !response.status().is_success() {
            return Err(TrackerError::SessionCreate(format!(
                "Server answered {}",
                response.status()
            )));
        }

        response
            .json::<StartResponse>()
            .await
            .map(|body| body.session_id)
            .map_err(|err| TrackerError::SessionCreate(err.to_string()))
    }

    async fn append_point(&self, session_id: i64, point: TrackPoint) -> Result<(), TrackerError> {
        let response = self
            .http
            .post(self.url(&format!("/api/tracking/{session_id}/point")))
            .bearer_auth(&self.api_token)
            .json(&point)
            .send()
            .await
            .map_err(|err| TrackerError::PointSubmission(err.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(TrackerError::SessionNotFound),
            status if status.is_success() => Ok(()),
            status => Err(TrackerError::PointSubmission(format!(
                "Server answered {status}"
            ))),
        }
    }

    async fn stop_session(&self, session_id: i64) -> Result<TrackSession, TrackerError> {
        let response = self
            .http
            .post(self.url(&format!("/api/tracking/{session_id}/stop")))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|err| TrackerError::PointSubmission(err.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(TrackerError::SessionNotFound),
            status if status.is_success() => response
                .json::<StopResponse>()
                .await
                .map(|body| body.session)
                .map_err(|err| TrackerError::PointSubmission(err.to_string())),
            status => Err(TrackerError::PointSubmission(format!(
                "Server answered {status}"
            ))),
        }
    }
}
