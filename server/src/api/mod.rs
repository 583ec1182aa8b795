use axum::http::StatusCode;
use logbook_data_management::DataManagerError;

pub mod boats;
pub mod tracking;
pub mod trips;

/// Maps store errors onto the REST boundary. Ownership mismatches arrive as
/// not-found variants and stay 404.
pub fn error_status(err: DataManagerError) -> StatusCode {
    match err {
        DataManagerError::SessionNotFound | DataManagerError::NotFound => StatusCode::NOT_FOUND,
        DataManagerError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        err => {
            tracing::error!("Data manager error: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
