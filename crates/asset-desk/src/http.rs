//! Plumbing shared by the routers.
//!
//! Services are synchronous and may park on an asset row lock for up to the configured lock
//! timeout, so handlers run them on the blocking pool instead of a runtime worker.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::AppError;

/// Run a service call on tokio's blocking pool.
pub(crate) async fn blocking<T, E, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(Into::into),
        Err(join) => Err(AppError::Server(axum::Error::new(join))),
    }
}

/// Render `result` with `status`, or the error's own status and `{"error": ..}` body.
pub(crate) fn respond<T: Serialize>(status: StatusCode, result: Result<T, AppError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}
