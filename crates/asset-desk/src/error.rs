use crate::config::ConfigError;
use crate::inventory::InventoryError;
use crate::organization::OrganizationError;
use crate::telemetry::TelemetryError;
use crate::workflows::requests::{EligibilityError, RequestError};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Request(RequestError),
    Inventory(InventoryError),
    Organization(OrganizationError),
    /// Body, path, or query string that could not be extracted.
    Malformed(String),
}

impl AppError {
    /// HTTP status for the error: caller mistakes are 400, unknown ids 404, the rest 500.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Request(err) => request_status(err),
            AppError::Inventory(err) => inventory_status(err),
            AppError::Organization(err) => organization_status(err),
            AppError::Malformed(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn request_status(err: &RequestError) -> StatusCode {
    match err {
        RequestError::EmployeeNotFound(_)
        | RequestError::RequestNotFound(_)
        | RequestError::AuditEntryNotFound(_)
        | RequestError::GateNotFound { .. } => StatusCode::NOT_FOUND,
        RequestError::Validation(_)
        | RequestError::DuplicatePendingRequest { .. }
        | RequestError::OutOfStock(_)
        | RequestError::RequestNotApproved { .. }
        | RequestError::RequestClosed { .. }
        | RequestError::GateAlreadyDecided { .. } => StatusCode::BAD_REQUEST,
        RequestError::Eligibility(EligibilityError::Store(_)) | RequestError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        RequestError::Eligibility(_) => StatusCode::BAD_REQUEST,
        RequestError::Inventory(err) => inventory_status(err),
    }
}

fn inventory_status(err: &InventoryError) -> StatusCode {
    match err {
        InventoryError::AssetNotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::InsufficientStock { .. }
        | InventoryError::SerialNumberTaken
        | InventoryError::AssetReferenced(_)
        | InventoryError::Invalid(_) => StatusCode::BAD_REQUEST,
        InventoryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn organization_status(err: &OrganizationError) -> StatusCode {
    match err {
        OrganizationError::EmployeeNotFound(_)
        | OrganizationError::TeamNotFound(_)
        | OrganizationError::DepartmentNotFound(_)
        | OrganizationError::ActiveLeadNotFound(_) => StatusCode::NOT_FOUND,
        OrganizationError::Invalid(_) => StatusCode::BAD_REQUEST,
        OrganizationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Request(err) => write!(f, "{}", err),
            AppError::Inventory(err) => write!(f, "{}", err),
            AppError::Organization(err) => write!(f, "{}", err),
            AppError::Malformed(message) => write!(f, "malformed request: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Request(err) => Some(err),
            AppError::Inventory(err) => Some(err),
            AppError::Organization(err) => Some(err),
            AppError::Malformed(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RequestError> for AppError {
    fn from(value: RequestError) -> Self {
        Self::Request(value)
    }
}

impl From<InventoryError> for AppError {
    fn from(value: InventoryError) -> Self {
        Self::Inventory(value)
    }
}

impl From<OrganizationError> for AppError {
    fn from(value: OrganizationError) -> Self {
        Self::Organization(value)
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        Self::Malformed(value.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(value: QueryRejection) -> Self {
        Self::Malformed(value.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(value: PathRejection) -> Self {
        Self::Malformed(value.body_text())
    }
}
