use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::audit::AuditLogId;
use super::domain::RequestId;
use super::service::{AssetRequestService, RequestError};
use super::validation::{
    ApprovalPayload, CreateRequestPayload, EmployeeAssetsQuery, PendingApprovalsQuery,
    RequestListQuery,
};
use crate::error::AppError;
use crate::http::{blocking, respond};
use crate::store::Store;

/// Router exposing the request lifecycle and the audit trail.
pub fn asset_request_router<S>(service: Arc<AssetRequestService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/asset-requests",
            post(create_handler::<S>).get(list_handler::<S>),
        )
        .route("/api/v1/asset-requests/approvals", post(approval_handler::<S>))
        .route("/api/v1/asset-requests/pending", get(pending_handler::<S>))
        .route(
            "/api/v1/asset-requests/employee",
            get(employee_assets_handler::<S>),
        )
        .route("/api/v1/asset-requests/:request_id", get(detail_handler::<S>))
        .route(
            "/api/v1/asset-requests/:request_id/issue",
            post(issue_handler::<S>),
        )
        .route("/api/v1/audit-logs", get(audit_log_handler::<S>))
        .route("/api/v1/audit-logs/:log_id", get(audit_entry_handler::<S>))
        .with_state(service)
}

fn failure(err: impl Into<AppError>) -> Response {
    err.into().into_response()
}

pub(crate) async fn create_handler<S: Store + 'static>(
    State(service): State<Arc<AssetRequestService<S>>>,
    payload: Result<Json<CreateRequestPayload>, JsonRejection>,
) -> Response {
    let command = match payload {
        Ok(Json(payload)) => match payload.validate() {
            Ok(command) => command,
            Err(err) => return failure(RequestError::from(err)),
        },
        Err(rejection) => return failure(rejection),
    };
    match blocking(move || service.create(command)).await {
        Ok(request) => {
            let payload = json!({
                "message": "Asset request created successfully",
                "request_id": request.request_id,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn approval_handler<S: Store + 'static>(
    State(service): State<Arc<AssetRequestService<S>>>,
    payload: Result<Json<ApprovalPayload>, JsonRejection>,
) -> Response {
    let decision = match payload {
        Ok(Json(payload)) => match payload.validate() {
            Ok(decision) => decision,
            Err(err) => return failure(RequestError::from(err)),
        },
        Err(rejection) => return failure(rejection),
    };
    match blocking(move || service.record_approval(decision)).await {
        Ok(outcome) => {
            let payload = json!({
                "message": outcome.message(),
                "request_status": outcome.request_status,
                "issuance": outcome.issuance,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn issue_handler<S: Store + 'static>(
    State(service): State<Arc<AssetRequestService<S>>>,
    request_id: Result<Path<u64>, PathRejection>,
) -> Response {
    let request_id = match request_id {
        Ok(Path(request_id)) => RequestId(request_id),
        Err(rejection) => return failure(rejection),
    };
    match blocking(move || service.issue(request_id)).await {
        Ok(issuance) => {
            let payload = json!({
                "message": "Asset issued successfully",
                "issuance": issuance,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_handler<S: Store + 'static>(
    State(service): State<Arc<AssetRequestService<S>>>,
    query: Result<Query<RequestListQuery>, QueryRejection>,
) -> Response {
    let filter = match query {
        Ok(Query(query)) => match query.validate() {
            Ok(filter) => filter,
            Err(err) => return failure(RequestError::from(err)),
        },
        Err(rejection) => return failure(rejection),
    };
    respond(
        StatusCode::OK,
        blocking(move || service.list_requests(filter)).await,
    )
}

pub(crate) async fn pending_handler<S: Store + 'static>(
    State(service): State<Arc<AssetRequestService<S>>>,
    query: Result<Query<PendingApprovalsQuery>, QueryRejection>,
) -> Response {
    let approver_id = match query {
        Ok(Query(query)) => match query.validate() {
            Ok(approver_id) => approver_id,
            Err(err) => return failure(RequestError::from(err)),
        },
        Err(rejection) => return failure(rejection),
    };
    respond(
        StatusCode::OK,
        blocking(move || service.pending_approvals(approver_id)).await,
    )
}

pub(crate) async fn employee_assets_handler<S: Store + 'static>(
    State(service): State<Arc<AssetRequestService<S>>>,
    query: Result<Query<EmployeeAssetsQuery>, QueryRejection>,
) -> Response {
    let (employee_id, status) = match query {
        Ok(Query(query)) => match query.validate() {
            Ok(scope) => scope,
            Err(err) => return failure(RequestError::from(err)),
        },
        Err(rejection) => return failure(rejection),
    };
    respond(
        StatusCode::OK,
        blocking(move || service.employee_assets(employee_id, status)).await,
    )
}

pub(crate) async fn detail_handler<S: Store + 'static>(
    State(service): State<Arc<AssetRequestService<S>>>,
    request_id: Result<Path<u64>, PathRejection>,
) -> Response {
    let request_id = match request_id {
        Ok(Path(request_id)) => RequestId(request_id),
        Err(rejection) => return failure(rejection),
    };
    respond(
        StatusCode::OK,
        blocking(move || service.detail(request_id)).await,
    )
}

pub(crate) async fn audit_log_handler<S: Store + 'static>(
    State(service): State<Arc<AssetRequestService<S>>>,
) -> Response {
    respond(StatusCode::OK, blocking(move || service.audit_log()).await)
}

pub(crate) async fn audit_entry_handler<S: Store + 'static>(
    State(service): State<Arc<AssetRequestService<S>>>,
    log_id: Result<Path<u64>, PathRejection>,
) -> Response {
    let log_id = match log_id {
        Ok(Path(log_id)) => AuditLogId(log_id),
        Err(rejection) => return failure(rejection),
    };
    respond(
        StatusCode::OK,
        blocking(move || service.audit_entry(log_id)).await,
    )
}
