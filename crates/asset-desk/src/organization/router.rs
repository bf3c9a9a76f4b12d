use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{EmployeeId, TeamId};
use super::{OrganizationError, OrganizationService};
use crate::error::AppError;
use crate::http::{blocking, respond};
use crate::store::Store;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamLeadPayload {
    #[serde(default)]
    pub employee_id: Option<u64>,
    #[serde(default)]
    pub team_id: Option<u64>,
}

impl TeamLeadPayload {
    fn validate(self) -> Result<(EmployeeId, TeamId), OrganizationError> {
        match (self.employee_id, self.team_id) {
            (Some(employee), Some(team)) if employee > 0 && team > 0 => {
                Ok((EmployeeId(employee), TeamId(team)))
            }
            _ => Err(OrganizationError::Invalid(
                "employee_id and team_id are required".to_string(),
            )),
        }
    }
}

pub fn organization_router<S>(service: Arc<OrganizationService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route("/api/v1/team-leads", post(assign_lead_handler::<S>))
        .route(
            "/api/v1/team-leads/:employee_id/members",
            get(roster_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn assign_lead_handler<S: Store + 'static>(
    State(service): State<Arc<OrganizationService<S>>>,
    payload: Result<Json<TeamLeadPayload>, JsonRejection>,
) -> Response {
    let (employee, team) = match payload {
        Ok(Json(payload)) => match payload.validate() {
            Ok(ids) => ids,
            Err(err) => return AppError::from(err).into_response(),
        },
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    match blocking(move || service.assign_team_lead(employee, team)).await {
        Ok(()) => {
            let payload = json!({ "message": "Team lead assigned successfully" });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn roster_handler<S: Store + 'static>(
    State(service): State<Arc<OrganizationService<S>>>,
    employee_id: Result<Path<u64>, PathRejection>,
) -> Response {
    let lead = match employee_id {
        Ok(Path(employee_id)) => EmployeeId(employee_id),
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    respond(
        StatusCode::OK,
        blocking(move || service.team_roster(lead)).await,
    )
}
