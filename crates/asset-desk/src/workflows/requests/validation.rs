//! Inbound payloads and their validation into typed commands.
//!
//! Payload fields are optional and loosely typed so malformed input surfaces as a
//! [`ValidationError`] with a field name instead of a deserializer message.

use serde::{Deserialize, Serialize};

use super::domain::{
    ApprovalDecision, ApprovalLevel, CreateRequest, Decision, RequestFilter, RequestId,
    RequestStatus, RequestType,
};
use crate::inventory::domain::AssetId;
use crate::organization::domain::EmployeeId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("\"{0}\" is required")]
    Missing(&'static str),
    #[error("\"{0}\" must be a positive integer")]
    NotPositive(&'static str),
    #[error("\"{field}\" must be one of [{allowed}]")]
    NotAllowed {
        field: &'static str,
        allowed: &'static str,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequestPayload {
    #[serde(default)]
    pub requester_id: Option<i64>,
    #[serde(default)]
    pub asset_id: Option<i64>,
    #[serde(default)]
    pub request_type: Option<String>,
}

impl CreateRequestPayload {
    pub fn validate(self) -> Result<CreateRequest, ValidationError> {
        let requester_id = EmployeeId(positive(self.requester_id, "requester_id")?);
        let asset_id = AssetId(positive(self.asset_id, "asset_id")?);
        let request_type = one_of(
            self.request_type,
            "request_type",
            "Employee, Management",
            RequestType::parse,
        )?;
        Ok(CreateRequest {
            requester_id,
            asset_id,
            request_type,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPayload {
    #[serde(default)]
    pub request_id: Option<i64>,
    #[serde(default)]
    pub approver_id: Option<i64>,
    #[serde(default)]
    pub approval_level: Option<String>,
    #[serde(default)]
    pub approval_status: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl ApprovalPayload {
    pub fn validate(self) -> Result<ApprovalDecision, ValidationError> {
        let request_id = RequestId(positive(self.request_id, "request_id")?);
        let approver_id = EmployeeId(positive(self.approver_id, "approver_id")?);
        let approval_level = one_of(
            self.approval_level,
            "approval_level",
            "TeamLead, IT",
            ApprovalLevel::parse,
        )?;
        let decision = one_of(
            self.approval_status,
            "approval_status",
            "Approved, Rejected",
            Decision::parse,
        )?;
        let remarks = self
            .remarks
            .map(|remarks| remarks.trim().to_string())
            .filter(|remarks| !remarks.is_empty());
        Ok(ApprovalDecision {
            request_id,
            approver_id,
            approval_level,
            decision,
            remarks,
        })
    }
}

/// Query string for the request listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RequestListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub requester_id: Option<i64>,
    #[serde(default)]
    pub asset_id: Option<i64>,
}

impl RequestListQuery {
    pub fn validate(self) -> Result<RequestFilter, ValidationError> {
        Ok(RequestFilter {
            status: optional_status(self.status)?,
            requester_id: self
                .requester_id
                .map(|id| positive(Some(id), "requester_id").map(EmployeeId))
                .transpose()?,
            asset_id: self
                .asset_id
                .map(|id| positive(Some(id), "asset_id").map(AssetId))
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PendingApprovalsQuery {
    #[serde(default, alias = "approverId")]
    pub approver_id: Option<i64>,
}

impl PendingApprovalsQuery {
    pub fn validate(self) -> Result<EmployeeId, ValidationError> {
        positive(self.approver_id, "approver_id").map(EmployeeId)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmployeeAssetsQuery {
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl EmployeeAssetsQuery {
    pub fn validate(self) -> Result<(EmployeeId, Option<RequestStatus>), ValidationError> {
        let employee_id = EmployeeId(positive(self.employee_id, "employee_id")?);
        Ok((employee_id, optional_status(self.status)?))
    }
}

fn positive(value: Option<i64>, field: &'static str) -> Result<u64, ValidationError> {
    let value = value.ok_or(ValidationError::Missing(field))?;
    match u64::try_from(value) {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ValidationError::NotPositive(field)),
    }
}

fn one_of<T>(
    value: Option<String>,
    field: &'static str,
    allowed: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ValidationError> {
    let value = value.ok_or(ValidationError::Missing(field))?;
    parse(value.trim()).ok_or(ValidationError::NotAllowed { field, allowed })
}

fn optional_status(value: Option<String>) -> Result<Option<RequestStatus>, ValidationError> {
    match value.filter(|status| !status.trim().is_empty()) {
        None => Ok(None),
        Some(status) => one_of(
            Some(status),
            "status",
            "Pending, Approved, Rejected, Issued",
            RequestStatus::parse,
        )
        .map(Some),
    }
}
