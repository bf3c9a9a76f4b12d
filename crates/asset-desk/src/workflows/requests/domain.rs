use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::inventory::domain::{AssetId, AssetSummary};
use crate::organization::domain::{numeric_id, EmployeeId};

numeric_id!(
    /// Identifier wrapper for asset requests.
    RequestId
);

/// Who the request is raised on behalf of; decides the approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Employee,
    Management,
}

impl RequestType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Employee" => Some(Self::Employee),
            "Management" => Some(Self::Management),
            _ => None,
        }
    }
}

/// Aggregate status of a request. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Issued,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Issued => "Issued",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(Self::Pending),
            "Approved" => Some(Self::Approved),
            "Rejected" => Some(Self::Rejected),
            "Issued" => Some(Self::Issued),
            _ => None,
        }
    }

    /// Pending or approved requests each hold one unit of their asset until they close.
    pub const fn is_open(self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Approved)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Issued)
    }

    fn rank(self) -> u8 {
        match self {
            RequestStatus::Pending => 0,
            RequestStatus::Approved => 1,
            RequestStatus::Rejected | RequestStatus::Issued => 2,
        }
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic.
    pub fn can_advance_to(self, next: RequestStatus) -> bool {
        match (self, next) {
            (RequestStatus::Pending, RequestStatus::Issued) => false,
            (RequestStatus::Approved, RequestStatus::Rejected) => true,
            _ => !self.is_terminal() && next.rank() > self.rank(),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApprovalLevel {
    TeamLead,
    #[serde(rename = "IT")]
    It,
}

impl ApprovalLevel {
    pub const fn label(self) -> &'static str {
        match self {
            ApprovalLevel::TeamLead => "TeamLead",
            ApprovalLevel::It => "IT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "TeamLead" => Some(Self::TeamLead),
            "IT" => Some(Self::It),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApprovalLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// A decision an approver can record against a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Approved" => Some(Self::Approved),
            "Rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub const fn as_status(self) -> ApprovalStatus {
        match self {
            Decision::Approved => ApprovalStatus::Approved,
            Decision::Rejected => ApprovalStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRequest {
    pub request_id: RequestId,
    pub requester_id: EmployeeId,
    pub asset_id: AssetId,
    pub request_type: RequestType,
    pub request_status: RequestStatus,
    pub request_date: DateTime<Utc>,
}

/// Row handed to the store on creation; id and date are assigned on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAssetRequest {
    pub requester_id: EmployeeId,
    pub asset_id: AssetId,
    pub request_type: RequestType,
}

/// One required sign-off attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalGate {
    pub request_id: RequestId,
    pub approver_id: EmployeeId,
    pub approval_level: ApprovalLevel,
    pub approval_status: ApprovalStatus,
    pub remarks: Option<String>,
    pub approval_date: Option<DateTime<Utc>>,
}

impl ApprovalGate {
    pub fn pending(request_id: RequestId, step: ApprovalStep) -> Self {
        Self {
            request_id,
            approver_id: step.approver_id,
            approval_level: step.level,
            approval_status: ApprovalStatus::Pending,
            remarks: None,
            approval_date: None,
        }
    }
}

/// A resolved entry of the approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApprovalStep {
    pub level: ApprovalLevel,
    pub approver_id: EmployeeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuance {
    pub request_id: RequestId,
    pub asset_id: AssetId,
    pub employee_id: EmployeeId,
    pub issue_date: NaiveDate,
    pub quantity_issued: u32,
}

/// Validated creation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateRequest {
    pub requester_id: EmployeeId,
    pub asset_id: AssetId,
    pub request_type: RequestType,
}

/// Validated approver decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalDecision {
    pub request_id: RequestId,
    pub approver_id: EmployeeId,
    pub approval_level: ApprovalLevel,
    pub decision: Decision,
    pub remarks: Option<String>,
}

/// Optional filters for the request listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub requester_id: Option<EmployeeId>,
    pub asset_id: Option<AssetId>,
}

impl RequestFilter {
    pub fn for_asset(asset_id: AssetId) -> Self {
        Self {
            asset_id: Some(asset_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, request: &AssetRequest) -> bool {
        self.status.map_or(true, |status| request.request_status == status)
            && self
                .requester_id
                .map_or(true, |requester| request.requester_id == requester)
            && self.asset_id.map_or(true, |asset| request.asset_id == asset)
    }
}

/// Pending gate joined with its request, requester, and asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingApprovalView {
    pub request_id: RequestId,
    pub requester_id: EmployeeId,
    pub requester_name: String,
    pub asset_id: AssetId,
    pub request_type: RequestType,
    pub request_status: RequestStatus,
    pub request_date: DateTime<Utc>,
    pub approval_level: ApprovalLevel,
    #[serde(flatten)]
    pub asset: AssetSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: AssetRequest,
    pub requester_name: String,
    #[serde(flatten)]
    pub asset: AssetSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeAssetView {
    #[serde(flatten)]
    pub request: AssetRequest,
    #[serde(flatten)]
    pub asset: AssetSummary,
}

/// Sort newest first, breaking date ties by the higher id.
pub(crate) fn newest_first(a: &AssetRequest, b: &AssetRequest) -> std::cmp::Ordering {
    b.request_date
        .cmp(&a.request_date)
        .then_with(|| b.request_id.cmp(&a.request_id))
}
