//! Asset request lifecycle: creation, approval gates, and issuance.
//!
//! A request moves `Pending -> Approved -> Issued`, or to `Rejected` from `Pending`. Every
//! transition runs in one store transaction that holds the requested asset's row lock, and
//! appends its audit entry in that same transaction.

pub mod audit;
pub mod domain;
pub mod eligibility;
pub mod issuance;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use audit::{AuditAction, AuditEvent, AuditLogId, AuditRecorder};
pub use domain::{
    ApprovalDecision, ApprovalGate, ApprovalLevel, ApprovalStatus, ApprovalStep, AssetRequest,
    CreateRequest, Decision, EmployeeAssetView, Issuance, PendingApprovalView, RequestFilter,
    RequestId, RequestStatus, RequestType, RequestView,
};
pub use eligibility::{EligibilityError, EligibilityResolver, MissingPlacement};
pub use issuance::IssuanceExecutor;
pub use router::asset_request_router;
pub use service::{
    aggregate_status, ApprovalOutcome, AssetRequestService, RequestDetail, RequestError,
};
pub use validation::{
    ApprovalPayload, CreateRequestPayload, EmployeeAssetsQuery, PendingApprovalsQuery,
    RequestListQuery, ValidationError,
};
