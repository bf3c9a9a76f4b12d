use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::audit::{AuditAction, AuditEvent, AuditLogId, AuditRecorder};
use super::domain::{
    newest_first, ApprovalDecision, ApprovalGate, ApprovalLevel, ApprovalStatus, AssetRequest,
    CreateRequest, EmployeeAssetView, Issuance, NewAssetRequest, PendingApprovalView, RequestFilter,
    RequestId, RequestStatus, RequestType, RequestView,
};
use super::eligibility::{EligibilityError, EligibilityResolver};
use super::issuance::IssuanceExecutor;
use super::validation::ValidationError;
use crate::inventory::domain::AssetId;
use crate::inventory::{InventoryError, InventoryLedger};
use crate::organization::domain::{DepartmentRoles, EmployeeId};
use crate::store::{
    transaction, AuditRecords, InventoryRecords, OrganizationDirectory, RequestRecords, Store,
    StoreError,
};

/// Error raised by the request lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
    #[error("employee with id {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("request {0} not found")]
    RequestNotFound(RequestId),
    #[error("audit log {0} not found")]
    AuditEntryNotFound(AuditLogId),
    #[error("no {level} approval assigned to employee {approver_id} for request {request_id}")]
    GateNotFound {
        request_id: RequestId,
        approver_id: EmployeeId,
        level: ApprovalLevel,
    },
    #[error("a pending request for asset {asset_id} already exists for employee {requester_id}")]
    DuplicatePendingRequest {
        requester_id: EmployeeId,
        asset_id: AssetId,
    },
    #[error("asset {0} is out of stock")]
    OutOfStock(AssetId),
    #[error("request {request_id} must be Approved to issue, found {status}")]
    RequestNotApproved {
        request_id: RequestId,
        status: RequestStatus,
    },
    #[error("request {request_id} is already {status}")]
    RequestClosed {
        request_id: RequestId,
        status: RequestStatus,
    },
    #[error("{level} approval for request {request_id} has already been decided")]
    GateAlreadyDecided {
        request_id: RequestId,
        level: ApprovalLevel,
    },
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a recorded decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalOutcome {
    pub request_id: RequestId,
    pub request_status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance: Option<Issuance>,
}

impl ApprovalOutcome {
    pub fn message(&self) -> &'static str {
        match self.request_status {
            RequestStatus::Pending => "Approval recorded",
            RequestStatus::Approved => "Request approved",
            RequestStatus::Rejected => "Request rejected",
            RequestStatus::Issued => "Request approved and asset issued",
        }
    }
}

/// A request with its gates and, once issued, its issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: AssetRequest,
    pub approvals: Vec<ApprovalGate>,
    pub issuance: Option<Issuance>,
}

/// Aggregate request status implied by its gates.
///
/// Any rejection wins; all approvals approve; anything else keeps the request pending.
pub fn aggregate_status(gates: &[ApprovalGate]) -> RequestStatus {
    if gates
        .iter()
        .any(|gate| gate.approval_status == ApprovalStatus::Rejected)
    {
        RequestStatus::Rejected
    } else if !gates.is_empty()
        && gates
            .iter()
            .all(|gate| gate.approval_status == ApprovalStatus::Approved)
    {
        RequestStatus::Approved
    } else {
        RequestStatus::Pending
    }
}

/// Request lifecycle engine: creation, decisions, issuance, and the read views over them.
pub struct AssetRequestService<S> {
    store: Arc<S>,
    resolver: EligibilityResolver,
    ledger: InventoryLedger,
    issuer: IssuanceExecutor,
    audit: AuditRecorder,
}

impl<S: Store> AssetRequestService<S> {
    pub fn new(store: Arc<S>, roles: DepartmentRoles) -> Self {
        Self {
            store,
            resolver: EligibilityResolver::new(roles),
            ledger: InventoryLedger,
            issuer: IssuanceExecutor::default(),
            audit: AuditRecorder,
        }
    }

    /// Create a pending request with one gate per approval step.
    pub fn create(&self, command: CreateRequest) -> Result<AssetRequest, RequestError> {
        let CreateRequest {
            requester_id,
            asset_id,
            request_type,
        } = command;

        let result = transaction(self.store.as_ref(), |tx| {
            let quantity = self.ledger.lock_and_read_quantity(tx, asset_id)?;
            tx.employee(requester_id)?
                .ok_or(RequestError::EmployeeNotFound(requester_id))?;

            let chain = self
                .resolver
                .resolve_approval_chain(&*tx, requester_id, request_type)?;

            let open: Vec<AssetRequest> = tx
                .requests(&RequestFilter::for_asset(asset_id))?
                .into_iter()
                .filter(|request| request.request_status.is_open())
                .collect();
            if open.iter().any(|request| {
                request.requester_id == requester_id
                    && request.request_status == RequestStatus::Pending
            }) {
                return Err(RequestError::DuplicatePendingRequest {
                    requester_id,
                    asset_id,
                });
            }
            // Each open request already holds one unit of stock.
            if quantity as usize <= open.len() {
                return Err(RequestError::OutOfStock(asset_id));
            }

            let request = tx.insert_request(NewAssetRequest {
                requester_id,
                asset_id,
                request_type,
            })?;
            for step in &chain {
                tx.insert_gate(ApprovalGate::pending(request.request_id, *step))?;
            }
            self.audit
                .record(tx, AuditAction::Request, request.request_id, requester_id)?;
            Ok(request)
        });

        match result {
            Ok(request) => {
                info!(
                    request_id = %request.request_id,
                    requester_id = %requester_id,
                    asset_id = %asset_id,
                    request_type = ?request_type,
                    "asset request created"
                );
                Ok(request)
            }
            Err(err) => {
                warn!(
                    requester_id = %requester_id,
                    asset_id = %asset_id,
                    error = %err,
                    "asset request rolled back"
                );
                Err(err)
            }
        }
    }

    /// Record an approver's decision and advance the request accordingly.
    ///
    /// Runs under the asset row lock of the request, so decisions on one request apply one at a
    /// time and the aggregate always sees both.
    pub fn record_approval(
        &self,
        decision: ApprovalDecision,
    ) -> Result<ApprovalOutcome, RequestError> {
        let request_id = decision.request_id;
        let approver_id = decision.approver_id;
        let level = decision.approval_level;

        let result = transaction(self.store.as_ref(), |tx| {
            let asset_id = tx
                .request(request_id)?
                .ok_or(RequestError::RequestNotFound(request_id))?
                .asset_id;
            self.ledger.lock_and_read_quantity(tx, asset_id)?;

            // Re-read under the lock; another decision may have closed the request meanwhile.
            let request = tx
                .request(request_id)?
                .ok_or(RequestError::RequestNotFound(request_id))?;
            if request.request_status != RequestStatus::Pending {
                return Err(RequestError::RequestClosed {
                    request_id,
                    status: request.request_status,
                });
            }

            let gate = tx
                .gates(request_id)?
                .into_iter()
                .find(|gate| gate.approver_id == approver_id && gate.approval_level == level)
                .ok_or(RequestError::GateNotFound {
                    request_id,
                    approver_id,
                    level,
                })?;
            if gate.approval_status != ApprovalStatus::Pending {
                return Err(RequestError::GateAlreadyDecided { request_id, level });
            }

            tx.update_gate(
                request_id,
                approver_id,
                level,
                decision.decision.as_status(),
                decision.remarks.clone(),
            )?
            .ok_or(RequestError::GateNotFound {
                request_id,
                approver_id,
                level,
            })?;
            self.audit
                .record(tx, decision.decision.into(), request_id, approver_id)?;

            let gates = tx.gates(request_id)?;
            match aggregate_status(&gates) {
                RequestStatus::Rejected => {
                    tx.update_request_status(request_id, RequestStatus::Rejected)?;
                    Ok(ApprovalOutcome {
                        request_id,
                        request_status: RequestStatus::Rejected,
                        issuance: None,
                    })
                }
                RequestStatus::Approved => {
                    tx.update_request_status(request_id, RequestStatus::Approved)?;
                    let issuance = self.issuer.issue(tx, request_id)?;
                    Ok(ApprovalOutcome {
                        request_id,
                        request_status: RequestStatus::Issued,
                        issuance: Some(issuance),
                    })
                }
                _ => Ok(ApprovalOutcome {
                    request_id,
                    request_status: RequestStatus::Pending,
                    issuance: None,
                }),
            }
        });

        match result {
            Ok(outcome) => {
                info!(
                    request_id = %request_id,
                    approver_id = %approver_id,
                    level = %level,
                    decision = ?decision.decision,
                    status = %outcome.request_status,
                    "approval recorded"
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    request_id = %request_id,
                    approver_id = %approver_id,
                    level = %level,
                    error = %err,
                    "approval rolled back"
                );
                Err(err)
            }
        }
    }

    /// Issue an approved request in its own transaction.
    pub fn issue(&self, request_id: RequestId) -> Result<Issuance, RequestError> {
        transaction(self.store.as_ref(), |tx| self.issuer.issue(tx, request_id)).map_err(|err| {
            warn!(request_id = %request_id, error = %err, "issuance rolled back");
            err
        })
    }

    /// Pending gates assigned to `approver_id`, newest request first.
    ///
    /// Only Pending requests are listed. IT reviewers do not see employee requests until the team
    /// lead has approved them.
    pub fn pending_approvals(
        &self,
        approver_id: EmployeeId,
    ) -> Result<Vec<PendingApprovalView>, RequestError> {
        transaction(self.store.as_ref(), |tx| {
            let approver = tx
                .employee(approver_id)?
                .ok_or(RequestError::EmployeeNotFound(approver_id))?;
            let it_reviewer = self.resolver.is_it_member(&approver);

            let mut rows = Vec::new();
            for gate in tx.gates_for_approver(approver_id, ApprovalStatus::Pending)? {
                let Some(request) = tx.request(gate.request_id)? else {
                    continue;
                };
                // A rejection closes the request but leaves the other gates Pending.
                if request.request_status != RequestStatus::Pending {
                    continue;
                }
                if it_reviewer
                    && request.request_type == RequestType::Employee
                    && awaiting_team_lead(&tx.gates(request.request_id)?)
                {
                    continue;
                }
                let (Some(requester), Some(asset)) =
                    (tx.employee(request.requester_id)?, tx.asset(request.asset_id)?)
                else {
                    continue;
                };
                rows.push((request, requester.full_name, gate.approval_level, asset.summary()));
            }
            rows.sort_by(|a, b| newest_first(&a.0, &b.0));

            Ok(rows
                .into_iter()
                .map(|(request, requester_name, approval_level, asset)| PendingApprovalView {
                    request_id: request.request_id,
                    requester_id: request.requester_id,
                    requester_name,
                    asset_id: request.asset_id,
                    request_type: request.request_type,
                    request_status: request.request_status,
                    request_date: request.request_date,
                    approval_level,
                    asset,
                })
                .collect())
        })
    }

    /// Requests matching `filter` with requester name and asset summary, newest first.
    pub fn list_requests(&self, filter: RequestFilter) -> Result<Vec<RequestView>, RequestError> {
        transaction(self.store.as_ref(), |tx| {
            let mut views = Vec::new();
            for request in tx.requests(&filter)? {
                let (Some(requester), Some(asset)) =
                    (tx.employee(request.requester_id)?, tx.asset(request.asset_id)?)
                else {
                    continue;
                };
                views.push(RequestView {
                    requester_name: requester.full_name,
                    asset: asset.summary(),
                    request,
                });
            }
            Ok(views)
        })
    }

    /// The employee's own requests, optionally narrowed to one status, newest first.
    pub fn employee_assets(
        &self,
        employee_id: EmployeeId,
        status: Option<RequestStatus>,
    ) -> Result<Vec<EmployeeAssetView>, RequestError> {
        let filter = RequestFilter {
            status,
            requester_id: Some(employee_id),
            asset_id: None,
        };
        transaction(self.store.as_ref(), |tx| {
            let mut views = Vec::new();
            for request in tx.requests(&filter)? {
                if let Some(asset) = tx.asset(request.asset_id)? {
                    views.push(EmployeeAssetView {
                        asset: asset.summary(),
                        request,
                    });
                }
            }
            Ok(views)
        })
    }

    pub fn detail(&self, request_id: RequestId) -> Result<RequestDetail, RequestError> {
        transaction(self.store.as_ref(), |tx| {
            let request = tx
                .request(request_id)?
                .ok_or(RequestError::RequestNotFound(request_id))?;
            Ok(RequestDetail {
                approvals: tx.gates(request_id)?,
                issuance: tx.issuance(request_id)?,
                request,
            })
        })
    }

    /// Audit trail, newest first.
    pub fn audit_log(&self) -> Result<Vec<AuditEvent>, RequestError> {
        transaction(self.store.as_ref(), |tx| Ok(tx.audit_events()?))
    }

    pub fn audit_entry(&self, log_id: AuditLogId) -> Result<AuditEvent, RequestError> {
        transaction(self.store.as_ref(), |tx| {
            tx.audit_event(log_id)?
                .ok_or(RequestError::AuditEntryNotFound(log_id))
        })
    }
}

fn awaiting_team_lead(gates: &[ApprovalGate]) -> bool {
    gates.iter().any(|gate| {
        gate.approval_level == ApprovalLevel::TeamLead
            && gate.approval_status == ApprovalStatus::Pending
    })
}
