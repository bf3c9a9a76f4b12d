use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{Decision, RequestId};
use crate::organization::domain::{numeric_id, EmployeeId};
use crate::store::{AuditRecords, StoreError};

numeric_id!(AuditLogId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    Request,
    Approve,
    Reject,
    Issue,
}

impl From<Decision> for AuditAction {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => AuditAction::Approve,
            Decision::Rejected => AuditAction::Reject,
        }
    }
}

/// Append-only record of a committed lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub log_id: AuditLogId,
    pub action_type: AuditAction,
    pub request_id: RequestId,
    pub performed_by: EmployeeId,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAuditEvent {
    pub action_type: AuditAction,
    pub request_id: RequestId,
    pub performed_by: EmployeeId,
}

impl NewAuditEvent {
    pub(crate) fn into_event(self, log_id: AuditLogId, timestamp: DateTime<Utc>) -> AuditEvent {
        AuditEvent {
            log_id,
            action_type: self.action_type,
            request_id: self.request_id,
            performed_by: self.performed_by,
            timestamp,
        }
    }
}

/// Appends audit rows inside the caller's transaction, so an entry commits or rolls back
/// together with the transition it describes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditRecorder;

impl AuditRecorder {
    pub fn record<T: AuditRecords>(
        &self,
        tx: &mut T,
        action_type: AuditAction,
        request_id: RequestId,
        performed_by: EmployeeId,
    ) -> Result<AuditEvent, StoreError> {
        let event = tx.append_audit(NewAuditEvent {
            action_type,
            request_id,
            performed_by,
        })?;
        debug!(
            log_id = %event.log_id,
            action = ?event.action_type,
            request_id = %request_id,
            performed_by = %performed_by,
            "audit event staged"
        );
        Ok(event)
    }
}
