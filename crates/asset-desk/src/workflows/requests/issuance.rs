use chrono::Utc;
use tracing::info;

use super::audit::{AuditAction, AuditRecorder};
use super::domain::{Issuance, RequestId, RequestStatus};
use super::service::RequestError;
use crate::inventory::{InventoryError, InventoryLedger};
use crate::store::Transaction;

/// Units handed over per issuance.
pub const ISSUE_QUANTITY: u32 = 1;

/// Turns an approved request into an issuance inside the caller's transaction.
///
/// On success the transaction holds the issuance row, the decremented stock, the `Issued`
/// status and the `Issue` audit entry. On error nothing is partially applied once the caller
/// rolls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct IssuanceExecutor {
    ledger: InventoryLedger,
    audit: AuditRecorder,
}

impl IssuanceExecutor {
    pub fn issue<T: Transaction>(
        &self,
        tx: &mut T,
        request_id: RequestId,
    ) -> Result<Issuance, RequestError> {
        let request = tx
            .request(request_id)?
            .ok_or(RequestError::RequestNotFound(request_id))?;
        if request.request_status != RequestStatus::Approved {
            return Err(RequestError::RequestNotApproved {
                request_id,
                status: request.request_status,
            });
        }

        let available = self.ledger.lock_and_read_quantity(tx, request.asset_id)?;
        if available < ISSUE_QUANTITY {
            return Err(InventoryError::InsufficientStock {
                asset_id: request.asset_id,
                available,
                requested: ISSUE_QUANTITY,
            }
            .into());
        }

        let issuance = Issuance {
            request_id,
            asset_id: request.asset_id,
            employee_id: request.requester_id,
            issue_date: Utc::now().date_naive(),
            quantity_issued: ISSUE_QUANTITY,
        };
        tx.insert_issuance(issuance.clone())?;
        let remaining = self
            .ledger
            .decrement(tx, request.asset_id, ISSUE_QUANTITY)?;
        tx.update_request_status(request_id, RequestStatus::Issued)?;
        self.audit
            .record(tx, AuditAction::Issue, request_id, request.requester_id)?;

        info!(
            request_id = %request_id,
            asset_id = %request.asset_id,
            employee_id = %request.requester_id,
            remaining,
            "asset issued"
        );
        Ok(issuance)
    }
}
