//! Storage seam for the asset desk.
//!
//! Every workflow mutation runs inside a [`Transaction`] obtained from a [`Store`]. The
//! [`transaction`] helper scopes that handle to a closure: it commits when the closure returns
//! `Ok` and rolls back on `Err` or any other exit, so callers never manage begin/commit/rollback
//! by hand.

mod memory;

pub use memory::MemoryStore;

use crate::inventory::domain::{Asset, AssetId, NewAsset};
use crate::organization::domain::{
    Department, DepartmentId, Employee, EmployeeId, EmployeeRole, LeadStatus, NewEmployee,
    Project, ProjectId, Team, TeamId, TeamLead,
};
use crate::workflows::requests::audit::{AuditEvent, AuditLogId, NewAuditEvent};
use crate::workflows::requests::domain::{
    ApprovalGate, ApprovalLevel, ApprovalStatus, AssetRequest, Issuance, NewAssetRequest,
    RequestFilter, RequestId, RequestStatus,
};

/// Failures raised by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("row is referenced by {0}")]
    Referenced(String),
    #[error("foreign key missing: {0}")]
    MissingReference(String),
    #[error("illegal transition for request {request}: {from} -> {to}")]
    IllegalTransition {
        request: RequestId,
        from: RequestStatus,
        to: RequestStatus,
    },
    #[error("timed out waiting for row lock on asset {0}")]
    LockTimeout(AssetId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to organizational records consumed by the workflow.
pub trait OrganizationDirectory {
    fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;
    fn employee_team(&self, id: EmployeeId) -> Result<Option<TeamId>, StoreError>;
    fn employee_projects(&self, id: EmployeeId) -> Result<Vec<ProjectId>, StoreError>;
    fn active_team_lead(&self, team: TeamId) -> Result<Option<EmployeeId>, StoreError>;
    /// Members of a department ordered by ascending employee id.
    fn department_members(&self, department: DepartmentId) -> Result<Vec<Employee>, StoreError>;
    fn department_by_name(&self, name: &str) -> Result<Option<Department>, StoreError>;
    fn team(&self, id: TeamId) -> Result<Option<Team>, StoreError>;
    fn team_members(&self, team: TeamId) -> Result<Vec<Employee>, StoreError>;
    fn lead_assignments(&self, employee: EmployeeId) -> Result<Vec<TeamLead>, StoreError>;
}

/// Writes owned by the organizational module.
pub trait OrganizationRecords {
    fn insert_department(&mut self, name: &str) -> Result<Department, StoreError>;
    fn insert_team(&mut self, name: &str, department: DepartmentId) -> Result<Team, StoreError>;
    fn insert_project(&mut self, name: &str) -> Result<Project, StoreError>;
    fn insert_employee(&mut self, employee: NewEmployee) -> Result<Employee, StoreError>;
    fn update_placement(
        &mut self,
        id: EmployeeId,
        department: DepartmentId,
        role: EmployeeRole,
    ) -> Result<(), StoreError>;
    fn set_employee_team(&mut self, id: EmployeeId, team: TeamId) -> Result<(), StoreError>;
    fn add_employee_project(&mut self, id: EmployeeId, project: ProjectId)
        -> Result<(), StoreError>;
    /// Upsert the (team, employee) lead row.
    fn set_team_lead(
        &mut self,
        team: TeamId,
        employee: EmployeeId,
        status: LeadStatus,
    ) -> Result<(), StoreError>;
    /// Mark every lead row of the team inactive.
    fn deactivate_team_leads(&mut self, team: TeamId) -> Result<(), StoreError>;
}

/// Asset rows. Quantity changes go through [`InventoryRecords::decrement_quantity`] only.
pub trait InventoryRecords {
    fn asset(&self, id: AssetId) -> Result<Option<Asset>, StoreError>;
    /// Read the asset while taking its exclusive row lock until the transaction ends.
    fn lock_asset(&mut self, id: AssetId) -> Result<Option<Asset>, StoreError>;
    fn assets(&self) -> Result<Vec<Asset>, StoreError>;
    fn insert_asset(&mut self, asset: NewAsset) -> Result<Asset, StoreError>;
    fn delete_asset(&mut self, id: AssetId) -> Result<bool, StoreError>;
    /// Overwrite every column except quantity; returns false when the row is missing.
    fn update_asset_details(&mut self, asset: &Asset) -> Result<bool, StoreError>;
    /// Guarded `quantity = quantity - amount WHERE quantity >= amount`; returns affected rows.
    fn decrement_quantity(&mut self, id: AssetId, amount: u32) -> Result<u64, StoreError>;
}

/// Request, gate, and issuance rows owned by the lifecycle engine.
pub trait RequestRecords {
    fn request(&self, id: RequestId) -> Result<Option<AssetRequest>, StoreError>;
    /// Requests matching the filter, newest first.
    fn requests(&self, filter: &RequestFilter) -> Result<Vec<AssetRequest>, StoreError>;
    fn insert_request(&mut self, request: NewAssetRequest) -> Result<AssetRequest, StoreError>;
    fn update_request_status(
        &mut self,
        id: RequestId,
        status: RequestStatus,
    ) -> Result<(), StoreError>;
    fn insert_gate(&mut self, gate: ApprovalGate) -> Result<(), StoreError>;
    fn gates(&self, request: RequestId) -> Result<Vec<ApprovalGate>, StoreError>;
    fn gates_for_approver(
        &self,
        approver: EmployeeId,
        status: ApprovalStatus,
    ) -> Result<Vec<ApprovalGate>, StoreError>;
    /// Overwrite the gate keyed by (request, approver, level); `None` when no such gate exists.
    fn update_gate(
        &mut self,
        request: RequestId,
        approver: EmployeeId,
        level: ApprovalLevel,
        status: ApprovalStatus,
        remarks: Option<String>,
    ) -> Result<Option<ApprovalGate>, StoreError>;
    fn insert_issuance(&mut self, issuance: Issuance) -> Result<(), StoreError>;
    fn issuance(&self, request: RequestId) -> Result<Option<Issuance>, StoreError>;
}

pub trait AuditRecords {
    fn append_audit(&mut self, event: NewAuditEvent) -> Result<AuditEvent, StoreError>;
    /// Events newest first.
    fn audit_events(&self) -> Result<Vec<AuditEvent>, StoreError>;
    fn audit_event(&self, id: AuditLogId) -> Result<Option<AuditEvent>, StoreError>;
}

/// A unit of work. Dropping without [`Transaction::commit`] discards every staged write.
pub trait Transaction:
    OrganizationDirectory + OrganizationRecords + InventoryRecords + RequestRecords + AuditRecords
{
    fn commit(self) -> Result<(), StoreError>;

    fn rollback(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// Handle to the backing database, opened at startup and shared by every service.
pub trait Store: Send + Sync {
    type Tx: Transaction;

    fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// Run `work` inside a transaction: commit on `Ok`, roll back otherwise.
pub fn transaction<S, T, E, F>(store: &S, work: F) -> Result<T, E>
where
    S: Store + ?Sized,
    E: From<StoreError>,
    F: FnOnce(&mut S::Tx) -> Result<T, E>,
{
    let mut tx = store.begin()?;
    match work(&mut tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            tx.rollback();
            Err(err)
        }
    }
}
