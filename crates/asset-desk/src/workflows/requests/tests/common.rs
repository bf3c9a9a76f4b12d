use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::config::OrganizationConfig;
use crate::inventory::domain::{AssetId, AssetRegistration};
use crate::inventory::InventoryService;
use crate::organization::domain::{
    DepartmentRoles, EmployeeId, EmployeeRole, NewEmployee, ProjectId, TeamId,
};
use crate::organization::{add_department, OrganizationService};
use crate::store::{transaction, InventoryRecords, MemoryStore};
use crate::workflows::requests::audit::AuditAction;
use crate::workflows::requests::domain::{
    ApprovalDecision, ApprovalGate, ApprovalLevel, AssetRequest, CreateRequest, Decision,
    RequestId, RequestType,
};
use crate::workflows::requests::service::{ApprovalOutcome, AssetRequestService, RequestError};

/// A seeded org chart:
///
/// * IT: `it_approver` (lowest id in the department) and `it_colleague`
/// * Engineering team "Platform" led by `team_lead`, with `requester` and `teammate` on it,
///   both assigned to a project
/// * `unplaced` in Engineering with no team, `manager` in Engineering with no team
pub(super) struct Desk {
    pub store: Arc<MemoryStore>,
    pub requests: Arc<AssetRequestService<MemoryStore>>,
    pub inventory: InventoryService<MemoryStore>,
    pub organization: OrganizationService<MemoryStore>,
    pub it_approver: EmployeeId,
    pub it_colleague: EmployeeId,
    pub team_lead: EmployeeId,
    pub requester: EmployeeId,
    pub teammate: EmployeeId,
    pub unplaced: EmployeeId,
    pub manager: EmployeeId,
    pub team: TeamId,
}

pub(super) fn desk() -> Desk {
    desk_with_store(MemoryStore::default())
}

pub(super) fn desk_with_lock_timeout(timeout: Duration) -> Desk {
    desk_with_store(MemoryStore::with_lock_timeout(timeout))
}

fn desk_with_store(store: MemoryStore) -> Desk {
    let store = Arc::new(store);
    let it = add_department(store.as_ref(), "IT")
        .expect("it department")
        .department_id;
    add_department(store.as_ref(), "Management").expect("management department");
    let engineering = add_department(store.as_ref(), "Engineering")
        .expect("engineering department")
        .department_id;
    let roles = DepartmentRoles::resolve(store.as_ref(), &OrganizationConfig::default())
        .expect("department roles");

    let organization = OrganizationService::new(store.clone(), roles);
    let hire = |name: &str, department, role| {
        organization
            .hire(NewEmployee {
                full_name: name.to_string(),
                designation: None,
                department_id: department,
                role,
            })
            .expect("hire")
            .employee_id
    };

    let it_approver = hire("Iris Tanaka", it, EmployeeRole::Employee);
    let requester = hire("Rui Costa", engineering, EmployeeRole::Employee);
    let teammate = hire("Tess Okafor", engineering, EmployeeRole::Employee);
    let team_lead = hire("Lena Vogel", engineering, EmployeeRole::Employee);
    let unplaced = hire("Uma Reyes", engineering, EmployeeRole::Employee);
    let manager = hire("Milo Hart", engineering, EmployeeRole::Manager);
    let it_colleague = hire("Ivan Petrov", it, EmployeeRole::Employee);

    let team = organization
        .add_team("Platform", engineering)
        .expect("team")
        .team_id;
    let project: ProjectId = organization.add_project("Atlas").expect("project").project_id;
    for member in [requester, teammate] {
        organization.assign_team(member, team).expect("assign team");
        organization
            .join_projects(member, &[project])
            .expect("join project");
    }
    organization
        .assign_team_lead(team_lead, team)
        .expect("assign lead");

    Desk {
        requests: Arc::new(AssetRequestService::new(store.clone(), roles)),
        inventory: InventoryService::new(store.clone()),
        organization,
        store,
        it_approver,
        it_colleague,
        team_lead,
        requester,
        teammate,
        unplaced,
        manager,
        team,
    }
}

impl Desk {
    pub fn asset(&self, serial: &str, quantity: i64) -> AssetId {
        self.inventory
            .register(AssetRegistration {
                asset_type: Some("Laptop".to_string()),
                brand: Some("Framework".to_string()),
                model: Some("13".to_string()),
                serial_number: Some(serial.to_string()),
                quantity: Some(quantity),
                ..AssetRegistration::default()
            })
            .expect("asset registered")
            .asset_id
    }

    pub fn create(
        &self,
        requester_id: EmployeeId,
        asset_id: AssetId,
        request_type: RequestType,
    ) -> Result<AssetRequest, RequestError> {
        self.requests.create(CreateRequest {
            requester_id,
            asset_id,
            request_type,
        })
    }

    pub fn decide(
        &self,
        request_id: RequestId,
        approver_id: EmployeeId,
        approval_level: ApprovalLevel,
        decision: Decision,
    ) -> Result<ApprovalOutcome, RequestError> {
        self.requests.record_approval(ApprovalDecision {
            request_id,
            approver_id,
            approval_level,
            decision,
            remarks: None,
        })
    }

    pub fn quantity(&self, asset_id: AssetId) -> u32 {
        transaction(self.store.as_ref(), |tx| tx.asset(asset_id))
            .expect("read asset")
            .expect("asset exists")
            .quantity
    }

    pub fn gates(&self, request_id: RequestId) -> Vec<ApprovalGate> {
        self.requests
            .detail(request_id)
            .expect("request exists")
            .approvals
    }

    /// Audit actions for one request, oldest first.
    pub fn audit_trail(&self, request_id: RequestId) -> Vec<(AuditAction, EmployeeId)> {
        let mut events: Vec<_> = self
            .requests
            .audit_log()
            .expect("audit log")
            .into_iter()
            .filter(|event| event.request_id == request_id)
            .collect();
        events.sort_by_key(|event| event.log_id);
        events
            .into_iter()
            .map(|event| (event.action_type, event.performed_by))
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .list_requests(Default::default())
            .expect("list")
            .len()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("json body")
}
