use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock, RwLockReadGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;

use super::{
    AuditRecords, InventoryRecords, OrganizationDirectory, OrganizationRecords, RequestRecords,
    Store, StoreError, Transaction,
};
use crate::inventory::domain::{Asset, AssetId, NewAsset};
use crate::organization::domain::{
    Department, DepartmentId, Employee, EmployeeId, EmployeeRole, LeadStatus, NewEmployee,
    Project, ProjectId, Team, TeamId, TeamLead,
};
use crate::workflows::requests::audit::{AuditEvent, AuditLogId, NewAuditEvent};
use crate::workflows::requests::domain::{
    newest_first, ApprovalGate, ApprovalLevel, ApprovalStatus, AssetRequest, Issuance,
    NewAssetRequest, RequestFilter, RequestId, RequestStatus,
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type GateKey = (RequestId, ApprovalLevel, EmployeeId);

#[derive(Debug, Default)]
struct Tables {
    departments: BTreeMap<DepartmentId, Department>,
    teams: BTreeMap<TeamId, Team>,
    projects: BTreeMap<ProjectId, Project>,
    employees: BTreeMap<EmployeeId, Employee>,
    employee_teams: BTreeMap<EmployeeId, (EmployeeId, TeamId)>,
    employee_projects: BTreeMap<(EmployeeId, ProjectId), (EmployeeId, ProjectId)>,
    team_leads: BTreeMap<(TeamId, EmployeeId), TeamLead>,
    assets: BTreeMap<AssetId, Asset>,
    requests: BTreeMap<RequestId, AssetRequest>,
    gates: BTreeMap<GateKey, ApprovalGate>,
    issuances: BTreeMap<RequestId, Issuance>,
    audit: BTreeMap<AuditLogId, AuditEvent>,
}

/// Writes staged by one transaction. `None` marks a deleted row.
#[derive(Debug)]
struct Overlay<K, V> {
    rows: BTreeMap<K, Option<V>>,
}

impl<K, V> Default for Overlay<K, V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, V: Clone> Overlay<K, V> {
    fn get(&self, base: &BTreeMap<K, V>, key: &K) -> Option<V> {
        match self.rows.get(key) {
            Some(staged) => staged.clone(),
            None => base.get(key).cloned(),
        }
    }

    fn scan(&self, base: &BTreeMap<K, V>, mut keep: impl FnMut(&V) -> bool) -> Vec<V> {
        let mut rows: BTreeMap<K, V> = base
            .iter()
            .filter(|(key, value)| !self.rows.contains_key(*key) && keep(value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (key, staged) in &self.rows {
            if let Some(value) = staged {
                if keep(value) {
                    rows.insert(key.clone(), value.clone());
                }
            }
        }
        rows.into_values().collect()
    }

    fn put(&mut self, key: K, value: V) {
        self.rows.insert(key, Some(value));
    }

    fn remove(&mut self, key: K) {
        self.rows.insert(key, None);
    }

    fn apply(self, base: &mut BTreeMap<K, V>) {
        for (key, staged) in self.rows {
            match staged {
                Some(value) => {
                    base.insert(key, value);
                }
                None => {
                    base.remove(&key);
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct Staged {
    departments: Overlay<DepartmentId, Department>,
    teams: Overlay<TeamId, Team>,
    projects: Overlay<ProjectId, Project>,
    employees: Overlay<EmployeeId, Employee>,
    employee_teams: Overlay<EmployeeId, (EmployeeId, TeamId)>,
    employee_projects: Overlay<(EmployeeId, ProjectId), (EmployeeId, ProjectId)>,
    team_leads: Overlay<(TeamId, EmployeeId), TeamLead>,
    assets: Overlay<AssetId, Asset>,
    requests: Overlay<RequestId, AssetRequest>,
    gates: Overlay<GateKey, ApprovalGate>,
    issuances: Overlay<RequestId, Issuance>,
    audit: Overlay<AuditLogId, AuditEvent>,
}

impl Staged {
    fn apply(self, tables: &mut Tables) {
        self.departments.apply(&mut tables.departments);
        self.teams.apply(&mut tables.teams);
        self.projects.apply(&mut tables.projects);
        self.employees.apply(&mut tables.employees);
        self.employee_teams.apply(&mut tables.employee_teams);
        self.employee_projects.apply(&mut tables.employee_projects);
        self.team_leads.apply(&mut tables.team_leads);
        self.assets.apply(&mut tables.assets);
        self.requests.apply(&mut tables.requests);
        self.gates.apply(&mut tables.gates);
        self.issuances.apply(&mut tables.issuances);
        self.audit.apply(&mut tables.audit);
    }
}

#[derive(Debug)]
struct Sequence(AtomicU64);

impl Default for Sequence {
    fn default() -> Self {
        Self(AtomicU64::new(1))
    }
}

impl Sequence {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
struct Sequences {
    department: Sequence,
    team: Sequence,
    project: Sequence,
    employee: Sequence,
    asset: Sequence,
    request: Sequence,
    audit: Sequence,
}

/// Exclusive asset row locks held until the owning transaction ends.
#[derive(Debug, Default)]
struct RowLocks {
    held: Mutex<HashSet<AssetId>>,
    released: Condvar,
}

impl RowLocks {
    fn acquire(&self, id: AssetId, timeout: Duration) -> Result<(), StoreError> {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock().map_err(|_| poisoned("row locks"))?;
        while held.contains(&id) {
            let now = Instant::now();
            if now >= deadline {
                return Err(StoreError::LockTimeout(id));
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .map_err(|_| poisoned("row locks"))?;
            held = guard;
        }
        held.insert(id);
        Ok(())
    }

    fn release(&self, ids: &BTreeSet<AssetId>) {
        if ids.is_empty() {
            return;
        }
        if let Ok(mut held) = self.held.lock() {
            for id in ids {
                held.remove(id);
            }
        }
        self.released.notify_all();
    }
}

#[derive(Debug)]
struct Inner {
    tables: RwLock<Tables>,
    locks: RowLocks,
    sequences: Sequences,
    lock_timeout: Duration,
}

/// In-process store with per-asset row locks and transaction-private staged writes.
///
/// Reads inside a transaction see committed rows overlaid with the transaction's own writes.
/// Commits apply atomically under the table write lock, after which the row locks are released.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }
}

impl MemoryStore {
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: RwLock::new(Tables::default()),
                locks: RowLocks::default(),
                sequences: Sequences::default(),
                lock_timeout,
            }),
        }
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTransaction;

    fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            staged: Staged::default(),
            locked: BTreeSet::new(),
        })
    }
}

pub struct MemoryTransaction {
    inner: Arc<Inner>,
    staged: Staged,
    locked: BTreeSet<AssetId>,
}

fn poisoned(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{what} poisoned"))
}

impl MemoryTransaction {
    fn tables(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner.tables.read().map_err(|_| poisoned("tables"))
    }

    fn require_employee(&self, id: EmployeeId) -> Result<(), StoreError> {
        match self.employee(id)? {
            Some(_) => Ok(()),
            None => Err(StoreError::MissingReference(format!("employee {id}"))),
        }
    }

    fn require_team(&self, id: TeamId) -> Result<(), StoreError> {
        match self.team(id)? {
            Some(_) => Ok(()),
            None => Err(StoreError::MissingReference(format!("team {id}"))),
        }
    }

    fn require_department(&self, id: DepartmentId) -> Result<(), StoreError> {
        let tables = self.tables()?;
        match self.staged.departments.get(&tables.departments, &id) {
            Some(_) => Ok(()),
            None => Err(StoreError::MissingReference(format!("department {id}"))),
        }
    }
}

/// Staged asset rows whose serial number collides with a committed row.
fn serial_conflict(staged: &Staged, tables: &Tables) -> Option<String> {
    staged.assets.rows.iter().find_map(|(id, row)| {
        let asset = row.as_ref()?;
        tables
            .assets
            .values()
            .find(|existing| {
                existing.asset_id != *id && existing.serial_number == asset.serial_number
            })
            .map(|_| format!("serial number {} already exists", asset.serial_number))
    })
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        self.inner.locks.release(&self.locked);
    }
}

impl Transaction for MemoryTransaction {
    fn commit(mut self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        let mut tables = self.inner.tables.write().map_err(|_| poisoned("tables"))?;
        if let Some(conflict) = serial_conflict(&staged, &tables) {
            return Err(StoreError::Conflict(conflict));
        }
        staged.apply(&mut tables);
        drop(tables);
        debug!(locks = self.locked.len(), "transaction committed");
        Ok(())
    }
}

impl OrganizationDirectory for MemoryTransaction {
    fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let tables = self.tables()?;
        Ok(self.staged.employees.get(&tables.employees, &id))
    }

    fn employee_team(&self, id: EmployeeId) -> Result<Option<TeamId>, StoreError> {
        let tables = self.tables()?;
        Ok(self
            .staged
            .employee_teams
            .get(&tables.employee_teams, &id)
            .map(|(_, team)| team))
    }

    fn employee_projects(&self, id: EmployeeId) -> Result<Vec<ProjectId>, StoreError> {
        let tables = self.tables()?;
        Ok(self
            .staged
            .employee_projects
            .scan(&tables.employee_projects, |(employee, _)| *employee == id)
            .into_iter()
            .map(|(_, project)| project)
            .collect())
    }

    fn active_team_lead(&self, team: TeamId) -> Result<Option<EmployeeId>, StoreError> {
        let tables = self.tables()?;
        Ok(self
            .staged
            .team_leads
            .scan(&tables.team_leads, |lead| {
                lead.team_id == team && lead.status == LeadStatus::Active
            })
            .into_iter()
            .map(|lead| lead.employee_id)
            .next())
    }

    fn department_members(&self, department: DepartmentId) -> Result<Vec<Employee>, StoreError> {
        let tables = self.tables()?;
        Ok(self
            .staged
            .employees
            .scan(&tables.employees, |employee| {
                employee.department_id == department
            }))
    }

    fn department_by_name(&self, name: &str) -> Result<Option<Department>, StoreError> {
        let tables = self.tables()?;
        Ok(self
            .staged
            .departments
            .scan(&tables.departments, |department| {
                department.department_name.eq_ignore_ascii_case(name)
            })
            .into_iter()
            .next())
    }

    fn team(&self, id: TeamId) -> Result<Option<Team>, StoreError> {
        let tables = self.tables()?;
        Ok(self.staged.teams.get(&tables.teams, &id))
    }

    fn team_members(&self, team: TeamId) -> Result<Vec<Employee>, StoreError> {
        let members = {
            let tables = self.tables()?;
            self.staged
                .employee_teams
                .scan(&tables.employee_teams, |(_, member_of)| *member_of == team)
        };
        let mut employees = Vec::with_capacity(members.len());
        for (id, _) in members {
            if let Some(employee) = self.employee(id)? {
                employees.push(employee);
            }
        }
        Ok(employees)
    }

    fn lead_assignments(&self, employee: EmployeeId) -> Result<Vec<TeamLead>, StoreError> {
        let tables = self.tables()?;
        Ok(self
            .staged
            .team_leads
            .scan(&tables.team_leads, |lead| lead.employee_id == employee))
    }
}

impl OrganizationRecords for MemoryTransaction {
    fn insert_department(&mut self, name: &str) -> Result<Department, StoreError> {
        if self.department_by_name(name)?.is_some() {
            return Err(StoreError::Conflict(format!("department {name} already exists")));
        }
        let department = Department {
            department_id: DepartmentId(self.inner.sequences.department.next()),
            department_name: name.to_string(),
        };
        self.staged
            .departments
            .put(department.department_id, department.clone());
        Ok(department)
    }

    fn insert_team(&mut self, name: &str, department: DepartmentId) -> Result<Team, StoreError> {
        self.require_department(department)?;
        let team = Team {
            team_id: TeamId(self.inner.sequences.team.next()),
            team_name: name.to_string(),
            department_id: department,
        };
        self.staged.teams.put(team.team_id, team.clone());
        Ok(team)
    }

    fn insert_project(&mut self, name: &str) -> Result<Project, StoreError> {
        let project = Project {
            project_id: ProjectId(self.inner.sequences.project.next()),
            project_name: name.to_string(),
        };
        self.staged.projects.put(project.project_id, project.clone());
        Ok(project)
    }

    fn insert_employee(&mut self, employee: NewEmployee) -> Result<Employee, StoreError> {
        self.require_department(employee.department_id)?;
        let employee = Employee {
            employee_id: EmployeeId(self.inner.sequences.employee.next()),
            full_name: employee.full_name,
            designation: employee.designation,
            department_id: employee.department_id,
            role: employee.role,
        };
        self.staged
            .employees
            .put(employee.employee_id, employee.clone());
        Ok(employee)
    }

    fn update_placement(
        &mut self,
        id: EmployeeId,
        department: DepartmentId,
        role: EmployeeRole,
    ) -> Result<(), StoreError> {
        self.require_department(department)?;
        let mut employee = self
            .employee(id)?
            .ok_or_else(|| StoreError::MissingReference(format!("employee {id}")))?;
        employee.department_id = department;
        employee.role = role;
        self.staged.employees.put(id, employee);
        Ok(())
    }

    fn set_employee_team(&mut self, id: EmployeeId, team: TeamId) -> Result<(), StoreError> {
        self.require_employee(id)?;
        self.require_team(team)?;
        self.staged.employee_teams.put(id, (id, team));
        Ok(())
    }

    fn add_employee_project(
        &mut self,
        id: EmployeeId,
        project: ProjectId,
    ) -> Result<(), StoreError> {
        self.require_employee(id)?;
        let exists = {
            let tables = self.tables()?;
            self.staged.projects.get(&tables.projects, &project).is_some()
        };
        if !exists {
            return Err(StoreError::MissingReference(format!("project {project}")));
        }
        self.staged.employee_projects.put((id, project), (id, project));
        Ok(())
    }

    fn set_team_lead(
        &mut self,
        team: TeamId,
        employee: EmployeeId,
        status: LeadStatus,
    ) -> Result<(), StoreError> {
        self.require_employee(employee)?;
        self.require_team(team)?;
        self.staged.team_leads.put(
            (team, employee),
            TeamLead {
                team_id: team,
                employee_id: employee,
                status,
            },
        );
        Ok(())
    }

    fn deactivate_team_leads(&mut self, team: TeamId) -> Result<(), StoreError> {
        let leads = {
            let tables = self.tables()?;
            self.staged
                .team_leads
                .scan(&tables.team_leads, |lead| lead.team_id == team)
        };
        for mut lead in leads {
            lead.status = LeadStatus::Inactive;
            self.staged.team_leads.put((team, lead.employee_id), lead);
        }
        Ok(())
    }
}

impl InventoryRecords for MemoryTransaction {
    fn asset(&self, id: AssetId) -> Result<Option<Asset>, StoreError> {
        let tables = self.tables()?;
        Ok(self.staged.assets.get(&tables.assets, &id))
    }

    fn lock_asset(&mut self, id: AssetId) -> Result<Option<Asset>, StoreError> {
        if !self.locked.contains(&id) {
            self.inner.locks.acquire(id, self.inner.lock_timeout)?;
            self.locked.insert(id);
            debug!(asset_id = %id, "asset row locked");
        }
        self.asset(id)
    }

    fn assets(&self) -> Result<Vec<Asset>, StoreError> {
        let tables = self.tables()?;
        Ok(self.staged.assets.scan(&tables.assets, |_| true))
    }

    fn insert_asset(&mut self, asset: NewAsset) -> Result<Asset, StoreError> {
        let duplicate = {
            let tables = self.tables()?;
            !self
                .staged
                .assets
                .scan(&tables.assets, |existing| {
                    existing.serial_number == asset.serial_number
                })
                .is_empty()
        };
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "serial number {} already exists",
                asset.serial_number
            )));
        }
        let asset = asset.into_asset(AssetId(self.inner.sequences.asset.next()));
        self.staged.assets.put(asset.asset_id, asset.clone());
        Ok(asset)
    }

    fn delete_asset(&mut self, id: AssetId) -> Result<bool, StoreError> {
        if self.lock_asset(id)?.is_none() {
            return Ok(false);
        }
        let referenced = {
            let tables = self.tables()?;
            !self
                .staged
                .requests
                .scan(&tables.requests, |request| request.asset_id == id)
                .is_empty()
                || !self
                    .staged
                    .issuances
                    .scan(&tables.issuances, |issuance| issuance.asset_id == id)
                    .is_empty()
        };
        if referenced {
            return Err(StoreError::Referenced(format!("asset {id}")));
        }
        self.staged.assets.remove(id);
        Ok(true)
    }

    fn update_asset_details(&mut self, asset: &Asset) -> Result<bool, StoreError> {
        let id = asset.asset_id;
        let Some(current) = self.lock_asset(id)? else {
            return Ok(false);
        };
        let duplicate = {
            let tables = self.tables()?;
            !self
                .staged
                .assets
                .scan(&tables.assets, |existing| {
                    existing.asset_id != id && existing.serial_number == asset.serial_number
                })
                .is_empty()
        };
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "serial number {} already exists",
                asset.serial_number
            )));
        }
        self.staged.assets.put(
            id,
            Asset {
                quantity: current.quantity,
                ..asset.clone()
            },
        );
        Ok(true)
    }

    fn decrement_quantity(&mut self, id: AssetId, amount: u32) -> Result<u64, StoreError> {
        let Some(mut asset) = self.asset(id)? else {
            return Ok(0);
        };
        match asset.quantity.checked_sub(amount) {
            Some(remaining) => {
                asset.quantity = remaining;
                self.staged.assets.put(id, asset);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

impl RequestRecords for MemoryTransaction {
    fn request(&self, id: RequestId) -> Result<Option<AssetRequest>, StoreError> {
        let tables = self.tables()?;
        Ok(self.staged.requests.get(&tables.requests, &id))
    }

    fn requests(&self, filter: &RequestFilter) -> Result<Vec<AssetRequest>, StoreError> {
        let tables = self.tables()?;
        let mut requests = self
            .staged
            .requests
            .scan(&tables.requests, |request| filter.matches(request));
        requests.sort_by(newest_first);
        Ok(requests)
    }

    fn insert_request(&mut self, request: NewAssetRequest) -> Result<AssetRequest, StoreError> {
        self.require_employee(request.requester_id)?;
        if self.asset(request.asset_id)?.is_none() {
            return Err(StoreError::MissingReference(format!(
                "asset {}",
                request.asset_id
            )));
        }
        let request = AssetRequest {
            request_id: RequestId(self.inner.sequences.request.next()),
            requester_id: request.requester_id,
            asset_id: request.asset_id,
            request_type: request.request_type,
            request_status: RequestStatus::Pending,
            request_date: Utc::now(),
        };
        self.staged.requests.put(request.request_id, request.clone());
        Ok(request)
    }

    fn update_request_status(
        &mut self,
        id: RequestId,
        status: RequestStatus,
    ) -> Result<(), StoreError> {
        let mut request = self
            .request(id)?
            .ok_or_else(|| StoreError::MissingReference(format!("request {id}")))?;
        if !request.request_status.can_advance_to(status) {
            return Err(StoreError::IllegalTransition {
                request: id,
                from: request.request_status,
                to: status,
            });
        }
        request.request_status = status;
        self.staged.requests.put(id, request);
        Ok(())
    }

    fn insert_gate(&mut self, gate: ApprovalGate) -> Result<(), StoreError> {
        if self.request(gate.request_id)?.is_none() {
            return Err(StoreError::MissingReference(format!(
                "request {}",
                gate.request_id
            )));
        }
        self.require_employee(gate.approver_id)?;
        let key = (gate.request_id, gate.approval_level, gate.approver_id);
        let exists = {
            let tables = self.tables()?;
            self.staged.gates.get(&tables.gates, &key).is_some()
        };
        if exists {
            return Err(StoreError::Conflict(format!(
                "{} gate for request {} already exists",
                gate.approval_level, gate.request_id
            )));
        }
        self.staged.gates.put(key, gate);
        Ok(())
    }

    fn gates(&self, request: RequestId) -> Result<Vec<ApprovalGate>, StoreError> {
        let tables = self.tables()?;
        Ok(self
            .staged
            .gates
            .scan(&tables.gates, |gate| gate.request_id == request))
    }

    fn gates_for_approver(
        &self,
        approver: EmployeeId,
        status: ApprovalStatus,
    ) -> Result<Vec<ApprovalGate>, StoreError> {
        let tables = self.tables()?;
        Ok(self.staged.gates.scan(&tables.gates, |gate| {
            gate.approver_id == approver && gate.approval_status == status
        }))
    }

    fn update_gate(
        &mut self,
        request: RequestId,
        approver: EmployeeId,
        level: ApprovalLevel,
        status: ApprovalStatus,
        remarks: Option<String>,
    ) -> Result<Option<ApprovalGate>, StoreError> {
        let key = (request, level, approver);
        let current = {
            let tables = self.tables()?;
            self.staged.gates.get(&tables.gates, &key)
        };
        let Some(mut gate) = current else {
            return Ok(None);
        };
        gate.approval_status = status;
        gate.remarks = remarks;
        gate.approval_date = Some(Utc::now());
        self.staged.gates.put(key, gate.clone());
        Ok(Some(gate))
    }

    fn insert_issuance(&mut self, issuance: Issuance) -> Result<(), StoreError> {
        if self.issuance(issuance.request_id)?.is_some() {
            return Err(StoreError::Conflict(format!(
                "request {} already issued",
                issuance.request_id
            )));
        }
        self.staged.issuances.put(issuance.request_id, issuance);
        Ok(())
    }

    fn issuance(&self, request: RequestId) -> Result<Option<Issuance>, StoreError> {
        let tables = self.tables()?;
        Ok(self.staged.issuances.get(&tables.issuances, &request))
    }
}

impl AuditRecords for MemoryTransaction {
    fn append_audit(&mut self, event: NewAuditEvent) -> Result<AuditEvent, StoreError> {
        let event = event.into_event(
            AuditLogId(self.inner.sequences.audit.next()),
            Utc::now(),
        );
        self.staged.audit.put(event.log_id, event.clone());
        Ok(event)
    }

    fn audit_events(&self) -> Result<Vec<AuditEvent>, StoreError> {
        let tables = self.tables()?;
        let mut events = self.staged.audit.scan(&tables.audit, |_| true);
        events.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.log_id.cmp(&a.log_id))
        });
        Ok(events)
    }

    fn audit_event(&self, id: AuditLogId) -> Result<Option<AuditEvent>, StoreError> {
        let tables = self.tables()?;
        Ok(self.staged.audit.get(&tables.audit, &id))
    }
}
