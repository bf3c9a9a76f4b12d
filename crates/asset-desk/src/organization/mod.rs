//! Organizational records consumed by the request workflow.
//!
//! The workflow only reads placement (department, team, projects, role). The writes here exist
//! so deployments and tests can build an org chart and rotate team leads.

pub mod domain;
pub mod router;

use std::sync::Arc;

use tracing::info;

use crate::config::OrganizationConfig;
use crate::store::{
    transaction, OrganizationDirectory, OrganizationRecords, Store, StoreError,
};
use domain::{
    Department, DepartmentId, DepartmentRoles, Employee, EmployeeId, EmployeeRole, LeadStatus,
    NewEmployee, Project, ProjectId, Team, TeamId, TeamMember, TeamRoster,
};

pub use router::organization_router;

#[derive(Debug, thiserror::Error)]
pub enum OrganizationError {
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("team {0} not found")]
    TeamNotFound(TeamId),
    #[error("{0} department not found")]
    DepartmentNotFound(String),
    #[error("active team lead not found for employee {0}")]
    ActiveLeadNotFound(EmployeeId),
    #[error("invalid organization record: {0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DepartmentRoles {
    /// Resolve the configured IT and management department names to ids.
    pub fn resolve<S: Store>(
        store: &S,
        config: &OrganizationConfig,
    ) -> Result<Self, OrganizationError> {
        transaction(store, |tx| {
            let it = tx
                .department_by_name(&config.it_department)?
                .ok_or_else(|| OrganizationError::DepartmentNotFound(config.it_department.clone()))?;
            let management = tx
                .department_by_name(&config.management_department)?
                .map(|department| department.department_id);
            Ok(DepartmentRoles {
                it: it.department_id,
                management,
            })
        })
    }
}

pub struct OrganizationService<S> {
    store: Arc<S>,
    roles: DepartmentRoles,
}

impl<S: Store> OrganizationService<S> {
    pub fn new(store: Arc<S>, roles: DepartmentRoles) -> Self {
        Self { store, roles }
    }

    pub fn roles(&self) -> DepartmentRoles {
        self.roles
    }

    pub fn add_project(&self, name: &str) -> Result<Project, OrganizationError> {
        let name = non_empty(name, "project_name")?;
        transaction(self.store.as_ref(), |tx| Ok(tx.insert_project(name)?))
    }

    pub fn add_team(
        &self,
        name: &str,
        department: DepartmentId,
    ) -> Result<Team, OrganizationError> {
        let name = non_empty(name, "team_name")?;
        transaction(self.store.as_ref(), |tx| Ok(tx.insert_team(name, department)?))
    }

    pub fn hire(&self, employee: NewEmployee) -> Result<Employee, OrganizationError> {
        non_empty(&employee.full_name, "full_name")?;
        let employee = transaction(self.store.as_ref(), |tx| {
            Ok::<_, OrganizationError>(tx.insert_employee(employee)?)
        })?;
        info!(employee_id = %employee.employee_id, "employee hired");
        Ok(employee)
    }

    /// Place the employee on a team, replacing any previous membership.
    pub fn assign_team(&self, employee: EmployeeId, team: TeamId) -> Result<(), OrganizationError> {
        transaction(self.store.as_ref(), |tx| {
            tx.employee(employee)?
                .ok_or(OrganizationError::EmployeeNotFound(employee))?;
            tx.team(team)?.ok_or(OrganizationError::TeamNotFound(team))?;
            tx.set_employee_team(employee, team)?;
            Ok(())
        })
    }

    pub fn join_projects(
        &self,
        employee: EmployeeId,
        projects: &[ProjectId],
    ) -> Result<(), OrganizationError> {
        if projects.is_empty() {
            return Err(OrganizationError::Invalid(
                "at least one project is required".to_string(),
            ));
        }
        transaction(self.store.as_ref(), |tx| {
            tx.employee(employee)?
                .ok_or(OrganizationError::EmployeeNotFound(employee))?;
            for project in projects {
                tx.add_employee_project(employee, *project)?;
            }
            Ok(())
        })
    }

    /// Make `employee` the active lead of `team`.
    ///
    /// The new lead moves into the management department with the `TeamLead` role and joins the
    /// team if not already a member. Any previous lead is deactivated and returned to the team's
    /// own department as a regular employee.
    pub fn assign_team_lead(
        &self,
        employee: EmployeeId,
        team: TeamId,
    ) -> Result<(), OrganizationError> {
        let management = self
            .roles
            .management
            .ok_or_else(|| OrganizationError::DepartmentNotFound("management".to_string()))?;

        transaction(self.store.as_ref(), |tx| {
            tx.employee(employee)?
                .ok_or(OrganizationError::EmployeeNotFound(employee))?;
            let team_row = tx.team(team)?.ok_or(OrganizationError::TeamNotFound(team))?;
            let previous = tx.active_team_lead(team)?;

            tx.update_placement(employee, management, EmployeeRole::TeamLead)?;
            if tx.employee_team(employee)? != Some(team) {
                tx.set_employee_team(employee, team)?;
            }
            tx.deactivate_team_leads(team)?;
            tx.set_team_lead(team, employee, LeadStatus::Active)?;

            if let Some(previous) = previous.filter(|previous| *previous != employee) {
                tx.update_placement(previous, team_row.department_id, EmployeeRole::Employee)?;
            }
            Ok::<_, OrganizationError>(())
        })?;
        info!(employee_id = %employee, team_id = %team, "team lead assigned");
        Ok(())
    }

    /// The team an active lead runs, with its other members.
    pub fn team_roster(&self, lead: EmployeeId) -> Result<TeamRoster, OrganizationError> {
        transaction(self.store.as_ref(), |tx| {
            let lead_row = tx
                .employee(lead)?
                .ok_or(OrganizationError::ActiveLeadNotFound(lead))?;
            let assignment = tx
                .lead_assignments(lead)?
                .into_iter()
                .find(|assignment| assignment.status == LeadStatus::Active)
                .ok_or(OrganizationError::ActiveLeadNotFound(lead))?;
            let team = tx
                .team(assignment.team_id)?
                .ok_or(OrganizationError::TeamNotFound(assignment.team_id))?;
            let members = tx
                .team_members(team.team_id)?
                .iter()
                .filter(|member| member.employee_id != lead)
                .map(TeamMember::from)
                .collect();
            Ok(TeamRoster {
                team,
                team_lead: TeamMember::from(&lead_row),
                members,
            })
        })
    }

    pub fn department(&self, name: &str) -> Result<Department, OrganizationError> {
        transaction(self.store.as_ref(), |tx| {
            tx.department_by_name(name)?
                .ok_or_else(|| OrganizationError::DepartmentNotFound(name.to_string()))
        })
    }
}

/// Create a department outside of any service; used while bootstrapping the org chart, before
/// department roles can be resolved.
pub fn add_department<S: Store>(store: &S, name: &str) -> Result<Department, OrganizationError> {
    let name = non_empty(name, "department_name")?;
    transaction(store, |tx| Ok(tx.insert_department(name)?))
}

/// Look up a department by name, creating it when the store has none.
pub fn ensure_department<S: Store>(
    store: &S,
    name: &str,
) -> Result<Department, OrganizationError> {
    let name = non_empty(name, "department_name")?;
    transaction(store, |tx| match tx.department_by_name(name)? {
        Some(department) => Ok(department),
        None => Ok(tx.insert_department(name)?),
    })
}

fn non_empty<'a>(value: &'a str, field: &str) -> Result<&'a str, OrganizationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OrganizationError::Invalid(format!("{field} is required")));
    }
    Ok(trimmed)
}
