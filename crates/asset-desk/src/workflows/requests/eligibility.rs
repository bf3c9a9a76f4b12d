//! Approval chain resolution.
//!
//! Employee requests need their requester placed on a team and at least one project; they
//! are signed off by the team's active lead and then by IT. Management requests go straight
//! to IT.

use super::domain::{ApprovalLevel, ApprovalStep, RequestType};
use crate::organization::domain::{DepartmentRoles, Employee, EmployeeId};
use crate::store::{OrganizationDirectory, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPlacement {
    Team,
    Project,
}

impl std::fmt::Display for MissingPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingPlacement::Team => f.write_str("team"),
            MissingPlacement::Project => f.write_str("project"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("employee {employee} must be assigned to a {missing}")]
    IneligibleRequester {
        employee: EmployeeId,
        missing: MissingPlacement,
    },
    #[error("no active {level} approver found")]
    NoActiveApprover { level: ApprovalLevel },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves who must approve a request. Reads only; never writes.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityResolver {
    roles: DepartmentRoles,
}

impl EligibilityResolver {
    pub fn new(roles: DepartmentRoles) -> Self {
        Self { roles }
    }

    /// Ordered approval chain for `requester`. An empty chain is never returned.
    pub fn resolve_approval_chain<D: OrganizationDirectory>(
        &self,
        directory: &D,
        requester: EmployeeId,
        request_type: RequestType,
    ) -> Result<Vec<ApprovalStep>, EligibilityError> {
        let mut chain = Vec::with_capacity(2);
        if request_type == RequestType::Employee {
            let team = directory
                .employee_team(requester)?
                .ok_or(EligibilityError::IneligibleRequester {
                    employee: requester,
                    missing: MissingPlacement::Team,
                })?;
            if directory.employee_projects(requester)?.is_empty() {
                return Err(EligibilityError::IneligibleRequester {
                    employee: requester,
                    missing: MissingPlacement::Project,
                });
            }
            let lead = directory
                .active_team_lead(team)?
                .ok_or(EligibilityError::NoActiveApprover {
                    level: ApprovalLevel::TeamLead,
                })?;
            chain.push(ApprovalStep {
                level: ApprovalLevel::TeamLead,
                approver_id: lead,
            });
        }
        chain.push(ApprovalStep {
            level: ApprovalLevel::It,
            approver_id: self.canonical_it_approver(directory)?,
        });
        Ok(chain)
    }

    /// The IT department member with the lowest employee id.
    pub fn canonical_it_approver<D: OrganizationDirectory>(
        &self,
        directory: &D,
    ) -> Result<EmployeeId, EligibilityError> {
        directory
            .department_members(self.roles.it)?
            .first()
            .map(|employee| employee.employee_id)
            .ok_or(EligibilityError::NoActiveApprover {
                level: ApprovalLevel::It,
            })
    }

    pub fn is_it_member(&self, employee: &Employee) -> bool {
        employee.department_id == self.roles.it
    }
}
