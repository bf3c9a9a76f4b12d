use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use numeric_id;

numeric_id!(
    /// Identifier wrapper for employees.
    EmployeeId
);
numeric_id!(DepartmentId);
numeric_id!(TeamId);
numeric_id!(ProjectId);

/// Role tag carried on every employee record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeRole {
    Employee,
    TeamLead,
    Manager,
    #[serde(rename = "ED")]
    Ed,
    #[serde(rename = "CEO")]
    Ceo,
}

impl EmployeeRole {
    pub const fn label(self) -> &'static str {
        match self {
            EmployeeRole::Employee => "Employee",
            EmployeeRole::TeamLead => "TeamLead",
            EmployeeRole::Manager => "Manager",
            EmployeeRole::Ed => "ED",
            EmployeeRole::Ceo => "CEO",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub designation: Option<String>,
    pub department_id: DepartmentId,
    pub role: EmployeeRole,
}

/// Fields required to hire a new employee; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub full_name: String,
    #[serde(default)]
    pub designation: Option<String>,
    pub department_id: DepartmentId,
    #[serde(default = "default_role")]
    pub role: EmployeeRole,
}

fn default_role() -> EmployeeRole {
    EmployeeRole::Employee
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub department_id: DepartmentId,
    pub department_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: TeamId,
    pub team_name: String,
    pub department_id: DepartmentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub project_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    Active,
    Inactive,
}

/// Team lead assignment row. A team has at most one `Active` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLead {
    pub team_id: TeamId,
    pub employee_id: EmployeeId,
    pub status: LeadStatus,
}

/// Departments that carry workflow meaning, resolved by name once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepartmentRoles {
    pub it: DepartmentId,
    pub management: Option<DepartmentId>,
}

/// Summary row used when listing a lead's team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMember {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub designation: Option<String>,
}

impl From<&Employee> for TeamMember {
    fn from(employee: &Employee) -> Self {
        Self {
            employee_id: employee.employee_id,
            full_name: employee.full_name.clone(),
            designation: employee.designation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRoster {
    pub team: Team,
    pub team_lead: TeamMember,
    pub members: Vec<TeamMember>,
}
