use asset_desk::config::OrganizationConfig;
use asset_desk::error::AppError;
use asset_desk::inventory::domain::{AssetId, AssetRegistration};
use asset_desk::inventory::InventoryService;
use asset_desk::organization::domain::{
    DepartmentRoles, EmployeeId, EmployeeRole, NewEmployee, TeamId,
};
use asset_desk::organization::{add_department, ensure_department, OrganizationService};
use asset_desk::store::MemoryStore;
use asset_desk::workflows::requests::AssetRequestService;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Services sharing one store.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) requests: Arc<AssetRequestService<MemoryStore>>,
    pub(crate) inventory: Arc<InventoryService<MemoryStore>>,
    pub(crate) organization: Arc<OrganizationService<MemoryStore>>,
}

/// Make sure the IT and management departments exist, then wire the services.
pub(crate) fn bootstrap(
    store: Arc<MemoryStore>,
    config: &OrganizationConfig,
) -> Result<Services, AppError> {
    ensure_department(store.as_ref(), &config.it_department)?;
    ensure_department(store.as_ref(), &config.management_department)?;
    let roles = DepartmentRoles::resolve(store.as_ref(), config)?;

    Ok(Services {
        requests: Arc::new(AssetRequestService::new(store.clone(), roles)),
        inventory: Arc::new(InventoryService::new(store.clone())),
        organization: Arc::new(OrganizationService::new(store.clone(), roles)),
        store,
    })
}

/// Ids of the sample office created by [`seed_sample_office`].
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct SampleOffice {
    pub(crate) it_approver: EmployeeId,
    pub(crate) team_lead: EmployeeId,
    pub(crate) engineer: EmployeeId,
    pub(crate) manager: EmployeeId,
    pub(crate) team: TeamId,
    pub(crate) laptop: AssetId,
    pub(crate) monitor: AssetId,
}

/// Hire a small engineering team and stock two assets.
pub(crate) fn seed_sample_office(
    services: &Services,
    laptops: u32,
) -> Result<SampleOffice, AppError> {
    let organization = services.organization.as_ref();
    let roles = organization.roles();
    let engineering = add_department(services.store.as_ref(), "Engineering")?.department_id;

    let hire = |name: &str, designation: &str, department, role| {
        organization
            .hire(NewEmployee {
                full_name: name.to_string(),
                designation: Some(designation.to_string()),
                department_id: department,
                role,
            })
            .map(|employee| employee.employee_id)
    };
    let it_approver = hire("Priya Raman", "IT Administrator", roles.it, EmployeeRole::Employee)?;
    let team_lead = hire("Marco Bianchi", "Staff Engineer", engineering, EmployeeRole::Employee)?;
    let engineer = hire("Noor Haddad", "Software Engineer", engineering, EmployeeRole::Employee)?;
    let manager = hire("Elena Sokolova", "Engineering Manager", engineering, EmployeeRole::Manager)?;

    let team = organization.add_team("Payments", engineering)?.team_id;
    let project = organization.add_project("Checkout Revamp")?.project_id;
    organization.assign_team(engineer, team)?;
    organization.join_projects(engineer, &[project])?;
    organization.assign_team_lead(team_lead, team)?;

    let stock = |asset_type: &str, brand: &str, model: &str, serial: &str, quantity: u32| {
        services
            .inventory
            .register(AssetRegistration {
                asset_type: Some(asset_type.to_string()),
                brand: Some(brand.to_string()),
                model: Some(model.to_string()),
                serial_number: Some(serial.to_string()),
                quantity: Some(i64::from(quantity)),
                ..AssetRegistration::default()
            })
            .map(|asset| asset.asset_id)
    };
    let laptop = stock("Laptop", "Lenovo", "ThinkPad X1", "LT-0001", laptops)?;
    let monitor = stock("Monitor", "Dell", "U2723QE", "MN-0001", 4)?;

    info!(
        employees = 4,
        team_id = %team,
        "sample office seeded"
    );

    Ok(SampleOffice {
        it_approver,
        team_lead,
        engineer,
        manager,
        team,
        laptop,
        monitor,
    })
}
