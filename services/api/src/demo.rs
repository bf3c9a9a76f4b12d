use crate::infra::{bootstrap, seed_sample_office, SampleOffice, Services};
use asset_desk::config::OrganizationConfig;
use asset_desk::error::AppError;
use asset_desk::inventory::domain::{Asset, AssetId};
use asset_desk::organization::domain::EmployeeId;
use asset_desk::store::MemoryStore;
use asset_desk::workflows::requests::{
    ApprovalDecision, ApprovalLevel, AuditEvent, CreateRequest, Decision, PendingApprovalView,
    RequestDetail, RequestId, RequestType,
};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Laptops in stock when the demo starts
    #[arg(long, default_value_t = 1)]
    pub(crate) laptops: u32,
    /// Have IT reject the engineer's request instead of approving it
    #[arg(long)]
    pub(crate) reject: bool,
    /// Print compact JSON instead of pretty-printed output
    #[arg(long)]
    pub(crate) compact: bool,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    generated_at: DateTime<Utc>,
    office: SampleOffice,
    steps: Vec<DemoStep>,
    it_queue_before_team_lead: Vec<PendingApprovalView>,
    it_queue_after_team_lead: Vec<PendingApprovalView>,
    requests: Vec<RequestDetail>,
    inventory: Vec<Asset>,
    audit_log: Vec<AuditEvent>,
}

#[derive(Debug, Serialize)]
struct DemoStep {
    action: String,
    outcome: String,
}

impl DemoStep {
    fn record<T, E: std::fmt::Display>(
        action: impl Into<String>,
        result: Result<T, E>,
        ok: impl FnOnce(&T) -> String,
    ) -> (Self, Option<T>) {
        match result {
            Ok(value) => (
                DemoStep {
                    action: action.into(),
                    outcome: ok(&value),
                },
                Some(value),
            ),
            Err(err) => (
                DemoStep {
                    action: action.into(),
                    outcome: format!("refused: {err}"),
                },
                None,
            ),
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let report = build_report(&args)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.compact {
        serde_json::to_writer(&mut out, &report).map_err(std::io::Error::from)?;
    } else {
        serde_json::to_writer_pretty(&mut out, &report).map_err(std::io::Error::from)?;
    }
    writeln!(out)?;
    Ok(())
}

fn build_report(args: &DemoArgs) -> Result<DemoReport, AppError> {
    let services = bootstrap(Arc::new(MemoryStore::default()), &OrganizationConfig::default())?;
    let office = seed_sample_office(&services, args.laptops)?;
    let mut steps = Vec::new();
    let mut created = Vec::new();

    let (step, engineer_request) = create(
        &services,
        "engineer requests a laptop",
        office.engineer,
        office.laptop,
        RequestType::Employee,
    );
    steps.push(step);

    let (step, manager_request) = create(
        &services,
        "manager requests a laptop",
        office.manager,
        office.laptop,
        RequestType::Management,
    );
    steps.push(step);

    let (step, monitor_request) = create(
        &services,
        "manager requests a monitor",
        office.manager,
        office.monitor,
        RequestType::Management,
    );
    steps.push(step);

    let it_queue_before_team_lead = services.requests.pending_approvals(office.it_approver)?;

    if let Some(request_id) = engineer_request {
        created.push(request_id);
        steps.push(decide(
            &services,
            "team lead approves the laptop",
            request_id,
            office.team_lead,
            ApprovalLevel::TeamLead,
            Decision::Approved,
        ));
    }
    let it_queue_after_team_lead = services.requests.pending_approvals(office.it_approver)?;

    if let Some(request_id) = engineer_request {
        let (action, decision) = if args.reject {
            ("IT rejects the laptop", Decision::Rejected)
        } else {
            ("IT approves the laptop", Decision::Approved)
        };
        steps.push(decide(
            &services,
            action,
            request_id,
            office.it_approver,
            ApprovalLevel::It,
            decision,
        ));
    }
    for request_id in [manager_request, monitor_request].into_iter().flatten() {
        created.push(request_id);
        steps.push(decide(
            &services,
            format!("IT approves request {request_id}"),
            request_id,
            office.it_approver,
            ApprovalLevel::It,
            Decision::Approved,
        ));
    }

    let requests = created
        .into_iter()
        .map(|request_id| services.requests.detail(request_id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DemoReport {
        generated_at: Utc::now(),
        office,
        steps,
        it_queue_before_team_lead,
        it_queue_after_team_lead,
        requests,
        inventory: services.inventory.list()?,
        audit_log: services.requests.audit_log()?,
    })
}

fn create(
    services: &Services,
    action: &str,
    requester_id: EmployeeId,
    asset_id: AssetId,
    request_type: RequestType,
) -> (DemoStep, Option<RequestId>) {
    let result = services.requests.create(CreateRequest {
        requester_id,
        asset_id,
        request_type,
    });
    let (step, request) = DemoStep::record(action, result, |request| {
        format!("request {} is {}", request.request_id, request.request_status)
    });
    (step, request.map(|request| request.request_id))
}

fn decide(
    services: &Services,
    action: impl Into<String>,
    request_id: RequestId,
    approver_id: EmployeeId,
    approval_level: ApprovalLevel,
    decision: Decision,
) -> DemoStep {
    let result = services.requests.record_approval(ApprovalDecision {
        request_id,
        approver_id,
        approval_level,
        decision,
        remarks: None,
    });
    DemoStep::record(action, result, |outcome| outcome.message().to_string()).0
}
