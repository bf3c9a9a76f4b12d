use super::common::*;

use crate::inventory::domain::AssetId;
use crate::inventory::InventoryError;
use crate::organization::domain::EmployeeId;
use crate::store::{transaction, RequestRecords, StoreError};
use crate::workflows::requests::audit::{AuditAction, AuditLogId};
use crate::workflows::requests::domain::{
    ApprovalDecision, ApprovalGate, ApprovalLevel, ApprovalStatus, ApprovalStep, Decision,
    NewAssetRequest, RequestFilter, RequestId, RequestStatus, RequestType,
};
use crate::workflows::requests::eligibility::{EligibilityError, MissingPlacement};
use crate::workflows::requests::service::RequestError;

#[test]
fn employee_request_moves_through_both_gates_to_issuance() {
    let desk = desk();
    let asset = desk.asset("SN-LIFE-1", 3);

    let request = desk
        .create(desk.requester, asset, RequestType::Employee)
        .expect("request created");
    assert_eq!(request.request_status, RequestStatus::Pending);

    let gates = desk.gates(request.request_id);
    assert_eq!(gates.len(), 2);
    assert!(gates
        .iter()
        .all(|gate| gate.approval_status == ApprovalStatus::Pending));

    let outcome = desk
        .decide(
            request.request_id,
            desk.team_lead,
            ApprovalLevel::TeamLead,
            Decision::Approved,
        )
        .expect("team lead approves");
    assert_eq!(outcome.request_status, RequestStatus::Pending);
    assert_eq!(desk.quantity(asset), 3);

    let outcome = desk
        .decide(
            request.request_id,
            desk.it_approver,
            ApprovalLevel::It,
            Decision::Approved,
        )
        .expect("IT approves");
    assert_eq!(outcome.request_status, RequestStatus::Issued);
    let issuance = outcome.issuance.expect("issuance recorded");
    assert_eq!(issuance.employee_id, desk.requester);
    assert_eq!(issuance.quantity_issued, 1);
    assert_eq!(desk.quantity(asset), 2);

    let detail = desk.requests.detail(request.request_id).expect("detail");
    assert_eq!(detail.request.request_status, RequestStatus::Issued);
    assert_eq!(detail.approvals.len(), 2);
    assert_eq!(detail.issuance, Some(issuance));

    assert_eq!(
        desk.audit_trail(request.request_id),
        vec![
            (AuditAction::Request, desk.requester),
            (AuditAction::Approve, desk.team_lead),
            (AuditAction::Approve, desk.it_approver),
            (AuditAction::Issue, desk.requester),
        ]
    );
}

#[test]
fn management_request_only_needs_it() {
    let desk = desk();
    let asset = desk.asset("SN-MGMT-1", 1);

    let request = desk
        .create(desk.manager, asset, RequestType::Management)
        .expect("management request created");
    let gates = desk.gates(request.request_id);
    assert_eq!(gates.len(), 1);
    assert_eq!(gates[0].approval_level, ApprovalLevel::It);
    assert_eq!(gates[0].approver_id, desk.it_approver);

    let outcome = desk
        .decide(
            request.request_id,
            desk.it_approver,
            ApprovalLevel::It,
            Decision::Approved,
        )
        .expect("IT approves");
    assert_eq!(outcome.request_status, RequestStatus::Issued);
    assert_eq!(desk.quantity(asset), 0);
}

#[test]
fn rejection_short_circuits_the_request() {
    let desk = desk();
    let asset = desk.asset("SN-REJECT-1", 2);
    let request = desk
        .create(desk.requester, asset, RequestType::Employee)
        .expect("request created");

    let outcome = desk
        .decide(
            request.request_id,
            desk.team_lead,
            ApprovalLevel::TeamLead,
            Decision::Rejected,
        )
        .expect("team lead rejects");
    assert_eq!(outcome.request_status, RequestStatus::Rejected);
    assert_eq!(outcome.issuance, None);

    match desk.decide(
        request.request_id,
        desk.it_approver,
        ApprovalLevel::It,
        Decision::Approved,
    ) {
        Err(RequestError::RequestClosed {
            status: RequestStatus::Rejected,
            ..
        }) => {}
        other => panic!("expected closed request, got {other:?}"),
    }

    let detail = desk.requests.detail(request.request_id).expect("detail");
    assert_eq!(detail.issuance, None);
    assert_eq!(desk.quantity(asset), 2);
    assert_eq!(
        desk.audit_trail(request.request_id),
        vec![
            (AuditAction::Request, desk.requester),
            (AuditAction::Reject, desk.team_lead),
        ]
    );
}

#[test]
fn remarks_are_stored_on_the_gate() {
    let desk = desk();
    let asset = desk.asset("SN-REMARK-1", 1);
    let request = desk
        .create(desk.requester, asset, RequestType::Employee)
        .expect("request created");

    desk.requests
        .record_approval(ApprovalDecision {
            request_id: request.request_id,
            approver_id: desk.team_lead,
            approval_level: ApprovalLevel::TeamLead,
            decision: Decision::Rejected,
            remarks: Some("Use the pooled laptop".to_string()),
        })
        .expect("rejected");

    let gate = desk
        .gates(request.request_id)
        .into_iter()
        .find(|gate| gate.approval_level == ApprovalLevel::TeamLead)
        .expect("team lead gate");
    assert_eq!(gate.approval_status, ApprovalStatus::Rejected);
    assert_eq!(gate.remarks.as_deref(), Some("Use the pooled laptop"));
    assert!(gate.approval_date.is_some());
}

#[test]
fn requester_without_team_writes_nothing() {
    let desk = desk();
    let asset = desk.asset("SN-NOTEAM-1", 5);

    match desk.create(desk.unplaced, asset, RequestType::Employee) {
        Err(RequestError::Eligibility(EligibilityError::IneligibleRequester {
            missing: MissingPlacement::Team,
            ..
        })) => {}
        other => panic!("expected ineligible requester, got {other:?}"),
    }
    assert_eq!(desk.request_count(), 0);
    assert!(desk.requests.audit_log().expect("audit log").is_empty());
}

#[test]
fn unknown_requester_and_asset_are_not_found() {
    let desk = desk();
    let asset = desk.asset("SN-UNKNOWN-1", 1);

    assert!(matches!(
        desk.create(EmployeeId(999), asset, RequestType::Employee),
        Err(RequestError::EmployeeNotFound(_))
    ));
    assert!(matches!(
        desk.create(desk.requester, AssetId(999), RequestType::Employee),
        Err(RequestError::Inventory(InventoryError::AssetNotFound(_)))
    ));
}

#[test]
fn only_one_pending_request_per_requester_and_asset() {
    let desk = desk();
    let asset = desk.asset("SN-DUP-1", 5);
    let first = desk
        .create(desk.requester, asset, RequestType::Employee)
        .expect("first request");

    match desk.create(desk.requester, asset, RequestType::Employee) {
        Err(RequestError::DuplicatePendingRequest { requester_id, .. }) => {
            assert_eq!(requester_id, desk.requester)
        }
        other => panic!("expected duplicate, got {other:?}"),
    }

    desk.decide(
        first.request_id,
        desk.team_lead,
        ApprovalLevel::TeamLead,
        Decision::Rejected,
    )
    .expect("rejected");
    desk.create(desk.requester, asset, RequestType::Employee)
        .expect("a closed request no longer blocks a new one");

    let pending = desk
        .requests
        .list_requests(RequestFilter {
            status: Some(RequestStatus::Pending),
            requester_id: Some(desk.requester),
            asset_id: Some(asset),
        })
        .expect("list");
    assert_eq!(pending.len(), 1);
}

#[test]
fn empty_stock_refuses_new_requests() {
    let desk = desk();
    let asset = desk.asset("SN-EMPTY-1", 0);
    match desk.create(desk.requester, asset, RequestType::Employee) {
        Err(RequestError::OutOfStock(id)) => assert_eq!(id, asset),
        other => panic!("expected out of stock, got {other:?}"),
    }
    assert_eq!(desk.request_count(), 0);
}

#[test]
fn open_requests_hold_the_remaining_units() {
    let desk = desk();
    let asset = desk.asset("SN-HOLD-1", 1);
    desk.create(desk.requester, asset, RequestType::Employee)
        .expect("first request holds the unit");

    assert!(matches!(
        desk.create(desk.teammate, asset, RequestType::Employee),
        Err(RequestError::OutOfStock(_))
    ));
}

#[test]
fn decisions_must_match_an_assigned_gate() {
    let desk = desk();
    let asset = desk.asset("SN-GATE-1", 1);
    let request = desk
        .create(desk.requester, asset, RequestType::Employee)
        .expect("request created");

    match desk.decide(
        request.request_id,
        desk.it_colleague,
        ApprovalLevel::It,
        Decision::Approved,
    ) {
        Err(RequestError::GateNotFound { approver_id, .. }) => {
            assert_eq!(approver_id, desk.it_colleague)
        }
        other => panic!("expected missing gate, got {other:?}"),
    }
    assert!(matches!(
        desk.decide(
            request.request_id,
            desk.team_lead,
            ApprovalLevel::It,
            Decision::Approved,
        ),
        Err(RequestError::GateNotFound { .. })
    ));
    assert!(matches!(
        desk.decide(
            RequestId(404),
            desk.team_lead,
            ApprovalLevel::TeamLead,
            Decision::Approved,
        ),
        Err(RequestError::RequestNotFound(RequestId(404)))
    ));
    assert_eq!(desk.audit_trail(request.request_id).len(), 1);
}

#[test]
fn a_gate_is_decided_once() {
    let desk = desk();
    let asset = desk.asset("SN-ONCE-1", 1);
    let request = desk
        .create(desk.requester, asset, RequestType::Employee)
        .expect("request created");
    desk.decide(
        request.request_id,
        desk.team_lead,
        ApprovalLevel::TeamLead,
        Decision::Approved,
    )
    .expect("first decision");

    match desk.decide(
        request.request_id,
        desk.team_lead,
        ApprovalLevel::TeamLead,
        Decision::Rejected,
    ) {
        Err(RequestError::GateAlreadyDecided {
            level: ApprovalLevel::TeamLead,
            ..
        }) => {}
        other => panic!("expected decided gate, got {other:?}"),
    }
    assert_eq!(
        desk.requests
            .detail(request.request_id)
            .expect("detail")
            .request
            .request_status,
        RequestStatus::Pending
    );
}

#[test]
fn failed_issuance_rolls_back_the_final_approval() {
    let desk = desk();
    let asset = desk.asset("SN-SHORT-1", 1);

    // Two requests on a single unit can only coexist when written around the engine.
    let (first, second) = transaction(desk.store.as_ref(), |tx| {
        let mut insert = |requester| {
            tx.insert_request(NewAssetRequest {
                requester_id: requester,
                asset_id: asset,
                request_type: RequestType::Management,
            })
            .map(|request| request.request_id)
        };
        let first = insert(desk.manager)?;
        let second = insert(desk.teammate)?;
        Ok::<_, StoreError>((first, second))
    })
    .expect("seed requests");
    transaction(desk.store.as_ref(), |tx| {
        for request_id in [first, second] {
            tx.insert_gate(ApprovalGate::pending(
                request_id,
                ApprovalStep {
                    level: ApprovalLevel::It,
                    approver_id: desk.it_approver,
                },
            ))?;
        }
        Ok::<_, StoreError>(())
    })
    .expect("seed gates");

    desk.decide(first, desk.it_approver, ApprovalLevel::It, Decision::Approved)
        .expect("first request issued");
    assert_eq!(desk.quantity(asset), 0);

    match desk.decide(second, desk.it_approver, ApprovalLevel::It, Decision::Approved) {
        Err(RequestError::Inventory(InventoryError::InsufficientStock { available: 0, .. })) => {}
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    let detail = desk.requests.detail(second).expect("detail");
    assert_eq!(detail.request.request_status, RequestStatus::Pending);
    assert_eq!(detail.approvals[0].approval_status, ApprovalStatus::Pending);
    assert_eq!(detail.issuance, None);
    assert!(desk.audit_trail(second).is_empty());
}

#[test]
fn standalone_issue_requires_an_approved_request() {
    let desk = desk();
    let asset = desk.asset("SN-STANDALONE-1", 1);
    let request = desk
        .create(desk.requester, asset, RequestType::Employee)
        .expect("request created");

    match desk.requests.issue(request.request_id) {
        Err(RequestError::RequestNotApproved {
            status: RequestStatus::Pending,
            ..
        }) => {}
        other => panic!("expected not approved, got {other:?}"),
    }
    assert_eq!(desk.quantity(asset), 1);
}

#[test]
fn standalone_issue_completes_an_approved_request() {
    let desk = desk();
    let asset = desk.asset("SN-STANDALONE-2", 2);
    let request_id = transaction(desk.store.as_ref(), |tx| {
        let request = tx.insert_request(NewAssetRequest {
            requester_id: desk.manager,
            asset_id: asset,
            request_type: RequestType::Management,
        })?;
        tx.update_request_status(request.request_id, RequestStatus::Approved)?;
        Ok::<_, StoreError>(request.request_id)
    })
    .expect("seed");

    let issuance = desk.requests.issue(request_id).expect("issued");
    assert_eq!(issuance.employee_id, desk.manager);
    assert_eq!(desk.quantity(asset), 1);
    assert!(matches!(
        desk.requests.issue(request_id),
        Err(RequestError::RequestNotApproved {
            status: RequestStatus::Issued,
            ..
        })
    ));
}

#[test]
fn referenced_assets_cannot_be_removed() {
    let desk = desk();
    let asset = desk.asset("SN-KEEP-1", 1);
    desk.create(desk.requester, asset, RequestType::Employee)
        .expect("request created");
    assert!(matches!(
        desk.inventory.remove(asset),
        Err(InventoryError::AssetReferenced(_))
    ));
}

#[test]
fn employee_assets_are_scoped_and_newest_first() {
    let desk = desk();
    let laptop = desk.asset("SN-MINE-1", 3);
    let monitor = desk.asset("SN-MINE-2", 3);

    let older = desk
        .create(desk.requester, laptop, RequestType::Employee)
        .expect("first");
    let newer = desk
        .create(desk.requester, monitor, RequestType::Employee)
        .expect("second");
    desk.create(desk.teammate, laptop, RequestType::Employee)
        .expect("someone else's");
    desk.decide(
        older.request_id,
        desk.team_lead,
        ApprovalLevel::TeamLead,
        Decision::Rejected,
    )
    .expect("rejected");

    let mine = desk
        .requests
        .employee_assets(desk.requester, None)
        .expect("employee assets");
    assert_eq!(
        mine.iter()
            .map(|view| view.request.request_id)
            .collect::<Vec<_>>(),
        vec![newer.request_id, older.request_id]
    );
    assert_eq!(mine[0].asset.serial_number, "SN-MINE-2");

    let rejected = desk
        .requests
        .employee_assets(desk.requester, Some(RequestStatus::Rejected))
        .expect("rejected assets");
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].request.request_id, older.request_id);
}

#[test]
fn list_requests_joins_requester_and_asset() {
    let desk = desk();
    let asset = desk.asset("SN-LIST-1", 2);
    desk.create(desk.requester, asset, RequestType::Employee)
        .expect("request");
    desk.create(desk.manager, asset, RequestType::Management)
        .expect("request");

    let all = desk
        .requests
        .list_requests(RequestFilter::default())
        .expect("list");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].requester_name, "Milo Hart");
    assert_eq!(all[1].requester_name, "Rui Costa");
    assert!(all.iter().all(|view| view.asset.serial_number == "SN-LIST-1"));

    let by_requester = desk
        .requests
        .list_requests(RequestFilter {
            requester_id: Some(desk.manager),
            ..RequestFilter::default()
        })
        .expect("list");
    assert_eq!(by_requester.len(), 1);
    assert_eq!(by_requester[0].request.request_type, RequestType::Management);
}

#[test]
fn audit_entries_are_listed_newest_first_and_fetchable() {
    let desk = desk();
    let asset = desk.asset("SN-AUDIT-1", 1);
    let request = desk
        .create(desk.manager, asset, RequestType::Management)
        .expect("request");
    desk.decide(
        request.request_id,
        desk.it_approver,
        ApprovalLevel::It,
        Decision::Approved,
    )
    .expect("issued");

    let log = desk.requests.audit_log().expect("audit log");
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].action_type, AuditAction::Issue);
    assert_eq!(log[2].action_type, AuditAction::Request);

    let entry = desk.requests.audit_entry(log[1].log_id).expect("entry");
    assert_eq!(entry.action_type, AuditAction::Approve);
    assert_eq!(entry.performed_by, desk.it_approver);
    assert!(matches!(
        desk.requests.audit_entry(AuditLogId(999)),
        Err(RequestError::AuditEntryNotFound(_))
    ));
}

#[test]
fn gate_rows_are_fixed_at_creation() {
    let desk = desk();
    let asset = desk.asset("SN-FIXED-1", 1);
    let request = desk
        .create(desk.requester, asset, RequestType::Employee)
        .expect("request");
    let before = transaction(desk.store.as_ref(), |tx| tx.gates(request.request_id))
        .expect("gates");
    desk.decide(
        request.request_id,
        desk.team_lead,
        ApprovalLevel::TeamLead,
        Decision::Approved,
    )
    .expect("approved");
    let after = desk.gates(request.request_id);
    assert_eq!(before.len(), after.len());
    assert_eq!(
        before
            .iter()
            .map(|gate| (gate.approval_level, gate.approver_id))
            .collect::<Vec<_>>(),
        after
            .iter()
            .map(|gate| (gate.approval_level, gate.approver_id))
            .collect::<Vec<_>>()
    );
}
