//! Requested actions run strictly in order; the first error or incomplete result halts the
//! sequence and later actions are never attempted.

use std::sync::Arc;

use waypoint::registry::CheckRegistry;
use waypoint::rules::Gate;
use waypoint::types::StepStatus;
use waypoint::{exit_code_for_migration, ApiError, MigrateRequest, Phase};

use crate::common::{actions, api, serverless_cluster, target, ActionOutcome, MockAction};

fn request(ids: &[&str]) -> MigrateRequest {
    MigrateRequest {
        ids: ids.iter().map(|s| s.to_string()).collect(),
        ..MigrateRequest::default()
    }
}

#[test]
fn error_in_first_action_never_invokes_the_second() {
    let a = Arc::new(MockAction::new("migration.a", ActionOutcome::Fail("boom".into())));
    let b = Arc::new(MockAction::new("migration.b", ActionOutcome::Succeed));
    let (api, facts, _audit) = api(CheckRegistry::new(), actions(&[a.clone(), b.clone()]));
    let cluster = serverless_cluster();

    let t = target(&cluster, "2.25.0", "3.0.0");
    let report = api
        .migrate(&api.deadline(), &t, &request(&["migration.a", "migration.b"]))
        .unwrap();

    assert_eq!(a.executions(), 1);
    assert_eq!(b.executions(), 0);
    let halt = report.halted.as_ref().unwrap();
    assert_eq!(halt.rule, "migration.a");
    assert_eq!(halt.phase, Phase::Execute);
    assert_eq!(report.not_attempted, vec!["migration.b".to_string()]);
    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert!(!result.status.completed);
    assert!(result.status.error.as_deref().unwrap().contains("boom"));
    // the orchestrator records the failure when the action did not
    assert_eq!(result.status.steps[0].status, StepStatus::Failed);

    assert!(matches!(report.error(), Some(ApiError::MigrationFailed(_))));
    assert_eq!(exit_code_for_migration(&report), 30);

    let (decision, fields) = facts.of("migrate.execute").pop().unwrap();
    assert_eq!(decision, "failure");
    assert_eq!(fields["error_id"], "E_MIGRATION");
    let (_, summary) = facts.of("migrate.summary").pop().unwrap();
    assert_eq!(summary["halted_at"], "migration.a");
    assert_eq!(summary["not_attempted"][0], "migration.b");
}

#[test]
fn failed_step_without_error_also_halts() {
    let a = Arc::new(MockAction::new("migration.a", ActionOutcome::FailStep));
    let b = Arc::new(MockAction::new("migration.b", ActionOutcome::Succeed));
    let (api, _facts, _audit) = api(CheckRegistry::new(), actions(&[a.clone(), b.clone()]));
    let cluster = serverless_cluster();

    let t = target(&cluster, "2.25.0", "3.0.0");
    let report = api
        .migrate(&api.deadline(), &t, &request(&["migration.a", "migration.b"]))
        .unwrap();
    assert_eq!(b.executions(), 0);
    assert!(report.halted.as_ref().unwrap().error.is_none());
    assert_ne!(exit_code_for_migration(&report), 0);
}

#[test]
fn actions_run_in_request_order_not_registration_order() {
    let a = Arc::new(MockAction::new("migration.a", ActionOutcome::Succeed));
    let b = Arc::new(MockAction::new("migration.b", ActionOutcome::Succeed));
    let (api, _facts, _audit) = api(CheckRegistry::new(), actions(&[a.clone(), b.clone()]));
    let cluster = serverless_cluster();

    let t = target(&cluster, "2.25.0", "3.0.0");
    let report = api
        .migrate(&api.deadline(), &t, &request(&["migration.b", "migration.a"]))
        .unwrap();
    let names: Vec<&str> = report.results.iter().map(|r| r.metadata.name.as_str()).collect();
    assert_eq!(names, vec!["migration.b", "migration.a"]);
    assert!(report.halted.is_none());
    assert_eq!(exit_code_for_migration(&report), 0);
}

#[test]
fn unknown_id_fails_the_request_before_anything_runs() {
    let a = Arc::new(MockAction::new("migration.a", ActionOutcome::Succeed));
    let (api, facts, _audit) = api(CheckRegistry::new(), actions(&[a.clone()]));
    let cluster = serverless_cluster();

    let t = target(&cluster, "2.25.0", "3.0.0");
    let err = api
        .migrate(&api.deadline(), &t, &request(&["migration.a", "migration.nope"]))
        .unwrap_err();
    assert_eq!(err, ApiError::UnknownRule("migration.nope".into()));
    assert_eq!(err.exit_code(), 11);
    assert_eq!(a.executions(), 0);
    assert!(facts.events.lock().unwrap().is_empty());
}

#[test]
fn gated_out_action_is_skipped_and_the_sequence_continues() {
    let a = Arc::new(
        MockAction::new("migration.a", ActionOutcome::Succeed).gated(Gate::crossing(4, 0)),
    );
    let b = Arc::new(MockAction::new("migration.b", ActionOutcome::Succeed));
    let (api, _facts, _audit) = api(CheckRegistry::new(), actions(&[a.clone(), b.clone()]));
    let cluster = serverless_cluster();

    let t = target(&cluster, "2.25.0", "3.0.0");
    let report = api
        .migrate(&api.deadline(), &t, &request(&["migration.a", "migration.b"]))
        .unwrap();
    assert_eq!(a.executions(), 0);
    assert_eq!(b.executions(), 1);
    let skipped = &report.results[0];
    assert!(skipped.status.completed);
    assert_eq!(skipped.status.steps[0].name, "version-gate");
    assert_eq!(skipped.status.steps[0].status, StepStatus::Skipped);
    assert_eq!(skipped.status.steps[0].message, "not applicable for 2.25.0 -> 3.0.0");
}
