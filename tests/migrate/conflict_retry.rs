//! Updates to the primary configuration retry on optimistic-concurrency conflicts only, and
//! give up after the configured number of attempts.

use std::sync::Arc;

use serde_json::json;
use waypoint::adapters::{kinds, MemoryCluster};
use waypoint::catalog::action_registry;
use waypoint::cluster::update_with_retry;
use waypoint::constants::PRESERVED_CONFIG_ANNOTATION;
use waypoint::policy::Policy;
use waypoint::registry::CheckRegistry;
use waypoint::types::{Deadline, ErrorKind, StepStatus};
use waypoint::{exit_code_for_migration, ApiError, MigrateRequest};

use crate::common::{api, serverless_cluster, target};

const CERT_MANAGER: &str = "openshift-cert-manager-operator";

fn run_migration(cluster: &Arc<MemoryCluster>) -> waypoint::MigrationReport {
    let (api, _facts, _audit) = api(CheckRegistry::new(), action_registry().unwrap());
    let t = target(cluster, "2.25.0", "3.0.0").with_skip_confirm(true);
    let req = MigrateRequest {
        ids: vec!["migration.kserve.raw-deployment".into()],
        ..MigrateRequest::default()
    };
    api.migrate(&api.deadline(), &t, &req).unwrap()
}

#[test]
fn succeeds_on_the_third_of_five_attempts() {
    let cluster = serverless_cluster();
    cluster.simulate_install(CERT_MANAGER, "cert-manager-operator.v1.13.0", 1);
    cluster.fail_updates_with_conflict(&kinds::data_science_cluster(), 2);

    let report = run_migration(&cluster);
    assert_eq!(exit_code_for_migration(&report), 0, "{:?}", report.halted);

    let steps = &report.results[0].status.steps;
    let preserve = steps.iter().find(|s| s.name == "preserve-config").unwrap();
    assert_eq!(preserve.status, StepStatus::Completed);
    assert_eq!(preserve.details["attempts"], json!(3));
    let update = steps.iter().find(|s| s.name == "update-config").unwrap();
    assert_eq!(update.details["attempts"], json!(1));

    let dsc = cluster.object(&kinds::data_science_cluster(), None, "default-dsc").unwrap();
    assert_eq!(dsc.str_at("/spec/components/kserve/defaultDeploymentMode"), Some("RawDeployment"));
    assert_eq!(dsc.str_at("/spec/components/kserve/serving/managementState"), Some("Removed"));
    let preserved: serde_json::Value =
        serde_json::from_str(dsc.annotation(PRESERVED_CONFIG_ANNOTATION).unwrap()).unwrap();
    assert_eq!(preserved["managementState"], "Managed");
    assert_eq!(preserved["name"], "knative-serving");
}

#[test]
fn exhausting_the_retry_budget_halts_with_a_normal_error() {
    let cluster = serverless_cluster();
    cluster.simulate_install(CERT_MANAGER, "cert-manager-operator.v1.13.0", 0);
    cluster.fail_updates_with_conflict(&kinds::data_science_cluster(), 100);

    let report = run_migration(&cluster);
    let halt = report.halted.as_ref().unwrap();
    assert!(halt.reason.contains("giving up after 5 conflicting attempts"), "{}", halt.reason);
    assert!(matches!(report.error(), Some(ApiError::MigrationFailed(_))));
    let preserve = report.results[0]
        .status
        .steps
        .iter()
        .find(|s| s.name == "preserve-config")
        .unwrap();
    assert_eq!(preserve.status, StepStatus::Failed);
    // update-config never started
    assert!(report.results[0].status.steps.iter().all(|s| s.name != "update-config"));
    assert_eq!(cluster.update_calls(), 5);
}

#[test]
fn non_conflict_errors_are_not_retried() {
    let cluster = MemoryCluster::new();
    cluster.insert(&kinds::data_science_cluster(), crate::common::dsc("Managed", "Serverless"));
    cluster.forbid(&kinds::data_science_cluster());

    let err = update_with_retry(
        &Deadline::none(),
        &cluster,
        &Policy::fast_preset().retry,
        &kinds::data_science_cluster(),
        None,
        "default-dsc",
        |_| Ok(()),
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
    assert_eq!(cluster.update_calls(), 0);
}
