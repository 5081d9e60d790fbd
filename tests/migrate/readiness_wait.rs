//! Installing the operator waits for the installed version to succeed; a subscription that
//! merely exists is not ready.

use std::sync::Arc;

use serde_json::json;
use waypoint::adapters::{kinds, MemoryCluster};
use waypoint::catalog::{action_registry, cert_manager_subscription};
use waypoint::policy::Policy;
use waypoint::registry::CheckRegistry;
use waypoint::types::StepStatus;
use waypoint::{exit_code_for_migration, ApiError, MigrateRequest, MigrationReport};

use crate::common::{api, serverless_cluster, target, TestApi};

fn request() -> MigrateRequest {
    MigrateRequest {
        ids: vec!["migration.kserve.raw-deployment".into()],
        ..MigrateRequest::default()
    }
}

fn run(api: &TestApi, cluster: &Arc<MemoryCluster>, policy: Policy) -> MigrationReport {
    let t = target(cluster, "2.25.0", "3.0.0")
        .with_skip_confirm(true)
        .with_policy(policy);
    api.migrate(&api.deadline(), &t, &request()).unwrap()
}

fn subscription(with_csv: Option<&str>) -> serde_json::Value {
    let mut obj = cert_manager_subscription().to_resource().0;
    if let Some(csv) = with_csv {
        obj["status"] = json!({"installedCSV": csv});
    }
    obj
}

fn csv(name: &str, phase: &str) -> serde_json::Value {
    let sub = cert_manager_subscription();
    json!({
        "kind": "ClusterServiceVersion",
        "metadata": {"name": name, "namespace": sub.namespace},
        "status": {"phase": phase, "message": "install strategy failed"},
    })
}

#[test]
fn waits_until_the_installed_version_succeeds() {
    let (api, _facts, _audit) = api(CheckRegistry::new(), action_registry().unwrap());
    let cluster = serverless_cluster();
    cluster.simulate_install(&cert_manager_subscription().package, "cert-manager.v1.13.0", 3);

    let report = run(&api, &cluster, Policy::fast_preset());
    assert_eq!(exit_code_for_migration(&report), 0, "{:?}", report.halted);
    let install = &report.results[0].status.steps[0];
    assert_eq!(install.name, "install-operator");
    assert_eq!(install.status, StepStatus::Completed);
    let names: Vec<&str> = install.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["create", "wait-ready"]);
    assert_eq!(install.children[1].details["installedCSV"], "cert-manager.v1.13.0");
    assert_eq!(cluster.create_calls(), 1);
}

#[test]
fn existing_subscription_still_waits_for_readiness() {
    let (api, _facts, _audit) = api(CheckRegistry::new(), action_registry().unwrap());
    let cluster = serverless_cluster();
    let sub_kind = kinds::subscription();
    cluster.insert(&sub_kind, subscription(None));
    // the install is reported only after a few polls
    cluster.stage_after_reads(&sub_kind, subscription(Some("cert-manager.v1.13.0")), 2);
    cluster.insert(&kinds::cluster_service_version(), csv("cert-manager.v1.13.0", "Succeeded"));

    let report = run(&api, &cluster, Policy::fast_preset());
    assert_eq!(exit_code_for_migration(&report), 0, "{:?}", report.halted);
    let install = &report.results[0].status.steps[0];
    assert_eq!(install.children.len(), 1);
    assert_eq!(install.children[0].name, "wait-ready");
    assert_eq!(cluster.create_calls(), 0);
}

#[test]
fn readiness_timeout_is_a_timeout_class_error() {
    let (api, _facts, _audit) = api(CheckRegistry::new(), action_registry().unwrap());
    let cluster = serverless_cluster();
    let package = cert_manager_subscription().package;
    cluster.simulate_install(&package, "cert-manager.v1.13.0", u32::MAX);
    let mut policy = Policy::fast_preset();
    policy.readiness.timeout_ms = 50;

    let report = run(&api, &cluster, policy);
    let err = report.error().unwrap();
    assert!(matches!(err, ApiError::Timeout(_)), "{err}");
    assert_eq!(exit_code_for_migration(&report), 50);
    let install = &report.results[0].status.steps[0];
    assert_eq!(install.status, StepStatus::Failed);
    assert_eq!(install.children[1].status, StepStatus::Failed);
    // nothing after the install ran
    assert_eq!(report.results[0].status.steps.len(), 1);
    assert_eq!(cluster.update_calls(), 0);
}

#[test]
fn failed_install_aborts_the_wait() {
    let (api, _facts, _audit) = api(CheckRegistry::new(), action_registry().unwrap());
    let cluster = serverless_cluster();
    cluster.insert(&kinds::subscription(), subscription(Some("cert-manager.v1.13.0")));
    cluster.insert(&kinds::cluster_service_version(), csv("cert-manager.v1.13.0", "Failed"));
    let mut policy = Policy::fast_preset();
    policy.readiness.timeout_ms = 60_000;

    let started = std::time::Instant::now();
    let report = run(&api, &cluster, policy);
    assert!(started.elapsed() < std::time::Duration::from_secs(30));
    let halt = report.halted.as_ref().unwrap();
    assert!(halt.reason.contains("failed to install"), "{}", halt.reason);
    assert!(matches!(report.error(), Some(ApiError::MigrationFailed(_))));
}
