//! Workload checks run once per discovered instance; a kind that cannot be listed is skipped
//! with a warning while other kinds continue.

use std::sync::Arc;

use log::Level;
use serde_json::json;
use waypoint::adapters::{kinds, MemoryCluster, ResourceKind};
use waypoint::registry::ActionRegistry;
use waypoint::types::{CheckGroup, Error};
use waypoint::LintRequest;

use crate::common::{api, checks, isvc, target, CheckOutcome, MockCheck};

fn notebooks() -> ResourceKind {
    // not a fixture kind; only reachable through insert()
    ResourceKind::new("kubeflow.org", "v1", "Notebook", true)
}

#[test]
fn runs_once_per_instance_in_discovery_order() {
    let c = MemoryCluster::new();
    c.insert(&kinds::inference_service(), isvc("a", "m1", None));
    c.insert(&kinds::inference_service(), isvc("b", "m2", None));
    c.insert(&kinds::inference_service(), isvc("a", "m3", None));
    let cluster = Arc::new(c);

    let per_isvc = Arc::new(
        MockCheck::new("workloads.isvc.mode", CheckGroup::Workload, CheckOutcome::Blocking)
            .per_instance(kinds::inference_service()),
    );
    let (api, _facts, _audit) = api(checks(&[per_isvc.clone()]), ActionRegistry::new());

    let report = api
        .lint(&api.deadline(), &target(&cluster, "2.25.0", "3.0.0"), &LintRequest::default())
        .unwrap();
    assert_eq!(report.checks.len(), 3);
    assert_eq!(per_isvc.calls(), 3);
    // store order is (kind, namespace, name)
    assert_eq!(*per_isvc.seen.lock().unwrap(), vec!["m1", "m3", "m2"]);
    assert_eq!(report.summary.blocking, 3);
}

#[test]
fn listing_failure_skips_only_that_kind() {
    let c = MemoryCluster::new();
    c.insert(&kinds::inference_service(), isvc("a", "m1", None));
    c.insert(
        &notebooks(),
        json!({"kind": "Notebook", "metadata": {"name": "nb1", "namespace": "a"}}),
    );
    c.fail_list(&kinds::inference_service(), Error::forbidden("cannot list inferenceservices"));
    let cluster = Arc::new(c);

    let per_isvc = Arc::new(
        MockCheck::new("workloads.isvc.mode", CheckGroup::Workload, CheckOutcome::Pass)
            .per_instance(kinds::inference_service()),
    );
    let per_nb = Arc::new(
        MockCheck::new("workloads.notebook.image", CheckGroup::Workload, CheckOutcome::Pass)
            .per_instance(notebooks()),
    );
    let cluster_wide = Arc::new(MockCheck::new(
        "components.x.y",
        CheckGroup::Component,
        CheckOutcome::Pass,
    ));
    let (api, _facts, audit) = api(
        checks(&[per_isvc.clone(), per_nb.clone(), cluster_wide.clone()]),
        ActionRegistry::new(),
    );

    let report = api
        .lint(&api.deadline(), &target(&cluster, "2.25.0", "3.0.0"), &LintRequest::default())
        .unwrap();

    assert_eq!(per_isvc.calls(), 0);
    assert_eq!(per_nb.calls(), 1);
    assert_eq!(cluster_wide.calls(), 1);
    assert_eq!(report.skipped_kinds, vec!["InferenceService".to_string()]);
    let warned = audit
        .lines
        .lock()
        .unwrap()
        .iter()
        .any(|(lvl, msg)| *lvl == Level::Warn && msg.contains("InferenceService"));
    assert!(warned);
}

#[test]
fn checks_sharing_a_kind_list_it_once() {
    let c = MemoryCluster::new();
    c.insert(&kinds::inference_service(), isvc("a", "m1", None));
    c.fail_list(&kinds::inference_service(), Error::forbidden("denied"));
    let cluster = Arc::new(c);

    let first = Arc::new(
        MockCheck::new("workloads.isvc.a", CheckGroup::Workload, CheckOutcome::Pass)
            .per_instance(kinds::inference_service()),
    );
    let second = Arc::new(
        MockCheck::new("workloads.isvc.b", CheckGroup::Workload, CheckOutcome::Pass)
            .per_instance(kinds::inference_service()),
    );
    let (api, _facts, audit) = api(checks(&[first, second]), ActionRegistry::new());
    let report = api
        .lint(&api.deadline(), &target(&cluster, "2.25.0", "3.0.0"), &LintRequest::default())
        .unwrap();

    assert_eq!(report.skipped_kinds.len(), 1);
    let warnings = audit
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|(lvl, _)| *lvl == Level::Warn)
        .count();
    assert_eq!(warnings, 1);
}
