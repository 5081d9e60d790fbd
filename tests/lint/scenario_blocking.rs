//! End-to-end lint against the built-in catalog: a 2.25 installation still on serverless
//! serving, assessed for an upgrade to 3.0.

use std::sync::Arc;

use waypoint::adapters::{kinds, MemoryCluster, ReleaseStatusDetector};
use waypoint::catalog::{action_registry, check_registry};
use waypoint::policy::Thresholds;
use waypoint::registry::ActionRegistry;
use waypoint::rules::{Gate, VersionRange};
use waypoint::types::{CheckGroup, Impact};
use waypoint::{exit_code_for_lint, ApiError, LintRequest};

use crate::common::{api, checks, dsc, serverless_cluster, target, v, CheckOutcome, MockCheck};

#[test]
fn deprecated_field_yields_exactly_one_blocking_result() {
    let cluster = Arc::new(MemoryCluster::new());
    cluster.insert(&kinds::data_science_cluster(), dsc("Managed", "Serverless"));
    let rule = Arc::new(
        MockCheck::new(
            "components.kserve.deprecated-field",
            CheckGroup::Component,
            CheckOutcome::Blocking,
        )
        .gated(Gate::current_in(VersionRange::at_least(2, 25))),
    );
    let (api, facts, _audit) = api(checks(&[rule]), ActionRegistry::new());

    let report = api
        .lint(&api.deadline(), &target(&cluster, "2.25.0", "3.0.0"), &LintRequest::default())
        .unwrap();
    assert_eq!(report.checks.len(), 1);
    assert_eq!(report.checks[0].result.max_impact(), Impact::Blocking);
    assert_eq!(exit_code_for_lint(&report.checks, &Thresholds::default()), 20);

    let (decision, summary) = facts.of("lint.summary").pop().unwrap();
    assert_eq!(decision, "failure");
    assert_eq!(summary["error_id"], "E_BLOCKING");
    assert_eq!(summary["blocking"], 1);
}

#[test]
fn builtin_catalog_flags_serverless_installation() {
    let cluster = serverless_cluster();
    let (api, _facts, _audit) = api(check_registry().unwrap(), action_registry().unwrap());
    let current = api
        .detect_version(&api.deadline(), &ReleaseStatusDetector, cluster.as_ref())
        .unwrap();
    assert_eq!(current, v("2.25.0"));

    let t = api.target(cluster.clone(), current).with_target_version(v("3.0.0"));
    let report = api.lint(&api.deadline(), &t, &LintRequest::default()).unwrap();

    let by_id = |id: &str| {
        report
            .checks
            .iter()
            .filter(|e| e.check_id == id)
            .map(|e| e.result.max_impact())
            .collect::<Vec<_>>()
    };
    assert_eq!(by_id("dependencies.certmanager.installed"), vec![Impact::Blocking]);
    assert_eq!(by_id("services.servicemesh.deprecation"), vec![Impact::Advisory]);
    assert_eq!(by_id("components.kserve.serverless-removal"), vec![Impact::Blocking]);
    assert_eq!(by_id("components.modelmesh.removal"), vec![Impact::None]);
    // one serverless (unannotated) and one raw deployment service
    assert_eq!(
        by_id("workloads.kserve.serverless-isvc"),
        vec![Impact::Blocking, Impact::None]
    );
    let impacted = &report
        .checks
        .iter()
        .find(|e| e.check_id == "workloads.kserve.serverless-isvc")
        .unwrap()
        .result
        .impacted_objects;
    assert_eq!(impacted[0].name, "fraud");
    assert_eq!(report.checks.first().unwrap().result.group, CheckGroup::Dependency);
}

#[test]
fn lint_on_the_current_version_skips_upgrade_checks() {
    let cluster = serverless_cluster();
    let (api, _facts, _audit) = api(check_registry().unwrap(), ActionRegistry::new());
    let t = api.target(cluster, v("2.25.0"));
    let report = api.lint(&api.deadline(), &t, &LintRequest::default()).unwrap();
    assert!(report.checks.is_empty());
    assert_eq!(report.not_applicable.len(), check_registry().unwrap().len());
}

#[test]
fn bad_selector_fails_before_any_check_runs() {
    let rule = Arc::new(MockCheck::new(
        "components.a.b",
        CheckGroup::Component,
        CheckOutcome::Pass,
    ));
    let (api, facts, _audit) = api(checks(&[rule.clone()]), ActionRegistry::new());
    let cluster = Arc::new(MemoryCluster::new());
    let req = LintRequest {
        patterns: vec!["components.*".into(), "[unclosed".into()],
        category: None,
    };
    let err = api
        .lint(&api.deadline(), &target(&cluster, "2.25.0", "3.0.0"), &req)
        .unwrap_err();
    assert!(matches!(err, ApiError::Selection(_)));
    assert_eq!(err.exit_code(), 10);
    assert_eq!(rule.calls(), 0);
    assert!(facts.events.lock().unwrap().is_empty());
}
