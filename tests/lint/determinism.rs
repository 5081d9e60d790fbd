//! Results come back in canonical order (category, kind, name) regardless of registration
//! order, and repeated runs produce identical output.

use std::sync::Arc;

use waypoint::adapters::MemoryCluster;
use waypoint::registry::ActionRegistry;
use waypoint::render::{render_lint, OutputFormat};
use waypoint::types::CheckGroup;
use waypoint::LintRequest;

use crate::common::{api, checks, target, CheckOutcome, MockCheck};

fn scrambled() -> Vec<Arc<MockCheck>> {
    vec![
        Arc::new(MockCheck::new("components.zeta.b", CheckGroup::Component, CheckOutcome::Pass)),
        Arc::new(MockCheck::new("services.mesh.a", CheckGroup::Service, CheckOutcome::Advisory)),
        Arc::new(MockCheck::new(
            "components.alpha.b",
            CheckGroup::Component,
            CheckOutcome::Blocking,
        )),
        Arc::new(MockCheck::new("dependencies.cm.a", CheckGroup::Dependency, CheckOutcome::Pass)),
        Arc::new(MockCheck::new("components.alpha.a", CheckGroup::Component, CheckOutcome::Pass)),
    ]
}

#[test]
fn canonical_order_is_category_then_kind_then_name() {
    let (api, _facts, _audit) = api(checks(&scrambled()), ActionRegistry::new());
    let cluster = Arc::new(MemoryCluster::new());
    let t = target(&cluster, "2.25.0", "3.0.0");

    let report = api.lint(&api.deadline(), &t, &LintRequest::default()).unwrap();
    let ids: Vec<&str> = report.checks.iter().map(|e| e.check_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "dependencies.cm.a",
            "services.mesh.a",
            "components.alpha.a",
            "components.alpha.b",
            "components.zeta.b",
        ]
    );
}

#[test]
fn repeated_runs_render_identically_in_every_format() {
    let (api, _facts, _audit) = api(checks(&scrambled()), ActionRegistry::new());
    let cluster = Arc::new(MemoryCluster::new());
    let t = target(&cluster, "2.25.0", "3.0.0");

    for format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Yaml] {
        let a = api.lint(&api.deadline(), &t, &LintRequest::default()).unwrap();
        let b = api.lint(&api.deadline(), &t, &LintRequest::default()).unwrap();
        assert_eq!(render_lint(&a, format).unwrap(), render_lint(&b, format).unwrap());
    }
}

#[test]
fn json_rows_keep_the_engine_order() {
    let (api, _facts, _audit) = api(checks(&scrambled()), ActionRegistry::new());
    let cluster = Arc::new(MemoryCluster::new());
    let t = target(&cluster, "2.25.0", "3.0.0");
    let report = api.lint(&api.deadline(), &t, &LintRequest::default()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&render_lint(&report, OutputFormat::Json).unwrap()).unwrap();
    let json_ids: Vec<&str> = json["checks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["check_id"].as_str().unwrap())
        .collect();
    assert_eq!(
        json_ids,
        report.checks.iter().map(|e| e.check_id.as_str()).collect::<Vec<_>>()
    );
}
