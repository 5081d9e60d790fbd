//! A check that errors is captured as an error result; the rest of the batch still runs.

use std::sync::Arc;

use waypoint::adapters::MemoryCluster;
use waypoint::policy::Thresholds;
use waypoint::registry::ActionRegistry;
use waypoint::types::{CheckGroup, Impact};
use waypoint::{exit_code_for_lint, LintRequest};

use crate::common::{api, checks, target, CheckOutcome, MockCheck};

#[test]
fn one_erroring_check_does_not_stop_the_batch() {
    let rules = vec![
        Arc::new(MockCheck::new("components.a.ok", CheckGroup::Component, CheckOutcome::Pass)),
        Arc::new(MockCheck::new(
            "components.b.broken",
            CheckGroup::Component,
            CheckOutcome::Error("cannot reach api".into()),
        )),
        Arc::new(MockCheck::new("components.c.ok", CheckGroup::Component, CheckOutcome::Pass)),
    ];
    let (api, facts, _audit) = api(checks(&rules), ActionRegistry::new());
    let cluster = Arc::new(MemoryCluster::new());

    let report = api
        .lint(&api.deadline(), &target(&cluster, "2.25.0", "3.0.0"), &LintRequest::default())
        .unwrap();

    assert_eq!(report.checks.len(), 3);
    let errored: Vec<_> = report.checks.iter().filter(|e| e.is_error()).collect();
    assert_eq!(errored.len(), 1);
    assert_eq!(errored[0].check_id, "components.b.broken");
    assert!(errored[0].error.as_deref().unwrap().contains("cannot reach api"));
    let cond = &errored[0].result.conditions[0];
    assert_eq!(cond.reason, "ValidationError");
    assert_eq!(cond.impact, Impact::Advisory);
    assert!(rules.iter().all(|r| r.calls() == 1));
    assert_eq!(report.summary.errors, 1);

    let check_facts = facts.of("lint.check");
    assert_eq!(check_facts.len(), 3);
    assert_eq!(check_facts.iter().filter(|(d, _)| d == "failure").count(), 1);
}

#[test]
fn errors_alone_fail_only_under_fail_on_warning() {
    let rules = vec![Arc::new(MockCheck::new(
        "components.b.broken",
        CheckGroup::Component,
        CheckOutcome::Error("boom".into()),
    ))];
    let (api, _facts, _audit) = api(checks(&rules), ActionRegistry::new());
    let cluster = Arc::new(MemoryCluster::new());
    let report = api
        .lint(&api.deadline(), &target(&cluster, "2.25.0", "3.0.0"), &LintRequest::default())
        .unwrap();

    assert_eq!(exit_code_for_lint(&report.checks, &Thresholds::default()), 0);
    let strict = Thresholds {
        fail_on_critical: true,
        fail_on_warning: true,
    };
    assert_eq!(exit_code_for_lint(&report.checks, &strict), 21);
}
