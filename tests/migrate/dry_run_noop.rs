//! Dry-run never reaches the client's mutate path, no matter how often it runs, and every
//! mutating sub-step records what it would have done.

use std::sync::Arc;

use waypoint::adapters::kinds;
use waypoint::catalog::action_registry;
use waypoint::constants::PRESERVED_CONFIG_ANNOTATION;
use waypoint::logging::TS_ZERO;
use waypoint::registry::CheckRegistry;
use waypoint::types::{ActionStep, StepStatus};
use waypoint::{exit_code_for_migration, MigrateRequest, Phases};

use crate::common::{actions, api, serverless_cluster, target, ActionOutcome, MockAction};

fn find<'a>(steps: &'a [ActionStep], name: &str) -> Option<&'a ActionStep> {
    steps.iter().find_map(|s| {
        if s.name == name {
            Some(s)
        } else {
            find(&s.children, name)
        }
    })
}

#[test]
fn mock_mutations_are_recorded_not_performed() {
    let m = Arc::new(MockAction::new("migration.mutate", ActionOutcome::Mutate(3)));
    let (api, _facts, _audit) = api(CheckRegistry::new(), actions(&[m.clone()]));
    let cluster = serverless_cluster();
    let t = target(&cluster, "2.25.0", "3.0.0").with_dry_run(true);
    let req = MigrateRequest {
        ids: vec!["migration.mutate".into()],
        phases: Phases::Execute,
    };

    for _ in 0..3 {
        let report = api.migrate(&api.deadline(), &t, &req).unwrap();
        let result = &report.results[0];
        assert!(result.spec.dry_run);
        assert!(result.status.completed);
        assert_eq!(result.status.steps.len(), 3);
        let would = find(&result.status.steps, "dry-run").unwrap();
        assert_eq!(would.status, StepStatus::Skipped);
        assert_eq!(would.message, "would create isvc m0");
    }
    assert_eq!(m.executions(), 3);
    assert_eq!(cluster.mutation_calls(), 0);
}

#[test]
fn builtin_migration_dry_run_leaves_the_cluster_untouched() {
    let (api, facts, _audit) = api(CheckRegistry::new(), action_registry().unwrap());
    let cluster = serverless_cluster();
    let before = cluster.object(&kinds::data_science_cluster(), None, "default-dsc").unwrap();
    let t = target(&cluster, "2.25.0", "3.0.0").with_dry_run(true);
    let req = MigrateRequest {
        ids: vec!["migration.kserve.raw-deployment".into()],
        phases: Phases::Execute,
    };

    for _ in 0..2 {
        let report = api.migrate(&api.deadline(), &t, &req).unwrap();
        assert_eq!(exit_code_for_migration(&report), 0);
        let steps = &report.results[0].status.steps;
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["install-operator", "preserve-config", "update-config"]);
        assert!(steps.iter().all(|s| s.status == StepStatus::Skipped));
        assert!(steps.iter().all(|s| s.children[0].message.starts_with("would ")));
    }

    assert_eq!(cluster.mutation_calls(), 0);
    let after = cluster.object(&kinds::data_science_cluster(), None, "default-dsc").unwrap();
    assert_eq!(before, after);
    assert!(after.annotation(PRESERVED_CONFIG_ANNOTATION).is_none());

    // dry-run facts are redacted for determinism
    let executes = facts.of("migrate.execute");
    assert_eq!(executes.len(), 2);
    for (_, f) in &executes {
        assert_eq!(f["ts"], TS_ZERO);
        assert_eq!(f["dry_run"], true);
        assert!(f.get("duration_ms").is_none());
    }
    assert_eq!(executes[0].1, executes[1].1);
}
