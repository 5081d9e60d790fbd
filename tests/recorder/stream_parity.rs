//! Streamed step output matches, byte for byte, the rendering of the trees the run returns.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use waypoint::catalog::{action_registry, cert_manager_subscription};
use waypoint::recorder::render::render_result;
use waypoint::recorder::StreamingRecorder;
use waypoint::registry::{ActionRegistry, CheckRegistry};
use waypoint::rules::{Action, Gate};
use waypoint::{MigrateRequest, MigrationReport, Phases};

use crate::common::{api, serverless_cluster, target, ActionOutcome, MockAction, TestApi};

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Buffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn streaming(actions: ActionRegistry) -> (TestApi, Buffer) {
    let buf = Buffer::default();
    let (api, _facts, _audit) = api(CheckRegistry::new(), actions);
    let api = api.with_shared_step_stream(StreamingRecorder::sink(buf.clone()));
    (api, buf)
}

fn rendered(report: &MigrationReport) -> String {
    report
        .results
        .iter()
        .map(|r| render_result(r, &format!("[{}:{}] ", r.metadata.name, r.metadata.kind)))
        .collect()
}

#[test]
fn builtin_migration_stream_matches_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let (api, buf) = streaming(action_registry().unwrap());
    let cluster = serverless_cluster();
    let package = cert_manager_subscription().package;
    cluster.simulate_install(&package, "cert-manager.v1.13.0", 2);
    let t = target(&cluster, "2.25.0", "3.0.0")
        .with_output_dir(dir.path())
        .with_skip_confirm(true);
    let req = MigrateRequest {
        ids: vec!["migration.kserve.raw-deployment".into()],
        phases: Phases::PrepareThenExecute,
    };

    let report = api.migrate(&api.deadline(), &t, &req).unwrap();
    assert!(report.halted.is_none(), "{:?}", report.halted);
    let streamed = buf.text();
    assert!(streamed.contains("[migration.kserve.raw-deployment:prepare] → validate"));
    assert_eq!(streamed, rendered(&report));
}

#[test]
fn dry_run_stream_matches_the_tree() {
    let (api, buf) = streaming(action_registry().unwrap());
    let cluster = serverless_cluster();
    let t = target(&cluster, "2.25.0", "3.0.0").with_dry_run(true);
    let req = MigrateRequest {
        ids: vec!["migration.kserve.raw-deployment".into()],
        phases: Phases::Execute,
    };

    let report = api.migrate(&api.deadline(), &t, &req).unwrap();
    let streamed = buf.text();
    assert!(streamed.contains("would create subscription"));
    assert_eq!(streamed, rendered(&report));
}

#[test]
fn skipped_and_failed_actions_stream_like_their_trees() {
    let gated = Arc::new(
        MockAction::new("migration.later", ActionOutcome::Succeed).gated(Gate::crossing(4, 0)),
    );
    let ok = Arc::new(MockAction::new("migration.ok", ActionOutcome::Mutate(2)));
    let bad = Arc::new(MockAction::new("migration.bad", ActionOutcome::Fail("boom".into())));
    let rules: Vec<Arc<dyn Action>> = vec![gated, ok, bad];
    let (api, buf) = streaming(ActionRegistry::from_rules(rules).unwrap());
    let cluster = serverless_cluster();
    let t = target(&cluster, "2.25.0", "3.0.0").with_skip_confirm(true);
    let req = MigrateRequest {
        ids: vec![
            "migration.later".into(),
            "migration.ok".into(),
            "migration.bad".into(),
        ],
        phases: Phases::Execute,
    };

    let report = api.migrate(&api.deadline(), &t, &req).unwrap();
    assert_eq!(report.results.len(), 3);
    assert!(report.halted.is_some());
    let streamed = buf.text();
    assert!(streamed.contains("[migration.later:execute] → version-gate"));
    assert!(streamed.contains("[migration.bad:execute] → execute"));
    assert_eq!(streamed, rendered(&report));
}

#[test]
fn step_prefix_is_prepended_to_every_line() {
    let ok: Arc<dyn Action> = Arc::new(MockAction::new("migration.ok", ActionOutcome::Succeed));
    let (api, buf) = streaming(ActionRegistry::from_rules([ok]).unwrap());
    let api = api.with_step_prefix("run-1 ");
    let cluster = serverless_cluster();
    let t = target(&cluster, "2.25.0", "3.0.0");
    let req = MigrateRequest {
        ids: vec!["migration.ok".into()],
        phases: Phases::Execute,
    };

    let report = api.migrate(&api.deadline(), &t, &req).unwrap();
    let streamed = buf.text();
    assert!(!streamed.is_empty());
    assert!(streamed.lines().all(|l| l.starts_with("run-1 [migration.ok:execute] ")));
    let expected = render_result(&report.results[0], "run-1 [migration.ok:execute] ");
    assert_eq!(streamed, expected);
}

#[test]
fn overlapping_sibling_steps_stream_like_their_tree() {
    let both: Arc<dyn Action> =
        Arc::new(MockAction::new("migration.both", ActionOutcome::Overlap));
    let (api, buf) = streaming(ActionRegistry::from_rules([both]).unwrap());
    let cluster = serverless_cluster();
    let t = target(&cluster, "2.25.0", "3.0.0");
    let req = MigrateRequest {
        ids: vec!["migration.both".into()],
        phases: Phases::Execute,
    };

    let report = api.migrate(&api.deadline(), &t, &req).unwrap();
    let p = "[migration.both:execute] ";
    let expected = format!(
        "{p}→ first\n{p}→ second (checked alongside first)\n\
         {p}  ✓ first done\n{p}  ✓ second done\n"
    );
    assert_eq!(buf.text(), expected);
    assert_eq!(rendered(&report), expected);
}
