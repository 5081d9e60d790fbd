//! In-memory `ClusterClient` with optimistic concurrency and fault injection.
//!
//! Used for fixtures (`--cluster-state`) and throughout the test suites. Objects are keyed by
//! kind, namespace and name; every write bumps `metadata.resourceVersion` and an update
//! carrying a stale version is rejected with `Conflict`, like an API server would.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use serde_json::{json, Value};

use crate::constants::CSV_PHASE_SUCCEEDED;
use crate::types::errors::{Error, Result};
use crate::types::Deadline;

use super::{kinds, ClusterClient, Resource, ResourceKind};

type ObjectKey = (String, String, String);

fn key_of(kind: &ResourceKind, namespace: Option<&str>, name: &str) -> ObjectKey {
    (
        kind.kind.clone(),
        namespace.unwrap_or_default().to_string(),
        name.to_string(),
    )
}

struct Staged {
    reads_left: u32,
    obj: Value,
}

struct InstallSim {
    csv_name: String,
    reads_until_ready: u32,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<ObjectKey, Value>,
    next_version: u64,
    forced_conflicts: BTreeMap<String, u32>,
    forbidden: BTreeSet<String>,
    list_failures: BTreeMap<String, Error>,
    staged: BTreeMap<ObjectKey, Vec<Staged>>,
    installs: BTreeMap<String, InstallSim>,
}

impl State {
    fn stamp(&mut self, obj: &mut Value) {
        self.next_version += 1;
        let rv = self.next_version.to_string();
        if let Some(meta) = obj.get_mut("metadata").and_then(Value::as_object_mut) {
            meta.insert("resourceVersion".to_string(), Value::String(rv));
        }
    }

    fn store(&mut self, key: ObjectKey, mut obj: Value) -> Value {
        self.stamp(&mut obj);
        self.objects.insert(key, obj.clone());
        obj
    }

    fn gate(&self, kind: &ResourceKind) -> Result<()> {
        if self.forbidden.contains(&kind.kind) {
            return Err(Error::forbidden(format!(
                "{} is forbidden: missing permission on {}",
                kind.kind,
                kind.api_version()
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCluster {
    state: Mutex<State>,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

#[derive(Deserialize)]
struct FixtureHeader {
    kind: String,
}

impl MemoryCluster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a multi-document YAML fixture. Each document's `kind` must name one of the
    /// kinds in [`kinds::known`].
    ///
    /// # Errors
    /// Returns `Invalid` for malformed YAML or unknown kinds.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let known = kinds::known();
        let cluster = Self::new();
        for doc in serde_yaml::Deserializer::from_str(text) {
            let value = Value::deserialize(doc)?;
            if value.is_null() {
                continue;
            }
            let header: FixtureHeader = serde_json::from_value(value.clone())?;
            let kind = known
                .iter()
                .find(|k| k.kind == header.kind)
                .ok_or_else(|| Error::invalid(format!("unknown fixture kind `{}`", header.kind)))?;
            cluster.insert(kind, value);
        }
        Ok(cluster)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace an object without counting it as a client mutation.
    pub fn insert(&self, kind: &ResourceKind, mut obj: Value) {
        if obj.get("metadata").is_none() {
            obj["metadata"] = json!({});
        }
        let r = Resource(obj);
        let key = key_of(kind, r.namespace(), r.name());
        self.lock().store(key, r.0);
    }

    /// Read an object without triggering staged transitions or faults.
    #[must_use]
    pub fn object(
        &self,
        kind: &ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<Resource> {
        self.lock()
            .objects
            .get(&key_of(kind, namespace, name))
            .cloned()
            .map(Resource)
    }

    /// Make the next `times` updates of `kind` fail with `Conflict`.
    pub fn fail_updates_with_conflict(&self, kind: &ResourceKind, times: u32) {
        self.lock().forced_conflicts.insert(kind.kind.clone(), times);
    }

    /// Deny every call touching `kind`.
    pub fn forbid(&self, kind: &ResourceKind) {
        self.lock().forbidden.insert(kind.kind.clone());
    }

    /// Make list calls for `kind` fail with `err`.
    pub fn fail_list(&self, kind: &ResourceKind, err: Error) {
        self.lock().list_failures.insert(kind.kind.clone(), err);
    }

    /// Replace (or create) an object once it has been read `reads` more times.
    pub fn stage_after_reads(&self, kind: &ResourceKind, obj: Value, reads: u32) {
        let r = Resource(obj);
        let key = key_of(kind, r.namespace(), r.name());
        self.lock().staged.entry(key).or_default().push(Staged {
            reads_left: reads,
            obj: r.0,
        });
    }

    /// Emulate the operator lifecycle manager for `package`: creating a subscription for it
    /// records `csv_name` as installed and produces that version in phase `Installing`,
    /// turning `Succeeded` after `reads_until_ready` reads.
    pub fn simulate_install(&self, package: &str, csv_name: &str, reads_until_ready: u32) {
        self.lock().installs.insert(
            package.to_string(),
            InstallSim {
                csv_name: csv_name.to_string(),
                reads_until_ready,
            },
        );
    }

    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn mutation_calls(&self) -> usize {
        self.create_calls() + self.update_calls()
    }

    fn after_create(state: &mut State, kind: &ResourceKind, created: &mut Value) {
        if kind.kind != kinds::subscription().kind {
            return;
        }
        let r = Resource(created.clone());
        let Some(package) = r.str_at("/spec/name") else {
            return;
        };
        let Some(sim) = state.installs.get(package) else {
            return;
        };
        let ns = r.namespace().unwrap_or_default().to_string();
        let csv_name = sim.csv_name.clone();
        let reads = sim.reads_until_ready;

        created["status"] = json!({ "installedCSV": csv_name });
        state.objects.insert(key_of(kind, Some(&ns), r.name()), created.clone());

        let csv_kind = kinds::cluster_service_version();
        let csv = |phase: &str| {
            json!({
                "apiVersion": csv_kind.api_version(),
                "kind": csv_kind.kind,
                "metadata": { "name": csv_name, "namespace": ns },
                "status": { "phase": phase },
            })
        };
        let csv_key = key_of(&csv_kind, Some(&ns), &csv_name);
        state.store(csv_key.clone(), csv("Installing"));
        state.staged.entry(csv_key).or_default().push(Staged {
            reads_left: reads,
            obj: csv(CSV_PHASE_SUCCEEDED),
        });
    }
}

impl ClusterClient for MemoryCluster {
    fn list_resources(&self, deadline: &Deadline, kind: &ResourceKind) -> Result<Vec<Resource>> {
        deadline.check()?;
        let state = self.lock();
        state.gate(kind)?;
        if let Some(err) = state.list_failures.get(&kind.kind) {
            return Err(err.clone());
        }
        Ok(state
            .objects
            .iter()
            .filter(|((k, _, _), _)| *k == kind.kind)
            .map(|(_, v)| Resource(v.clone()))
            .collect())
    }

    fn get(
        &self,
        deadline: &Deadline,
        kind: &ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Resource> {
        deadline.check()?;
        let mut state = self.lock();
        state.gate(kind)?;
        let key = key_of(kind, namespace, name);

        let mut ready: Option<Value> = None;
        if let Some(queue) = state.staged.get_mut(&key) {
            if let Some(front) = queue.first_mut() {
                if front.reads_left == 0 {
                    ready = Some(queue.remove(0).obj);
                } else {
                    front.reads_left -= 1;
                }
            }
        }
        if let Some(obj) = ready {
            state.store(key.clone(), obj);
        }

        state
            .objects
            .get(&key)
            .cloned()
            .map(Resource)
            .ok_or_else(|| {
                Error::not_found(format!(
                    "{} {}/{} not found",
                    kind.kind,
                    namespace.unwrap_or("-"),
                    name
                ))
            })
    }

    fn update(&self, deadline: &Deadline, kind: &ResourceKind, obj: &Resource) -> Result<Resource> {
        deadline.check()?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        state.gate(kind)?;
        if let Some(left) = state.forced_conflicts.get_mut(&kind.kind) {
            if *left > 0 {
                *left -= 1;
                return Err(Error::conflict(format!(
                    "the object has been modified; \
                     please apply your changes to the latest version ({} {})",
                    kind.kind,
                    obj.name()
                )));
            }
        }
        let key = key_of(kind, obj.namespace(), obj.name());
        let Some(stored) = state.objects.get(&key) else {
            return Err(Error::not_found(format!("{} {} not found", kind.kind, obj.name())));
        };
        let stored_rv = Resource(stored.clone()).resource_version().map(str::to_string);
        if obj.resource_version().map(str::to_string) != stored_rv {
            return Err(Error::conflict(format!(
                "{} {}: resourceVersion mismatch",
                kind.kind,
                obj.name()
            )));
        }
        Ok(Resource(state.store(key, obj.0.clone())))
    }

    fn create(&self, deadline: &Deadline, kind: &ResourceKind, obj: &Resource) -> Result<Resource> {
        deadline.check()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        state.gate(kind)?;
        let key = key_of(kind, obj.namespace(), obj.name());
        if state.objects.contains_key(&key) {
            return Err(Error::conflict(format!(
                "{} {} already exists",
                kind.kind,
                obj.name()
            )));
        }
        let mut created = state.store(key, obj.0.clone());
        Self::after_create(&mut state, kind, &mut created);
        Ok(Resource(created))
    }
}
