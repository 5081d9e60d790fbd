use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::logging::redact::now_iso;
use crate::types::errors::{Error, Result};
use crate::types::{
    ActionMetadata, ActionResult, ActionSpec, ActionStatus, ActionStep, StepEvent, StepStatus,
};

struct Node {
    name: String,
    description: String,
    status: StepStatus,
    message: String,
    timestamp: String,
    details: BTreeMap<String, Value>,
    children: Vec<usize>,
}

pub(super) struct Arena {
    metadata: ActionMetadata,
    spec: ActionSpec,
    nodes: Vec<Node>,
    roots: Vec<usize>,
    // (node, closed) in the order headers and footers were produced
    events: Vec<(usize, bool)>,
    cancelled: bool,
}

/// Shared handle to one action's step tree. `node == None` is the root.
#[derive(Clone)]
pub(super) struct Cursor {
    arena: Arc<Mutex<Arena>>,
    node: Option<usize>,
    depth: usize,
}

impl Cursor {
    pub(super) fn root(metadata: ActionMetadata, spec: ActionSpec) -> Self {
        Self {
            arena: Arc::new(Mutex::new(Arena {
                metadata,
                spec,
                nodes: Vec::new(),
                roots: Vec::new(),
                events: Vec::new(),
                cancelled: false,
            })),
            node: None,
            depth: 0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Arena> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Depth of the steps this cursor's children will have.
    pub(super) fn child_depth(&self) -> usize {
        self.depth
    }

    /// Depth of the step this cursor points at.
    pub(super) fn own_depth(&self) -> usize {
        self.depth.saturating_sub(1)
    }

    pub(super) fn is_root(&self) -> bool {
        self.node.is_none()
    }

    pub(super) fn add_child(&self, name: &str, description: &str) -> Cursor {
        let mut a = self.lock();
        let idx = a.nodes.len();
        a.nodes.push(Node {
            name: name.to_string(),
            description: description.to_string(),
            status: StepStatus::Running,
            message: String::new(),
            timestamp: now_iso(),
            details: BTreeMap::new(),
            children: Vec::new(),
        });
        match self.node {
            Some(parent) => a.nodes[parent].children.push(idx),
            None => a.roots.push(idx),
        }
        a.events.push((idx, false));
        Cursor {
            arena: Arc::clone(&self.arena),
            node: Some(idx),
            depth: self.depth + 1,
        }
    }

    /// Returns the step name when the completion took effect.
    pub(super) fn complete(&self, status: StepStatus, message: &str) -> Option<String> {
        let idx = self.node?;
        let mut a = self.lock();
        let node = &mut a.nodes[idx];
        if node.status.is_terminal() {
            return None;
        }
        node.status = status;
        node.message = message.to_string();
        node.timestamp = now_iso();
        let name = node.name.clone();
        a.events.push((idx, true));
        Some(name)
    }

    pub(super) fn add_detail(&self, key: &str, value: Value) {
        if let Some(idx) = self.node {
            self.lock().nodes[idx].details.insert(key.to_string(), value);
        }
    }

    pub(super) fn mark_cancelled(&self) {
        self.lock().cancelled = true;
    }

    pub(super) fn dry_run(&self) -> bool {
        self.lock().spec.dry_run
    }

    pub(super) fn build(&self) -> Result<ActionResult> {
        if !self.is_root() {
            return Err(Error::invalid("build() called on a nested step recorder"));
        }
        let a = self.lock();
        let steps: Vec<ActionStep> = a.roots.iter().map(|&i| materialize(&a, i)).collect();
        let failed = steps.iter().any(ActionStep::any_failed);
        let mut paths = vec![Vec::new(); a.nodes.len()];
        for (i, &root) in a.roots.iter().enumerate() {
            assign_paths(&a, root, vec![i], &mut paths);
        }
        let transcript = a
            .events
            .iter()
            .map(|&(idx, closed)| StepEvent {
                path: paths[idx].clone(),
                closed,
            })
            .collect();
        Ok(ActionResult {
            metadata: a.metadata.clone(),
            spec: a.spec.clone(),
            status: ActionStatus {
                steps,
                completed: !failed && !a.cancelled,
                error: None,
                transcript,
            },
        })
    }
}

fn assign_paths(a: &Arena, idx: usize, path: Vec<usize>, out: &mut [Vec<usize>]) {
    for (i, &c) in a.nodes[idx].children.iter().enumerate() {
        let mut child = path.clone();
        child.push(i);
        assign_paths(a, c, child, out);
    }
    out[idx] = path;
}

fn materialize(a: &Arena, idx: usize) -> ActionStep {
    let n = &a.nodes[idx];
    ActionStep {
        name: n.name.clone(),
        description: n.description.clone(),
        status: n.status,
        message: n.message.clone(),
        timestamp: n.timestamp.clone(),
        children: n.children.iter().map(|&c| materialize(a, c)).collect(),
        details: n.details.clone(),
    }
}
