//! Cluster client seam.
//!
//! Objects are handled unstructured (`serde_json::Value`), the way a dynamic client sees
//! them; rules pick the fields they care about with JSON pointers.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::errors::{Error, Result};
use crate::types::Deadline;

pub mod kinds;
pub mod memory;

pub use memory::MemoryCluster;

/// Identifies an API kind the client can list and fetch.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKind {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespaced: bool,
}

impl ResourceKind {
    pub fn new(group: &str, version: &str, kind: &str, namespaced: bool) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            namespaced,
        }
    }

    /// `group/version`, or just `version` for the core group.
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// A single cluster object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(pub Value);

impl Resource {
    #[must_use]
    pub fn name(&self) -> &str {
        self.str_at("/metadata/name").unwrap_or_default()
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.str_at("/metadata/namespace").filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        self.str_at("/kind").unwrap_or_default()
    }

    #[must_use]
    pub fn resource_version(&self) -> Option<&str> {
        self.str_at("/metadata/resourceVersion")
    }

    #[must_use]
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.0.pointer(pointer).and_then(Value::as_str)
    }

    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.0
            .pointer("/metadata/annotations")
            .and_then(|a| a.get(key))
            .and_then(Value::as_str)
    }

    /// Set a string annotation, creating the annotations map when absent.
    pub fn set_annotation(&mut self, key: &str, value: &str) {
        ensure_object(&mut self.0, &["metadata", "annotations"])
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    /// Write `value` at a JSON pointer, creating intermediate objects.
    pub fn set_at(&mut self, pointer: &str, value: Value) {
        let segments: Vec<&str> = pointer.split('/').skip(1).collect();
        if let Some((last, parents)) = segments.split_last() {
            ensure_object(&mut self.0, parents).insert((*last).to_string(), value);
        }
    }
}

fn ensure_object<'a>(root: &'a mut Value, path: &[&str]) -> &'a mut Map<String, Value> {
    let mut cur = root;
    for seg in path {
        cur = as_object(cur)
            .entry((*seg).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    as_object(cur)
}

// Replaces non-object values (including null) with an empty object.
fn as_object(v: &mut Value) -> &mut Map<String, Value> {
    if !v.is_object() {
        *v = Value::Object(Map::new());
    }
    match v {
        Value::Object(map) => map,
        _ => unreachable!("normalized to an object above"),
    }
}

/// Operations the engine needs from a cluster connection.
///
/// Implementations must surface "not found" and "conflict" through the matching
/// `ErrorKind`, and should honor the deadline on every call.
pub trait ClusterClient: Send + Sync {
    /// List every instance of `kind` across namespaces.
    ///
    /// # Errors
    /// Returns the client error for the list call.
    fn list_resources(&self, deadline: &Deadline, kind: &ResourceKind) -> Result<Vec<Resource>>;

    /// # Errors
    /// Returns `NotFound` when the object does not exist.
    fn get(
        &self,
        deadline: &Deadline,
        kind: &ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Resource>;

    /// Replace an object; the stored `resourceVersion` must match.
    ///
    /// # Errors
    /// Returns `Conflict` when `obj` is stale.
    fn update(&self, deadline: &Deadline, kind: &ResourceKind, obj: &Resource) -> Result<Resource>;

    /// # Errors
    /// Returns `Conflict` when the object already exists.
    fn create(&self, deadline: &Deadline, kind: &ResourceKind, obj: &Resource) -> Result<Resource>;

    /// The platform's primary configuration singleton.
    ///
    /// # Errors
    /// `NotFound` when absent, `Invalid` when more than one instance exists.
    fn primary_config(&self, deadline: &Deadline) -> Result<Resource> {
        singleton(
            self.list_resources(deadline, &kinds::data_science_cluster())?,
            "DataScienceCluster",
        )
    }

    /// The platform's initialization singleton.
    ///
    /// # Errors
    /// `NotFound` when absent, `Invalid` when more than one instance exists.
    fn initialization(&self, deadline: &Deadline) -> Result<Resource> {
        singleton(self.list_resources(deadline, &kinds::dsc_initialization())?, "DSCInitialization")
    }

    /// # Errors
    /// `NotFound` when no such subscription exists.
    fn subscription(&self, deadline: &Deadline, namespace: &str, name: &str) -> Result<Resource> {
        self.get(deadline, &kinds::subscription(), Some(namespace), name)
    }

    /// The installed version object (`ClusterServiceVersion`) named by a subscription.
    ///
    /// # Errors
    /// `NotFound` when the version is not installed yet.
    fn installed_version(
        &self,
        deadline: &Deadline,
        namespace: &str,
        name: &str,
    ) -> Result<Resource> {
        self.get(deadline, &kinds::cluster_service_version(), Some(namespace), name)
    }
}

fn singleton(mut items: Vec<Resource>, what: &str) -> Result<Resource> {
    match items.len() {
        0 => Err(Error::not_found(format!("no {what} instance found"))),
        1 => Ok(items.remove(0)),
        n => Err(Error::invalid(format!("expected one {what}, found {n}"))),
    }
}
