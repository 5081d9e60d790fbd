use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::adapters::{ClusterClient, Resource, ResourceKind};
use crate::types::errors::{Error, Result};
use crate::types::Deadline;

/// File a kind's backup lands in: `<dir>/<kind>.yaml`, or `<dir>/<namespace>/<kind>.yaml`
/// for namespaced kinds.
#[must_use]
pub fn backup_path(dir: &Path, kind: &ResourceKind, namespace: Option<&str>) -> PathBuf {
    let file = format!("{}.yaml", kind.kind.to_ascii_lowercase());
    match namespace {
        Some(ns) if kind.namespaced => dir.join(ns).join(file),
        _ => dir.join(file),
    }
}

fn write_yaml(path: &Path, items: &[&Value]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::io(format!("creating {}: {e}", parent.display())))?;
    }
    let text = serde_yaml::to_string(items)?;
    fs::write(path, text).map_err(|e| Error::io(format!("writing {}: {e}", path.display())))
}

/// Serialize every instance of `kind` to YAML under `dir`, one file per kind (per namespace
/// for namespaced kinds). Returns the files written; a kind with no instances writes nothing.
///
/// # Errors
/// Client errors from the list call, or I/O errors while writing.
pub fn backup_kind(
    deadline: &Deadline,
    client: &dyn ClusterClient,
    kind: &ResourceKind,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let items = client.list_resources(deadline, kind)?;
    let mut by_ns: BTreeMap<Option<&str>, Vec<&Value>> = BTreeMap::new();
    for r in &items {
        let ns = if kind.namespaced { r.namespace() } else { None };
        by_ns.entry(ns).or_default().push(&r.0);
    }
    let mut written = Vec::with_capacity(by_ns.len());
    for (ns, objs) in by_ns {
        let path = backup_path(dir, kind, ns);
        write_yaml(&path, &objs)?;
        written.push(path);
    }
    Ok(written)
}

/// Parse a backup file back into resources.
///
/// # Errors
/// I/O or YAML errors.
pub fn read_backup(path: &Path) -> Result<Vec<Resource>> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("reading {}: {e}", path.display())))?;
    let items: Vec<Value> = serde_yaml::from_str(&text)?;
    Ok(items.into_iter().map(Resource).collect())
}
