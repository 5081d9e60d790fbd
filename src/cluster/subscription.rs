use serde_json::json;

use crate::adapters::{kinds, ClusterClient, Resource};
use crate::types::errors::Result;
use crate::types::Deadline;

/// Desired operator subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionSpec {
    pub namespace: String,
    pub name: String,
    /// Operator package name in the catalog.
    pub package: String,
    pub channel: String,
    pub source: String,
    pub source_namespace: String,
}

impl SubscriptionSpec {
    #[must_use]
    pub fn to_resource(&self) -> Resource {
        let kind = kinds::subscription();
        Resource(json!({
            "apiVersion": kind.api_version(),
            "kind": kind.kind,
            "metadata": { "name": self.name, "namespace": self.namespace },
            "spec": {
                "name": self.package,
                "channel": self.channel,
                "source": self.source,
                "sourceNamespace": self.source_namespace,
                "installPlanApproval": "Automatic",
            },
        }))
    }
}

#[derive(Clone, Debug)]
pub enum Ensured {
    Existing(Resource),
    Created(Resource),
}

impl Ensured {
    #[must_use]
    pub fn resource(&self) -> &Resource {
        match self {
            Ensured::Existing(r) | Ensured::Created(r) => r,
        }
    }
}

/// Current state of the subscription, if any.
///
/// # Errors
/// Client errors other than `NotFound`.
pub fn find_subscription(
    deadline: &Deadline,
    client: &dyn ClusterClient,
    spec: &SubscriptionSpec,
) -> Result<Option<Resource>> {
    match client.subscription(deadline, &spec.namespace, &spec.name) {
        Ok(r) => Ok(Some(r)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Create the subscription unless it already exists. An existing subscription is left as is.
///
/// # Errors
/// Client errors from the lookup or the create.
pub fn ensure_subscription(
    deadline: &Deadline,
    client: &dyn ClusterClient,
    spec: &SubscriptionSpec,
) -> Result<Ensured> {
    if let Some(existing) = find_subscription(deadline, client, spec)? {
        return Ok(Ensured::Existing(existing));
    }
    let what = format!("creating subscription {}/{}", spec.namespace, spec.name);
    let created = client
        .create(deadline, &kinds::subscription(), &spec.to_resource())
        .map_err(|e| e.context(&what))?;
    Ok(Ensured::Created(created))
}
