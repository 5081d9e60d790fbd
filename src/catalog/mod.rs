//! Built-in rule catalog.
//!
//! Registries are built fresh for every caller; nothing here is process-wide.
use std::sync::Arc;

use crate::cluster::SubscriptionSpec;
use crate::registry::{ActionRegistry, CheckRegistry, RegistryError};
use crate::rules::{Action, Check};

pub mod actions;
pub mod checks;

/// Management state value meaning "the operator reconciles this component".
pub const MANAGED: &str = "Managed";
pub const REMOVED: &str = "Removed";

/// Annotation selecting the deployment mode of one InferenceService.
pub const DEPLOYMENT_MODE_ANNOTATION: &str = "serving.kserve.io/deploymentMode";
pub const MODE_SERVERLESS: &str = "Serverless";
pub const MODE_RAW: &str = "RawDeployment";

/// Operator subscription the 3.x serving stack depends on.
#[must_use]
pub fn cert_manager_subscription() -> SubscriptionSpec {
    SubscriptionSpec {
        namespace: "cert-manager-operator".into(),
        name: "openshift-cert-manager-operator".into(),
        package: "openshift-cert-manager-operator".into(),
        channel: "stable-v1".into(),
        source: "redhat-operators".into(),
        source_namespace: "openshift-marketplace".into(),
    }
}

/// Every built-in check, in registration order.
#[must_use]
pub fn builtin_checks() -> Vec<Arc<dyn Check>> {
    vec![
        Arc::new(checks::ManagementStateRemoval::kserve_serverless()),
        Arc::new(checks::ManagementStateRemoval::modelmesh()),
        Arc::new(checks::ServiceMeshDeprecation::new()),
        Arc::new(checks::CertManagerInstalled::new()),
        Arc::new(checks::ServerlessInferenceService::new()),
    ]
}

/// Every built-in action, in registration order.
#[must_use]
pub fn builtin_actions() -> Vec<Arc<dyn Action>> {
    vec![
        Arc::new(actions::PlatformConfigBackup::new()),
        Arc::new(actions::KserveRawDeployment::new()),
    ]
}

/// # Errors
/// Returns `DuplicateId` if the catalog repeats an id.
pub fn check_registry() -> Result<CheckRegistry, RegistryError> {
    CheckRegistry::from_rules(builtin_checks())
}

/// # Errors
/// Returns `DuplicateId` if the catalog repeats an id.
pub fn action_registry() -> Result<ActionRegistry, RegistryError> {
    ActionRegistry::from_rules(builtin_actions())
}
