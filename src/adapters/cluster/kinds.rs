//! API kinds the built-in catalog and cluster primitives touch.
use super::ResourceKind;

#[must_use]
pub fn data_science_cluster() -> ResourceKind {
    ResourceKind::new("datasciencecluster.opendatahub.io", "v1", "DataScienceCluster", false)
}

#[must_use]
pub fn dsc_initialization() -> ResourceKind {
    ResourceKind::new("dscinitialization.opendatahub.io", "v1", "DSCInitialization", false)
}

#[must_use]
pub fn subscription() -> ResourceKind {
    ResourceKind::new("operators.coreos.com", "v1alpha1", "Subscription", true)
}

#[must_use]
pub fn cluster_service_version() -> ResourceKind {
    ResourceKind::new("operators.coreos.com", "v1alpha1", "ClusterServiceVersion", true)
}

#[must_use]
pub fn inference_service() -> ResourceKind {
    ResourceKind::new("serving.kserve.io", "v1beta1", "InferenceService", true)
}

/// Every kind above, used when loading fixtures by `kind` name.
#[must_use]
pub fn known() -> Vec<ResourceKind> {
    vec![
        data_science_cluster(),
        dsc_initialization(),
        subscription(),
        cluster_service_version(),
        inference_service(),
    ]
}
