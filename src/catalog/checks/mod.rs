mod components;
mod dependencies;
mod services;
mod workloads;

pub use components::ManagementStateRemoval;
pub use dependencies::CertManagerInstalled;
pub use services::ServiceMeshDeprecation;
pub use workloads::ServerlessInferenceService;
