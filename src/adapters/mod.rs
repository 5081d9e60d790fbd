pub mod cluster;
pub mod detect;
pub mod prompt;

pub use cluster::{kinds, ClusterClient, MemoryCluster, Resource, ResourceKind};
pub use detect::*;
pub use prompt::*;
