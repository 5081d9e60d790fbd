pub mod action;
pub mod deadline;
pub mod diagnostic;
pub mod errors;
pub mod group;
pub mod ids;
pub mod target;
pub mod version;

pub use action::*;
pub use deadline::Deadline;
pub use diagnostic::*;
pub use errors::{Error, ErrorKind, Result};
pub use group::{ActionGroup, CheckGroup, Group};
pub use ids::*;
pub use target::Target;
pub use version::Version;
