//! Per-element sessions and their construction

pub mod factory;
pub mod wrapper;

pub use factory::SessionFactory;
pub use wrapper::{CurrentCall, SessionInfo, SessionWrapper};
