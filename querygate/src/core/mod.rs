// Generic CRUD resource trait and the axum routes built on it

pub mod crud_operations;
pub mod traits;

// Re-export commonly used items
pub use crud_operations::crud_router;
pub use traits::{CrudResource, MergeIntoActiveModel};
