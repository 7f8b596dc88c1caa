//! # querygate
//!
//! Dynamic filter / sort / pagination translation for Sea-ORM backed axum
//! APIs, and the typed client that talks to them.
//!
//! ## Server (`server` feature)
//!
//! Implement [`CrudResource`] for an entity's DTO and mount its routes:
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .merge(crud_router::<Supplier>())
//!     .merge(crud_router::<Vehicle>())
//!     .with_state(db);
//! ```
//!
//! `POST /suppliers/paginated` then accepts
//! `{pageNumber, pageSize, filters: [{id, value}], sorting: [{id, desc}]}`,
//! resolves each criterion against the declared field allow-list and
//! answers with a [`ResponseEnvelope`] around a [`PaginatedResult`].
//!
//! ## Client (`client` feature)
//!
//! [`client::RequestPipeline`] adds a shared response cache, bounded retries
//! and envelope validation to every call; [`client::EntityClient`] exposes
//! one family's operations on top of it.

pub mod envelope;
pub mod models;
pub mod validation;

#[cfg(feature = "server")]
pub mod core;
#[cfg(feature = "server")]
pub mod errors;
#[cfg(feature = "server")]
pub mod filtering;

#[cfg(feature = "client")]
pub mod client;

pub use envelope::{ENTITY_KEY, Messages, ResponseEnvelope, ResultStatus};
pub use models::{
    BulkDeleteRequest, CountRequest, FilterCriterion, PaginatedRequest, PaginatedResult,
    SelectOption, SortCriterion,
};
pub use validation::{Validatable, ValidationError, ValidationErrors};

#[cfg(feature = "server")]
pub use crate::core::{CrudResource, MergeIntoActiveModel, crud_router};
#[cfg(feature = "server")]
pub use errors::ApiError;
#[cfg(feature = "server")]
pub use filtering::{FieldDef, FieldKind, FieldResolver, SortKey, SpecificationBuilder};

pub use serde_with;
