//! # Dynamic Filtering & Sorting
//!
//! Translates the wire-level `{id, value}` filters and `{id, desc}` sort
//! requests into Sea-ORM conditions and orderings.
//!
//! ## Main Components
//!
//! - **[`FieldResolver`]**: the per-entity allow-list of filterable and
//!   sortable fields, each with a [`FieldKind`] that decides coercion
//! - **[`SpecificationBuilder`]**: ANDs the resolved predicates, joins the
//!   eager-loaded relations and picks the sort key
//! - **[`calculate_content_range`]**: the `Content-Range` header for a page
//!
//! ## Request Examples
//!
//! ```json
//! POST /suppliers/paginated
//! {
//!   "pageNumber": 1,
//!   "pageSize": 20,
//!   "filters": [
//!     {"id": "nome", "value": "Ana"},
//!     {"id": "active", "value": "true"},
//!     {"id": "createdOn_gte", "value": "2024-01-01"}
//!   ],
//!   "sorting": [{"id": "rating", "desc": true}]
//! }
//! ```
//!
//! ## Coercion
//!
//! | Kind         | Accepted values                            | Predicate                  |
//! |--------------|--------------------------------------------|----------------------------|
//! | `Text`       | any non-blank string                       | case-insensitive substring |
//! | `Identifier` | UUID                                       | equality                   |
//! | `Boolean`    | `true` / `false` (any case)                | equality                   |
//! | `Numeric`    | decimal, optionally in scientific notation | equality or range          |
//! | `Date`       | `2024-03-15`, `15/03/2024`, RFC 3339       | whole day, or day range    |
//!
//! A value that does not coerce drops its criterion. So does a criterion
//! whose id matches no declared field: a typo never fails a query.

pub mod coercion;
pub mod pagination;
pub mod resolver;
pub mod specification;

pub use pagination::calculate_content_range;
pub use resolver::{FieldDef, FieldKind, FieldResolver, RangeOp, ResolvedField, column_ref};
pub use specification::{QuerySpecification, SortKey, SpecificationBuilder};
