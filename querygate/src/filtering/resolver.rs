//! # Field Resolver
//!
//! Each entity declares the fields clients may filter and sort on. A
//! criterion `id` is looked up case-insensitively; ids that match nothing
//! resolve to `None` and the criterion is dropped.
//!
//! ```rust,ignore
//! FieldResolver::new(vec![
//!     FieldDef::text("nome", Column::Nome).sortable(),
//!     FieldDef::identifier("countryId", Column::CountryId),
//!     FieldDef::boolean("active", Column::Active),
//!     FieldDef::numeric("rating", Column::Rating).sortable(),
//!     FieldDef::date("createdOn", Column::CreatedOn).sortable(),
//!     // columns of eagerly loaded relations resolve the same way
//!     FieldDef::text("countryName", country::Column::Nome).sortable(),
//! ])
//! ```
//!
//! Numeric and date fields also accept range suffixes: `rating_gte`,
//! `createdOn_lt` and so on. An exact field name always wins over suffix
//! parsing.

use sea_orm::{
    ColumnTrait, DatabaseBackend,
    sea_query::{Alias, ColumnRef, Expr, Func, IntoColumnRef, SimpleExpr},
};

use super::coercion::{
    day_bounds, is_acceptable_value, is_blank, is_valid_field_name, parse_bool, parse_date,
    parse_decimal, parse_identifier,
};
use crate::models::FilterCriterion;

/// How a string value is coerced and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Case-insensitive substring containment. Blank values are ignored.
    Text,
    /// Equality against a UUID column.
    Identifier,
    /// Equality against `true` / `false`.
    Boolean,
    /// Equality (or range) against a decimal value.
    Numeric,
    /// Date-only equality (or range) against a timestamp column.
    Date,
}

impl FieldKind {
    const fn supports_ranges(self) -> bool {
        matches!(self, Self::Numeric | Self::Date)
    }
}

/// Comparison carried by a criterion id suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gte,
    Lte,
    Gt,
    Lt,
}

impl RangeOp {
    // Longer suffixes first so `_gte` is not read as `_gt`.
    const SUFFIXES: [(&'static str, Self); 4] = [
        ("_gte", Self::Gte),
        ("_lte", Self::Lte),
        ("_gt", Self::Gt),
        ("_lt", Self::Lt),
    ];

    /// Split `createdOn_gte` into `("createdOn", Gte)`.
    #[must_use]
    pub fn split(id: &str) -> Option<(&str, Self)> {
        Self::SUFFIXES.iter().find_map(|(suffix, op)| {
            id.strip_suffix(suffix)
                .filter(|base| !base.is_empty())
                .map(|base| (base, *op))
        })
    }
}

/// Qualified `table.column` reference for a Sea-ORM column.
#[must_use]
pub fn column_ref<C: ColumnTrait>(column: C) -> ColumnRef {
    (column.entity_name(), column).into_column_ref()
}

/// A field clients may reference by name.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: &'static str,
    column: ColumnRef,
    kind: FieldKind,
    filterable: bool,
    sortable: bool,
}

impl FieldDef {
    pub fn new<C: ColumnTrait>(name: &'static str, column: C, kind: FieldKind) -> Self {
        Self {
            name,
            column: column_ref(column),
            kind,
            filterable: true,
            sortable: false,
        }
    }

    pub fn text<C: ColumnTrait>(name: &'static str, column: C) -> Self {
        Self::new(name, column, FieldKind::Text)
    }

    pub fn identifier<C: ColumnTrait>(name: &'static str, column: C) -> Self {
        Self::new(name, column, FieldKind::Identifier)
    }

    pub fn boolean<C: ColumnTrait>(name: &'static str, column: C) -> Self {
        Self::new(name, column, FieldKind::Boolean)
    }

    pub fn numeric<C: ColumnTrait>(name: &'static str, column: C) -> Self {
        Self::new(name, column, FieldKind::Numeric)
    }

    pub fn date<C: ColumnTrait>(name: &'static str, column: C) -> Self {
        Self::new(name, column, FieldKind::Date)
    }

    /// Also allow sorting by this field.
    #[must_use]
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Allow sorting but not filtering by this field.
    #[must_use]
    pub fn sort_only(mut self) -> Self {
        self.sortable = true;
        self.filterable = false;
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    #[must_use]
    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    #[must_use]
    pub fn is_sortable(&self) -> bool {
        self.sortable
    }
}

/// A criterion id matched against a declared field.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedField<'a> {
    field: &'a FieldDef,
    range: Option<RangeOp>,
}

impl ResolvedField<'_> {
    #[must_use]
    pub fn field(&self) -> &FieldDef {
        self.field
    }

    #[must_use]
    pub fn range(&self) -> Option<RangeOp> {
        self.range
    }

    /// The predicate for `value`, or `None` when the value is blank (text),
    /// fails to coerce, or the field does not accept filters.
    #[must_use]
    pub fn predicate(&self, value: &str, backend: DatabaseBackend) -> Option<SimpleExpr> {
        if !self.field.filterable || !is_acceptable_value(value) {
            return None;
        }

        let column = &self.field.column;
        match (self.field.kind, self.range) {
            (FieldKind::Text, _) => {
                if is_blank(value) {
                    None
                } else {
                    Some(contains(column, value, backend))
                }
            }
            (FieldKind::Identifier, _) => {
                parse_identifier(value).map(|id| Expr::col(column.clone()).eq(id))
            }
            (FieldKind::Boolean, _) => {
                parse_bool(value).map(|flag| Expr::col(column.clone()).eq(flag))
            }
            (FieldKind::Numeric, None) => {
                parse_decimal(value).map(|number| Expr::col(column.clone()).eq(number))
            }
            (FieldKind::Numeric, Some(op)) => parse_decimal(value).map(|number| {
                let col = Expr::col(column.clone());
                match op {
                    RangeOp::Gte => col.gte(number),
                    RangeOp::Lte => col.lte(number),
                    RangeOp::Gt => col.gt(number),
                    RangeOp::Lt => col.lt(number),
                }
            }),
            (FieldKind::Date, range) => {
                let (start, end) = parse_date(value).and_then(day_bounds)?;
                let col = || Expr::col(column.clone());
                Some(match range {
                    None => col().gte(start).and(col().lt(end)),
                    Some(RangeOp::Gte) => col().gte(start),
                    Some(RangeOp::Lte) => col().lt(end),
                    Some(RangeOp::Gt) => col().gte(end),
                    Some(RangeOp::Lt) => col().lt(start),
                })
            }
        }
    }

    /// Column to order by, when the field is sortable. Range-suffixed ids
    /// never sort.
    #[must_use]
    pub fn sort_accessor(&self) -> Option<ColumnRef> {
        (self.range.is_none() && self.field.sortable).then(|| self.field.column.clone())
    }
}

/// Case-insensitive substring match that behaves the same on every backend.
/// The needle is matched literally, `%` and `_` included.
fn contains(column: &ColumnRef, needle: &str, backend: DatabaseBackend) -> SimpleExpr {
    let function = match backend {
        DatabaseBackend::Postgres => "STRPOS",
        _ => "INSTR",
    };
    let call = Func::cust(Alias::new(function))
        .arg(Func::lower(Expr::col(column.clone())))
        .arg(Func::lower(Expr::val(needle)));
    Expr::expr(call).gt(0)
}

/// The declared field set of one entity.
#[derive(Debug, Clone, Default)]
pub struct FieldResolver {
    fields: Vec<FieldDef>,
}

impl FieldResolver {
    #[must_use]
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    fn find(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Match `id` against the declared fields, trying range suffixes only
    /// when no field carries the exact name.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<ResolvedField<'_>> {
        if !is_valid_field_name(id) {
            return None;
        }

        if let Some(field) = self.find(id) {
            return Some(ResolvedField { field, range: None });
        }

        let (base, op) = RangeOp::split(id)?;
        self.find(base)
            .filter(|field| field.kind.supports_ranges())
            .map(|field| ResolvedField {
                field,
                range: Some(op),
            })
    }

    /// Predicate for a wire criterion; `None` means "drop it".
    #[must_use]
    pub fn predicate(
        &self,
        criterion: &FilterCriterion,
        backend: DatabaseBackend,
    ) -> Option<SimpleExpr> {
        self.resolve(&criterion.id)?
            .predicate(&criterion.value, backend)
    }

    #[must_use]
    pub fn sort_accessor(&self, id: &str) -> Option<ColumnRef> {
        self.resolve(id)?.sort_accessor()
    }

    /// Names of the sortable fields, for documentation and error pages.
    pub fn sortable_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|field| field.sortable)
            .map(|field| field.name)
    }
}
