//! # Specification Builder
//!
//! Turns the wire-level `filters` / `sorting` of a request into an
//! executable query: declared relations are joined, every resolvable
//! criterion is ANDed into one condition, and a single sort key is chosen.
//!
//! The builder never fails. Unknown fields, blank text values and values
//! that do not coerce are dropped; an unknown sort field falls back to the
//! entity's default order.

use sea_orm::{
    ColumnTrait, Condition, DatabaseBackend, EntityTrait, JoinType, Order, QueryFilter,
    QueryOrder, QuerySelect, RelationDef, Select,
    sea_query::{ColumnRef, SimpleExpr},
};

use super::resolver::{FieldResolver, column_ref};
use crate::models::{FilterCriterion, SortCriterion};

/// A resolved order: one column and a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    column: ColumnRef,
    order: Order,
}

impl SortKey {
    #[must_use]
    pub fn new(column: ColumnRef, order: Order) -> Self {
        Self { column, order }
    }

    pub fn asc<C: ColumnTrait>(column: C) -> Self {
        Self::new(column_ref(column), Order::Asc)
    }

    pub fn desc<C: ColumnTrait>(column: C) -> Self {
        Self::new(column_ref(column), Order::Desc)
    }

    #[must_use]
    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    #[must_use]
    pub fn order(&self) -> &Order {
        &self.order
    }
}

/// Builds a [`QuerySpecification`] for one entity.
pub struct SpecificationBuilder<'a> {
    resolver: &'a FieldResolver,
    backend: DatabaseBackend,
    default_sort: SortKey,
    eager_loads: Vec<RelationDef>,
    tie_breaker: Option<ColumnRef>,
}

impl<'a> SpecificationBuilder<'a> {
    #[must_use]
    pub fn new(resolver: &'a FieldResolver, backend: DatabaseBackend, default_sort: SortKey) -> Self {
        Self {
            resolver,
            backend,
            default_sort,
            eager_loads: Vec::new(),
            tie_breaker: None,
        }
    }

    /// Relations joined into every query so their columns can be filtered
    /// and sorted on. Intended for to-one relations.
    #[must_use]
    pub fn eager_loads(mut self, relations: impl IntoIterator<Item = RelationDef>) -> Self {
        self.eager_loads.extend(relations);
        self
    }

    /// Secondary order applied after the main sort key so that rows with
    /// equal sort values keep a stable position across pages.
    #[must_use]
    pub fn tie_breaker<C: ColumnTrait>(mut self, column: C) -> Self {
        self.tie_breaker = Some(column_ref(column));
        self
    }

    #[must_use]
    pub fn build(
        self,
        filters: &[FilterCriterion],
        sorting: Option<&[SortCriterion]>,
    ) -> QuerySpecification {
        let mut condition = Condition::all();
        let mut applied = Vec::new();
        let mut ignored = Vec::new();

        for criterion in filters {
            match self.resolver.predicate(criterion, self.backend) {
                Some(predicate) => {
                    condition = condition.add(predicate);
                    applied.push(criterion.id.clone());
                }
                None => {
                    tracing::debug!(
                        field = %criterion.id,
                        "ignoring filter on unknown field or uncoercible value"
                    );
                    ignored.push(criterion.id.clone());
                }
            }
        }

        let requested = sorting.and_then(<[SortCriterion]>::first);
        let dynamic = requested.and_then(|sort| {
            let column = self.resolver.sort_accessor(&sort.id)?;
            let order = if sort.desc { Order::Desc } else { Order::Asc };
            Some(SortKey::new(column, order))
        });
        let sort_fallback = requested.is_some() && dynamic.is_none();
        if sort_fallback {
            tracing::debug!(
                field = requested.map_or("", |sort| sort.id.as_str()),
                "unknown sort field, using default order"
            );
        }

        QuerySpecification {
            condition,
            joins: self.eager_loads,
            sort: dynamic.unwrap_or(self.default_sort),
            tie_breaker: self.tie_breaker,
            applied,
            ignored,
            sort_fallback,
        }
    }
}

/// A composed, executable query: joins + filter condition + order.
pub struct QuerySpecification {
    condition: Condition,
    joins: Vec<RelationDef>,
    sort: SortKey,
    tie_breaker: Option<ColumnRef>,
    applied: Vec<String>,
    ignored: Vec<String>,
    sort_fallback: bool,
}

impl QuerySpecification {
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    #[must_use]
    pub fn sort(&self) -> &SortKey {
        &self.sort
    }

    /// Ids of the criteria that became predicates.
    #[must_use]
    pub fn applied_filters(&self) -> &[String] {
        &self.applied
    }

    /// Ids of the criteria that were dropped.
    #[must_use]
    pub fn ignored_filters(&self) -> &[String] {
        &self.ignored
    }

    /// Whether a requested sort was replaced by the default order.
    #[must_use]
    pub fn used_default_sort_fallback(&self) -> bool {
        self.sort_fallback
    }

    /// Joins and filter only, for counting.
    pub fn apply_filter<E: EntityTrait>(self, select: Select<E>) -> Select<E> {
        let Self {
            condition, joins, ..
        } = self;
        joins
            .into_iter()
            .fold(select, |select, relation| select.join(JoinType::LeftJoin, relation))
            .filter(condition)
    }

    /// Joins, filter and order.
    pub fn apply<E: EntityTrait>(self, select: Select<E>) -> Select<E> {
        let Self {
            condition,
            joins,
            sort,
            tie_breaker,
            ..
        } = self;

        let mut select = joins
            .into_iter()
            .fold(select, |select, relation| select.join(JoinType::LeftJoin, relation))
            .filter(condition)
            .order_by(SimpleExpr::Column(sort.column.clone()), sort.order);

        if let Some(tie_breaker) = tie_breaker
            && tie_breaker != sort.column
        {
            select = select.order_by(SimpleExpr::Column(tie_breaker), Order::Asc);
        }
        select
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::resolver::tests::{person, person_fields};
    use sea_orm::{DbBackend, QueryTrait};

    fn build(
        fields: &FieldResolver,
        filters: &[FilterCriterion],
        sorting: Option<&[SortCriterion]>,
    ) -> QuerySpecification {
        SpecificationBuilder::new(fields, DbBackend::Sqlite, SortKey::desc(person::Column::CreatedOn))
            .tie_breaker(person::Column::Id)
            .build(filters, sorting)
    }

    fn sql(spec: QuerySpecification) -> String {
        spec.apply(person::Entity::find())
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn test_no_sorting_applies_default_sort_with_tie_breaker() {
        let fields = person_fields();
        let spec = build(&fields, &[], None);
        assert!(!spec.used_default_sort_fallback());

        let sql = sql(spec);
        assert!(
            sql.ends_with("ORDER BY \"people\".\"created_on\" DESC, \"people\".\"id\" ASC"),
            "{sql}"
        );
    }

    #[test]
    fn test_empty_sorting_list_applies_default_sort() {
        let fields = person_fields();
        let spec = build(&fields, &[], Some(&[]));
        assert_eq!(spec.sort(), &SortKey::desc(person::Column::CreatedOn));
        assert!(!spec.used_default_sort_fallback());
    }

    #[test]
    fn test_dynamic_sort_uses_resolved_field() {
        let fields = person_fields();
        let spec = build(&fields, &[], Some(&[SortCriterion::asc("NOME")]));
        assert_eq!(spec.sort(), &SortKey::asc(person::Column::Nome));

        let sql = sql(spec);
        assert!(
            sql.ends_with("ORDER BY \"people\".\"nome\" ASC, \"people\".\"id\" ASC"),
            "{sql}"
        );
    }

    #[test]
    fn test_only_first_sort_criterion_is_used() {
        let fields = person_fields();
        let sorting = [SortCriterion::desc("rating"), SortCriterion::asc("nome")];
        let spec = build(&fields, &[], Some(&sorting));
        assert_eq!(spec.sort(), &SortKey::desc(person::Column::Rating));
    }

    #[test]
    fn test_unknown_sort_field_falls_back_to_default() {
        let fields = person_fields();
        let spec = build(&fields, &[], Some(&[SortCriterion::asc("password")]));
        assert!(spec.used_default_sort_fallback());
        assert_eq!(spec.sort(), &SortKey::desc(person::Column::CreatedOn));
    }

    #[test]
    fn test_sort_by_id_skips_duplicate_tie_breaker() {
        let fields = FieldResolver::new(vec![
            crate::filtering::FieldDef::identifier("id", person::Column::Id).sortable(),
        ]);
        let sql = sql(build(&fields, &[], Some(&[SortCriterion::desc("id")])));
        assert!(sql.ends_with("ORDER BY \"people\".\"id\" DESC"), "{sql}");
    }

    #[test]
    fn test_filters_are_anded_and_unknown_ones_dropped() {
        let fields = person_fields();
        let filters = [
            FilterCriterion::new("nome", "Ana"),
            FilterCriterion::new("nmoe", "typo"),
            FilterCriterion::new("active", "true"),
            FilterCriterion::new("rating", "not-a-number"),
        ];
        let spec = build(&fields, &filters, None);

        assert_eq!(spec.applied_filters(), ["nome".to_string(), "active".to_string()]);
        assert_eq!(spec.ignored_filters(), ["nmoe".to_string(), "rating".to_string()]);

        let sql = sql(spec);
        assert!(sql.contains("INSTR(LOWER(\"people\".\"nome\"), LOWER('Ana')) > 0 AND"), "{sql}");
        assert!(sql.contains("\"people\".\"active\" = TRUE"), "{sql}");
        assert!(!sql.contains("typo"), "{sql}");
    }

    #[test]
    fn test_unknown_criterion_is_equivalent_to_its_absence() {
        let fields = person_fields();
        let with_unknown = [FilterCriterion::new("nome", "Ana"), FilterCriterion::new("ghost", "x")];
        let without = [FilterCriterion::new("nome", "Ana")];

        assert_eq!(
            sql(build(&fields, &with_unknown, None)),
            sql(build(&fields, &without, None))
        );
    }

    #[test]
    fn test_blank_text_criterion_is_equivalent_to_no_filter() {
        let fields = person_fields();
        assert_eq!(
            sql(build(&fields, &[FilterCriterion::new("nome", "   ")], None)),
            sql(build(&fields, &[], None))
        );
    }
}
