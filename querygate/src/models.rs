use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;

/// A single filter as sent over the wire.
///
/// `id` names a field declared by the entity (matched case-insensitively) and
/// `value` is always a string that gets coerced according to the field's kind:
///
/// ```json
/// {"id": "nome", "value": "Ana"}
/// {"id": "countryId", "value": "550e8400-e29b-41d4-a716-446655440000"}
/// {"id": "createdOn_gte", "value": "2024-01-01"}
/// ```
///
/// Criteria naming unknown fields, or carrying values that fail to coerce,
/// are dropped rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilterCriterion {
    pub id: String,
    pub value: String,
}

impl FilterCriterion {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// A sort request. Only the first criterion of a list is honoured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SortCriterion {
    pub id: String,
    #[serde(default)]
    pub desc: bool,
}

impl SortCriterion {
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: false,
        }
    }

    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: true,
        }
    }
}

const fn default_page_number() -> u64 {
    1
}

/// Body of `POST /{family}/paginated`.
///
/// `filters: null` is accepted and treated as an empty list. A missing or
/// empty `sorting` selects the entity's default order.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedRequest {
    #[serde(default = "default_page_number")]
    pub page_number: u64,
    #[serde(default)]
    pub page_size: u64,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub filters: Vec<FilterCriterion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<Vec<SortCriterion>>,
}

impl PaginatedRequest {
    #[must_use]
    pub fn new(page_number: u64, page_size: u64) -> Self {
        Self {
            page_number,
            page_size,
            filters: Vec::new(),
            sorting: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(FilterCriterion::new(id, value));
        self
    }

    #[must_use]
    pub fn sort(mut self, criterion: SortCriterion) -> Self {
        self.sorting.get_or_insert_with(Vec::new).push(criterion);
        self
    }

    /// Clamp the page coordinates into the accepted range.
    ///
    /// A page number below one becomes one, a zero page size becomes
    /// `default_size` and anything above `max_size` is capped.
    #[must_use]
    pub fn normalized(mut self, default_size: u64, max_size: u64) -> Self {
        self.page_number = self.page_number.max(1);
        if self.page_size == 0 {
            self.page_size = default_size;
        }
        self.page_size = self.page_size.clamp(1, max_size.max(1));
        self
    }

    /// Row offset of the first item on the requested page, or `None` when
    /// it overflows a `u64`.
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        self.page_number.saturating_sub(1).checked_mul(self.page_size)
    }
}

/// Body of `POST /{family}/count`.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountRequest {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub filters: Vec<FilterCriterion>,
}

/// One page of results.
///
/// `total_pages` is always `ceil(total_count / page_size)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub page_number: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResult<T> {
    #[must_use]
    pub fn new(items: Vec<T>, page_number: u64, page_size: u64, total_count: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_count.div_ceil(page_size)
        };
        Self {
            items,
            page_number,
            page_size,
            total_count,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

/// Body of `DELETE /{family}/bulk`. Ids travel as strings so that malformed
/// entries can be reported individually.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

impl BulkDeleteRequest {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            ids: ids.into_iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// An `{id, label}` pair used to populate select inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SelectOption {
    pub id: Uuid,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_total_pages_rounds_up() {
        let page: PaginatedResult<u8> = PaginatedResult::new(vec![], 1, 10, 21);
        assert_eq!(page.total_pages, 3);

        let page: PaginatedResult<u8> = PaginatedResult::new(vec![], 1, 10, 20);
        assert_eq!(page.total_pages, 2);

        let page: PaginatedResult<u8> = PaginatedResult::new(vec![], 1, 10, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_request_deserializes_null_filters_and_sorting() {
        let request: PaginatedRequest = serde_json::from_value(json!({
            "pageNumber": 2,
            "pageSize": 5,
            "filters": null,
            "sorting": null
        }))
        .unwrap();

        assert_eq!(request.page_number, 2);
        assert_eq!(request.page_size, 5);
        assert!(request.filters.is_empty());
        assert!(request.sorting.is_none());
    }

    #[test]
    fn test_request_defaults_when_fields_missing() {
        let request: PaginatedRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.page_number, 1);
        assert_eq!(request.page_size, 0);
        assert!(request.filters.is_empty());
    }

    #[test]
    fn test_sort_desc_defaults_to_false() {
        let sort: SortCriterion = serde_json::from_value(json!({"id": "nome"})).unwrap();
        assert!(!sort.desc);
    }

    #[test]
    fn test_normalized_clamps_page_coordinates() {
        let request = PaginatedRequest::new(0, 0).normalized(10, 100);
        assert_eq!(request.page_number, 1);
        assert_eq!(request.page_size, 10);

        let request = PaginatedRequest::new(3, 5000).normalized(10, 100);
        assert_eq!(request.page_size, 100);
        assert_eq!(request.offset(), Some(200));
    }

    #[test]
    fn test_offset_overflow_is_none() {
        let request = PaginatedRequest::new(u64::MAX / 10 + 2, 10).normalized(10, 100);
        assert_eq!(request.offset(), None);

        let request = PaginatedRequest::new(u64::MAX, 1).normalized(10, 100);
        assert_eq!(request.offset(), Some(u64::MAX - 1));
    }

    #[test]
    fn test_builder_accumulates_filters_and_sorting() {
        let request = PaginatedRequest::new(1, 10)
            .filter("nome", "Ana")
            .filter("active", "true")
            .sort(SortCriterion::desc("createdOn"));

        assert_eq!(request.filters.len(), 2);
        assert_eq!(request.sorting, Some(vec![SortCriterion::desc("createdOn")]));

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["pageNumber"], 1);
        assert_eq!(wire["filters"][0]["id"], "nome");
    }
}
