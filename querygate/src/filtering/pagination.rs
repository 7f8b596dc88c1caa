use axum::http::{HeaderMap, HeaderValue, header::CONTENT_RANGE};

use crate::models::PaginatedResult;

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// Build the `Content-Range` header for one page of results.
///
/// The range is `{resource} {first}-{last}/{total}` with zero-based,
/// inclusive item indices. An empty page is reported as `{resource} */{total}`.
/// If the resource name contains invalid header characters it is sanitized.
#[must_use]
pub fn calculate_content_range<T>(result: &PaginatedResult<T>, resource_name: &str) -> HeaderMap {
    let safe_name = sanitize_resource_name(resource_name);
    let total = result.total_count;

    let content_range = if result.items.is_empty() {
        format!("{safe_name} */{total}")
    } else {
        let first = result
            .page_number
            .saturating_sub(1)
            .saturating_mul(result.page_size);
        let last = first.saturating_add(result.items.len() as u64 - 1);
        format!("{safe_name} {first}-{last}/{total}")
    };

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&content_range)
        .unwrap_or_else(|_| HeaderValue::from_static("items */0"));
    headers.insert(CONTENT_RANGE, value);
    headers
}
