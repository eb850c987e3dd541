// Utility functions to generate consistent keys and URLs across the widget.

/// URL of a data resource with a cache-defeating `v` parameter so repeat
/// fetches always reach the origin.
pub fn make_resource_url(data_dir: &str, resource: &str, timestamp_ms: f64) -> String {
    format!("{}{}?v={}", data_dir, resource, timestamp_ms as u64)
}

/// DOM id of a sub-toggle checkbox: "category_name" with whitespace and
/// non-word characters stripped.
pub fn make_sub_toggle_id(category: &str, name: &str) -> String {
    format!("{}_{}", category, name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
