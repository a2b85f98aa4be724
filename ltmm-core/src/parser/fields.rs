//! Field normalisation for captured tag groups.

/// Split a comma-separated keyword list, trimming items and dropping blanks.
///
/// ```
/// use ltmm_core::parser::split_keywords;
/// assert_eq!(split_keywords("a, ,b,"), vec!["a", "b"]);
/// ```
#[must_use]
pub fn split_keywords(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an order field; anything that is not an integer yields `0`.
#[must_use]
pub fn parse_order(field: &str) -> i64 {
    field.trim().parse().unwrap_or(0)
}

/// Whether a flag field equals one of the configured constant markers.
/// Comparison is exact and case-sensitive after trimming.
#[must_use]
pub fn is_constant_flag(field: &str, markers: &[String]) -> bool {
    let field = field.trim();
    markers.iter().any(|marker| marker.trim() == field)
}
