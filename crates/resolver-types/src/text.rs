//! Text normalization shared by every index and cache key.

/// Normalize free text for lookup: trim surrounding whitespace, lowercase.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Normalize, returning `None` when nothing is left.
pub fn normalize_non_empty(text: &str) -> Option<String> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
