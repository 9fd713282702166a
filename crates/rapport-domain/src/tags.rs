//! Tag list normalization

/// Deduplicate a tag list by exact, case-sensitive string equality
///
/// First occurrence order is preserved; entries are trimmed and blank entries
/// dropped. `"A"` and `"a"` are distinct tags.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
