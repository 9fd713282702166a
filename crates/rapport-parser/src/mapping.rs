//! Field-name canonicalization
//!
//! LLM responses name the same field many ways, often localized. The mapper
//! rewrites alternate key names to the canonical camelCase schema via an
//! exact pass and an opt-in fuzzy (edit-distance) pass. The mapping table is
//! process-wide: a static base table (built-in or loaded from a TOML
//! resource) plus a thread-safe dynamic overlay mutated through explicit
//! add/clear calls.

use crate::context::MappingContext;
use crate::synonyms;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// One canonical field and its ordered localized variants
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FieldEntry {
    /// Canonical camelCase field name
    pub canonical: String,
    /// Alternate key names, consulted in declared order
    pub variants: Vec<String>,
}

/// Ordered mapping table: canonical field → ordered variant list
///
/// Entry order is significant; it is the tie-break for fuzzy matches.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTable(pub Vec<FieldEntry>);

#[derive(Debug, Deserialize)]
struct FieldTableConfig {
    field: Vec<FieldEntry>,
}

impl FieldTable {
    /// Built-in default table covering the canonical schema
    pub fn default_table() -> Self {
        fn entry(canonical: &str, variants: &[&str]) -> FieldEntry {
            FieldEntry {
                canonical: canonical.to_string(),
                variants: variants.iter().map(|v| v.to_string()).collect(),
            }
        }
        FieldTable(vec![
            entry("replySuggestion", &synonyms::REPLY_SYNONYMS),
            entry("strategyAnalysis", &synonyms::STRATEGY_SYNONYMS),
            entry("riskLevel", &synonyms::RISK_LEVEL_SYNONYMS),
            entry("isSafe", &synonyms::IS_SAFE_SYNONYMS),
            entry("triggeredRisks", &synonyms::TRIGGERED_RISKS_SYNONYMS),
            entry("suggestion", &synonyms::SUGGESTION_SYNONYMS),
            entry("facts", &synonyms::FACTS_SYNONYMS),
            entry("redTags", &synonyms::RED_TAGS_SYNONYMS),
            entry("greenTags", &synonyms::GREEN_TAGS_SYNONYMS),
        ])
    }

    /// Parse a table from a TOML resource
    ///
    /// Expected shape:
    ///
    /// ```toml
    /// [[field]]
    /// canonical = "replySuggestion"
    /// variants = ["回复建议", "建议回复"]
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: FieldTableConfig =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse field table: {}", e))?;
        if config.field.is_empty() {
            return Err("field table is empty".to_string());
        }
        Ok(FieldTable(config.field))
    }

    /// Parse a table from TOML, silently falling back to the built-in default
    /// table when the resource is malformed
    pub fn from_toml_or_default(toml_str: &str) -> Self {
        match Self::from_toml(toml_str) {
            Ok(table) => table,
            Err(e) => {
                warn!("field mapping resource unusable, using built-in defaults: {}", e);
                Self::default_table()
            }
        }
    }
}

/// Rewrites alternate JSON key names to canonical names
///
/// Thread-safe: many parse calls may share one mapper across worker threads.
/// The dynamic overlay is the only mutable state and is guarded by a lock;
/// the merged table is cached and the cache invalidated on every overlay
/// mutation.
pub struct FieldMapper {
    base: FieldTable,
    overlay: RwLock<Vec<FieldEntry>>,
    merged_cache: RwLock<Option<Arc<FieldTable>>>,
}

impl FieldMapper {
    /// Create a mapper over the built-in default table
    pub fn new() -> Self {
        Self::with_table(FieldTable::default_table())
    }

    /// Create a mapper over an explicit base table
    pub fn with_table(base: FieldTable) -> Self {
        Self {
            base,
            overlay: RwLock::new(Vec::new()),
            merged_cache: RwLock::new(None),
        }
    }

    /// Rewrite alternate key names in `json` to canonical names
    ///
    /// Exact replacements run first, in table order then variant order. When
    /// the context enables it, a fuzzy pass then rewrites remaining
    /// non-identifier-shaped keys whose best similarity to any variant meets
    /// the threshold. Any internal failure degrades to returning the input
    /// unchanged; a fuzzy failure disables the fuzzy pass for this call only.
    pub fn map_fields(&self, json: &str, context: &MappingContext) -> String {
        let table = self.merged_table();

        let exact = match exact_pass(json, &table) {
            Ok(mapped) => mapped,
            Err(e) => {
                warn!("exact field mapping failed, returning input unchanged: {}", e);
                return json.to_string();
            }
        };

        if !context.enable_fuzzy {
            return exact;
        }
        match fuzzy_pass(&exact, &table, context) {
            Ok(mapped) => mapped,
            Err(e) => {
                warn!("fuzzy field mapping failed, keeping exact result: {}", e);
                exact
            }
        }
    }

    /// Add (or replace) a dynamic mapping, invalidating the merged cache
    pub fn add_mapping(&self, canonical: impl Into<String>, variants: Vec<String>) {
        let canonical = canonical.into();
        debug!(canonical = %canonical, ?variants, "adding dynamic field mapping");
        {
            let mut overlay = self.overlay.write().unwrap_or_else(|e| e.into_inner());
            if let Some(existing) = overlay.iter_mut().find(|e| e.canonical == canonical) {
                existing.variants = variants;
            } else {
                overlay.push(FieldEntry { canonical, variants });
            }
        }
        self.invalidate_cache();
    }

    /// Drop every dynamic mapping, invalidating the merged cache
    pub fn clear_mappings(&self) {
        self.overlay.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.invalidate_cache();
    }

    /// Snapshot of the merged table (base plus overlay)
    pub fn all_mappings(&self) -> Vec<FieldEntry> {
        self.merged_table().0.clone()
    }

    /// Learn a mapping from observed candidates
    ///
    /// Candidates with `confidence` below 0.5 are rejected outright. The best
    /// candidate is committed only when its similarity to the field's known
    /// variants exceeds the supplied confidence.
    pub fn learn_mapping(&self, canonical: &str, candidates: &[String], confidence: f64) {
        const LEARN_REJECT_THRESHOLD: f64 = 0.5;
        if confidence < LEARN_REJECT_THRESHOLD {
            warn!(
                canonical,
                confidence, "learn_mapping confidence below reject threshold, skipping"
            );
            return;
        }

        let table = self.merged_table();
        let known: Vec<String> = table
            .0
            .iter()
            .find(|e| e.canonical == canonical)
            .map(|e| e.variants.clone())
            .unwrap_or_default();

        let mut best: Option<(&String, f64)> = None;
        for candidate in candidates {
            let score = known
                .iter()
                .map(|variant| similarity(candidate, variant))
                .fold(0.0f64, f64::max);
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((candidate, score));
            }
        }

        if let Some((candidate, score)) = best {
            if score > confidence {
                debug!(canonical, candidate = %candidate, score, "learned new field mapping");
                self.add_mapping(canonical, vec![candidate.clone()]);
            }
        }
    }

    /// Aggregate statistics over the merged table
    pub fn statistics(&self) -> MappingStatistics {
        let table = self.merged_table();
        let total_fields = table.0.len();
        let total_variants: usize = table.0.iter().map(|e| e.variants.len()).sum();
        let dynamic_fields = self.overlay.read().unwrap_or_else(|e| e.into_inner()).len();
        MappingStatistics {
            total_fields,
            total_variants,
            dynamic_fields,
        }
    }

    fn merged_table(&self) -> Arc<FieldTable> {
        if let Some(cached) = self
            .merged_cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            return Arc::clone(cached);
        }

        // Recompute while holding the cache write lock: an invalidation that
        // lands after a lock-free merge would be overwritten by a stale table.
        // Mutators never hold the overlay lock while taking this one.
        let mut cache = self.merged_cache.write().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.as_ref() {
            return Arc::clone(cached);
        }

        let mut merged = self.base.0.clone();
        {
            let overlay = self.overlay.read().unwrap_or_else(|e| e.into_inner());
            for entry in overlay.iter() {
                if let Some(existing) = merged.iter_mut().find(|e| e.canonical == entry.canonical) {
                    existing.variants = entry.variants.clone();
                } else {
                    merged.push(entry.clone());
                }
            }
        }
        let table = Arc::new(FieldTable(merged));
        *cache = Some(Arc::clone(&table));
        table
    }

    fn invalidate_cache(&self) {
        *self.merged_cache.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate numbers about the merged mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingStatistics {
    /// Canonical fields in the merged table
    pub total_fields: usize,
    /// Variants across all fields
    pub total_variants: usize,
    /// Fields contributed or overridden by the dynamic overlay
    pub dynamic_fields: usize,
}

/// Replace quoted-key occurrences of each variant with its canonical name
fn exact_pass(json: &str, table: &FieldTable) -> Result<String, String> {
    let mut result = json.to_string();
    for entry in &table.0 {
        for variant in &entry.variants {
            let pattern = format!("\"{}\"(\\s*:)", regex::escape(variant));
            let re = Regex::new(&pattern).map_err(|e| e.to_string())?;
            let replacement = format!("\"{}\"$1", entry.canonical);
            result = re.replace_all(&result, replacement.as_str()).into_owned();
        }
    }
    Ok(result)
}

/// Rewrite remaining non-identifier keys whose best variant similarity meets
/// the threshold
fn fuzzy_pass(json: &str, table: &FieldTable, context: &MappingContext) -> Result<String, String> {
    let key_re = Regex::new(r#""([^"]+)"\s*:"#).map_err(|e| e.to_string())?;
    let ident_re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| e.to_string())?;

    let keys: Vec<String> = key_re
        .captures_iter(json)
        .map(|c| c[1].to_string())
        .collect();

    let mut result = json.to_string();
    for key in keys {
        if ident_re.is_match(&key) {
            continue;
        }
        // Strict > keeps the first (table-order, variant-order) pair on ties
        let mut best: Option<(&str, f64)> = None;
        for entry in &table.0 {
            for variant in &entry.variants {
                let score = similarity(&key, variant);
                if score >= context.fuzzy_threshold && best.map(|(_, s)| score > s).unwrap_or(true)
                {
                    best = Some((entry.canonical.as_str(), score));
                }
            }
        }
        if let Some((canonical, score)) = best {
            if context.detailed_logging {
                debug!(key = %key, canonical, score, "fuzzy field match");
            }
            let pattern = format!("\"{}\"(\\s*:)", regex::escape(&key));
            let re = Regex::new(&pattern).map_err(|e| e.to_string())?;
            let replacement = format!("\"{}\"$1", canonical);
            result = re.replace_all(&result, replacement.as_str()).into_owned();
        }
    }
    Ok(result)
}

/// Similarity in `[0, 1]`: `1 - levenshtein / max_len`, case-insensitive
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(&a, &b) as f64 / max_len as f64)
}

/// Levenshtein edit distance over chars, two-row dynamic programming
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, &a_ch) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &b_ch) in b_chars.iter().enumerate() {
            let cost = usize::from(a_ch != b_ch);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuzzy_ctx() -> MappingContext {
        MappingContext::default().with_fuzzy(0.7)
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("同样", "同样"), 0);
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert!(similarity("abc", "xyz") < 0.5);
    }

    #[test]
    fn test_exact_pass_rewrites_localized_keys() {
        let mapper = FieldMapper::new();
        let json = r#"{"回复建议":"你好","策略分析":"友好","风险等级":"SAFE"}"#;
        let mapped = mapper.map_fields(json, &MappingContext::default());
        assert!(mapped.contains("\"replySuggestion\""));
        assert!(mapped.contains("\"strategyAnalysis\""));
        assert!(mapped.contains("\"riskLevel\""));
        assert!(!mapped.contains("回复建议"));
    }

    #[test]
    fn test_exact_pass_leaves_values_alone() {
        let mapper = FieldMapper::new();
        // "建议" appears as a value, not a key: it must survive
        let json = r#"{"suggestion":"建议多聊爱好"}"#;
        let mapped = mapper.map_fields(json, &MappingContext::default());
        assert!(mapped.contains("建议多聊爱好"));
    }

    #[test]
    fn test_map_fields_is_idempotent() {
        let mapper = FieldMapper::new();
        let json = r#"{"回复建议":"你好","雷区":["前任"]}"#;
        let once = mapper.map_fields(json, &fuzzy_ctx());
        let twice = mapper.map_fields(&once, &fuzzy_ctx());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_fuzzy_pass_matches_near_miss_key() {
        let mapper = FieldMapper::new();
        // One character off from the known variant "回复建议"
        let json = r#"{"回复建义":"你好"}"#;
        let mapped = mapper.map_fields(json, &fuzzy_ctx());
        assert!(mapped.contains("\"replySuggestion\""));
    }

    #[test]
    fn test_fuzzy_pass_skips_identifier_keys() {
        let mapper = FieldMapper::new();
        let json = r#"{"some_other_key":"x"}"#;
        let mapped = mapper.map_fields(json, &fuzzy_ctx());
        assert!(mapped.contains("some_other_key"));
    }

    #[test]
    fn test_fuzzy_disabled_without_flag() {
        let mapper = FieldMapper::new();
        let json = r#"{"回复建义":"你好"}"#;
        let mapped = mapper.map_fields(json, &MappingContext::default());
        assert!(mapped.contains("回复建义"));
    }

    #[test]
    fn test_add_mapping_takes_effect_and_invalidates_cache() {
        let mapper = FieldMapper::new();
        // Warm the cache first
        let _ = mapper.map_fields("{}", &MappingContext::default());
        mapper.add_mapping("replySuggestion", vec!["机器人回话".to_string()]);
        let mapped = mapper.map_fields(r#"{"机器人回话":"hi"}"#, &MappingContext::default());
        assert!(mapped.contains("\"replySuggestion\""));
    }

    #[test]
    fn test_clear_mappings_restores_base() {
        let mapper = FieldMapper::new();
        mapper.add_mapping("replySuggestion", vec!["机器人回话".to_string()]);
        mapper.clear_mappings();
        let mapped = mapper.map_fields(r#"{"机器人回话":"hi"}"#, &MappingContext::default());
        assert!(mapped.contains("机器人回话"));
        // Base variants still apply
        let mapped = mapper.map_fields(r#"{"回复建议":"hi"}"#, &MappingContext::default());
        assert!(mapped.contains("\"replySuggestion\""));
    }

    #[test]
    fn test_learn_mapping_rejects_low_confidence() {
        let mapper = FieldMapper::new();
        let before = mapper.statistics();
        mapper.learn_mapping("replySuggestion", &["回复文案".to_string()], 0.3);
        assert_eq!(mapper.statistics(), before);
    }

    #[test]
    fn test_learn_mapping_commits_similar_candidate() {
        let mapper = FieldMapper::new();
        // "回复建议X" is close to the known variant "回复建议"
        mapper.learn_mapping("replySuggestion", &["回复建议X".to_string()], 0.6);
        assert!(mapper.statistics().dynamic_fields > 0);
    }

    #[test]
    fn test_from_toml_loads_ordered_table() {
        let toml_str = r#"
[[field]]
canonical = "replySuggestion"
variants = ["回复建议"]

[[field]]
canonical = "riskLevel"
variants = ["风险等级"]
"#;
        let table = FieldTable::from_toml(toml_str).unwrap();
        assert_eq!(table.0[0].canonical, "replySuggestion");
        assert_eq!(table.0[1].canonical, "riskLevel");
    }

    #[test]
    fn test_malformed_toml_falls_back_to_defaults() {
        let table = FieldTable::from_toml_or_default("not [ valid toml");
        assert_eq!(table, FieldTable::default_table());
        // The fallback table still maps correctly
        let mapper = FieldMapper::with_table(table);
        let mapped = mapper.map_fields(r#"{"回复建议":"hi"}"#, &MappingContext::default());
        assert!(mapped.contains("\"replySuggestion\""));
    }

    #[test]
    fn test_mapper_is_shareable_across_threads() {
        let mapper = std::sync::Arc::new(FieldMapper::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mapper = std::sync::Arc::clone(&mapper);
                std::thread::spawn(move || {
                    mapper.add_mapping(format!("field{}", i), vec![format!("变体{}", i)]);
                    mapper.map_fields(r#"{"回复建议":"x"}"#, &MappingContext::default())
                })
            })
            .collect();
        for handle in handles {
            let mapped = handle.join().unwrap();
            assert!(mapped.contains("\"replySuggestion\""));
        }
    }

    #[test]
    fn test_mappings_added_during_concurrent_reads_are_never_lost() {
        // Readers keep re-warming the merged cache while the writer mutates;
        // every committed mapping must be visible once the writer returns.
        let mapper = std::sync::Arc::new(FieldMapper::new());
        let stop = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let mapper = std::sync::Arc::clone(&mapper);
                let stop = std::sync::Arc::clone(&stop);
                std::thread::spawn(move || {
                    while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                        let _ = mapper.map_fields(
                            r#"{"回复建议":"x"}"#,
                            &MappingContext::default(),
                        );
                    }
                })
            })
            .collect();

        for i in 0..50 {
            mapper.add_mapping(format!("field{}", i), vec![format!("变体{}", i)]);
            let mapped = mapper.map_fields(
                &format!(r#"{{"变体{}":"v"}}"#, i),
                &MappingContext::default(),
            );
            assert!(mapped.contains(&format!("\"field{}\"", i)), "lost mapping {}", i);
        }

        stop.store(true, std::sync::atomic::Ordering::Relaxed);
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
