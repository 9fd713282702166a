//! Schema-level decoding strategies
//!
//! Three decoders run in strict order against the cleaned response text:
//! strict, lenient, then generic map reconstruction. The first success wins;
//! exhaustion hands control to the fallback ladder.

use crate::context::MappingContext;
use crate::error::ParserError;
use crate::mapping::FieldMapper;
use crate::value;
use rapport_domain::{AnalysisResult, ExtractedData, RiskLevel, SafetyCheckResult};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Names of the schema-level strategies, in attempt order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Direct decode against the canonical schema
    Strict,
    /// Syntactic repair, then strict decode
    Lenient,
    /// Untyped map decode plus canonicalization plus defaulted construction
    Generic,
}

impl Strategy {
    /// Stable name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Strict => "strict",
            Strategy::Lenient => "lenient",
            Strategy::Generic => "generic",
        }
    }
}

/// Decode directly against the canonical schema; any structural mismatch fails
pub(crate) fn decode_strict<T: DeserializeOwned>(json: &str) -> Result<T, ParserError> {
    Ok(serde_json::from_str(json)?)
}

/// Repair minor syntactic defects, then decode strictly
pub(crate) fn decode_lenient<T: DeserializeOwned>(json: &str) -> Result<T, ParserError> {
    decode_strict(&repair(json))
}

/// Tolerate trailing commas, capitalized booleans, and fullwidth colons
pub(crate) fn repair(json: &str) -> String {
    static TRAILING_COMMA: OnceLock<Regex> = OnceLock::new();
    static BARE_TRUE: OnceLock<Regex> = OnceLock::new();
    static BARE_FALSE: OnceLock<Regex> = OnceLock::new();
    static KEY_FULLWIDTH_COLON: OnceLock<Regex> = OnceLock::new();

    let trailing_comma = TRAILING_COMMA.get_or_init(|| {
        Regex::new(r",\s*([}\]])").expect("static pattern")
    });
    let bare_true =
        BARE_TRUE.get_or_init(|| Regex::new(r":\s*True\b").expect("static pattern"));
    let bare_false =
        BARE_FALSE.get_or_init(|| Regex::new(r":\s*False\b").expect("static pattern"));
    // Key position only: a fullwidth colon inside a string value is content
    let key_fullwidth_colon = KEY_FULLWIDTH_COLON.get_or_init(|| {
        Regex::new(r#"("(?:[^"\\]|\\.)*")\s*："#).expect("static pattern")
    });

    let mut result = json.trim().to_string();
    result = key_fullwidth_colon.replace_all(&result, "${1}:").into_owned();
    result = trailing_comma.replace_all(&result, "$1").into_owned();
    result = bare_true.replace_all(&result, ": true").into_owned();
    result = bare_false.replace_all(&result, ": false").into_owned();
    result
}

/// Decode into an untyped map, canonicalizing its keys first
pub(crate) fn decode_generic_map(
    json: &str,
    mapper: &FieldMapper,
    mapping: &MappingContext,
) -> Result<Map<String, Value>, ParserError> {
    let repaired = repair(json);
    let mapped = mapper.map_fields(&repaired, mapping);
    let value: Value = serde_json::from_str(&mapped)?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| ParserError::JsonParse("response is not a JSON object".to_string()))
}

/// Build an [`AnalysisResult`] from a canonicalized map, defaulting absent
/// fields
pub(crate) fn analysis_from_map(map: &Map<String, Value>) -> AnalysisResult {
    AnalysisResult {
        reply_suggestion: value::get_str(map, "replySuggestion").unwrap_or_default(),
        strategy_analysis: value::get_str(map, "strategyAnalysis").unwrap_or_default(),
        risk_level: value::get_str(map, "riskLevel")
            .map(|label| RiskLevel::from_label(&label))
            .unwrap_or_default(),
    }
}

/// Build a [`SafetyCheckResult`] from a canonicalized map, defaulting absent
/// fields
pub(crate) fn safety_from_map(map: &Map<String, Value>) -> SafetyCheckResult {
    SafetyCheckResult::new(
        value::get_bool(map, "isSafe").unwrap_or(true),
        value::get_string_list(map, "triggeredRisks").unwrap_or_default(),
        value::get_str(map, "suggestion").unwrap_or_default(),
    )
}

/// Build an [`ExtractedData`] from a canonicalized map, defaulting absent
/// fields
pub(crate) fn extraction_from_map(map: &Map<String, Value>) -> ExtractedData {
    ExtractedData::new(
        value::get_fact_map(map, "facts").unwrap_or_default(),
        value::get_string_list(map, "redTags").unwrap_or_default(),
        value::get_string_list(map, "greenTags").unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_accepts_canonical_json() {
        let json = r#"{"replySuggestion":"hi","strategyAnalysis":"ok","riskLevel":"SAFE"}"#;
        let result: AnalysisResult = decode_strict(json).unwrap();
        assert_eq!(result.reply_suggestion, "hi");
    }

    #[test]
    fn test_strict_rejects_trailing_comma() {
        let json = r#"{"replySuggestion":"hi","strategyAnalysis":"ok","riskLevel":"SAFE",}"#;
        assert!(decode_strict::<AnalysisResult>(json).is_err());
    }

    #[test]
    fn test_lenient_accepts_trailing_comma() {
        let json = r#"{"replySuggestion":"hi","strategyAnalysis":"ok","riskLevel":"SAFE",}"#;
        let result: AnalysisResult = decode_lenient(json).unwrap();
        assert_eq!(result.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn test_lenient_accepts_python_booleans() {
        let json = r#"{"isSafe": True, "triggeredRisks": [], "suggestion": "ok"}"#;
        let result: SafetyCheckResult = decode_lenient(json).unwrap();
        assert!(result.is_safe);
    }

    #[test]
    fn test_lenient_accepts_fullwidth_colons() {
        let json = r#"{"isSafe"：true, "triggeredRisks"：[], "suggestion"："ok"}"#;
        let result: SafetyCheckResult = decode_lenient(json).unwrap();
        assert!(result.is_safe);
    }

    #[test]
    fn test_lenient_keeps_fullwidth_colons_inside_values() {
        let json = r#"{"replySuggestion":"记住：保持冷静","strategyAnalysis":"ok","riskLevel":"SAFE",}"#;
        let result: AnalysisResult = decode_lenient(json).unwrap();
        assert_eq!(result.reply_suggestion, "记住：保持冷静");
    }

    #[test]
    fn test_generic_map_canonicalizes_keys() {
        let mapper = FieldMapper::new();
        let json = r#"{"回复建议":"你好","unrelated":1}"#;
        let map = decode_generic_map(json, &mapper, &MappingContext::default()).unwrap();
        assert!(map.contains_key("replySuggestion"));
        assert!(map.contains_key("unrelated"));
    }

    #[test]
    fn test_generic_map_rejects_non_object() {
        let mapper = FieldMapper::new();
        assert!(decode_generic_map("[1,2,3]", &mapper, &MappingContext::default()).is_err());
    }

    #[test]
    fn test_analysis_from_map_defaults() {
        let map = Map::new();
        let result = analysis_from_map(&map);
        assert!(result.reply_suggestion.is_empty());
        assert_eq!(result.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn test_safety_from_map_defaults_to_safe() {
        let map = Map::new();
        let result = safety_from_map(&map);
        assert!(result.is_safe);
        assert!(result.triggered_risks.is_empty());
    }

    #[test]
    fn test_extraction_from_map_dedups() {
        let json = r#"{"facts":{},"redTags":["A","a","A"],"greenTags":[]}"#;
        let mapper = FieldMapper::new();
        let map = decode_generic_map(json, &mapper, &MappingContext::default()).unwrap();
        let result = extraction_from_map(&map);
        assert_eq!(result.red_tags, vec!["A", "a"]);
    }
}
