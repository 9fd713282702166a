//! Multi-tier recovery ladder
//!
//! When every schema-level strategy has failed, the ladder extracts whatever
//! it can, field by field. Seven tiers run in fixed order and a later tier
//! only fills a field left empty by the earlier ones: canonical names,
//! localized synonyms, ecosystem variants, one-level wrapper objects, array
//! fields, free-text inference over the raw response, and finally
//! deterministic canned defaults. Tier seven always produces a value, so the
//! three canonical record kinds can never fail to recover.

use crate::clean::{Cleaner, CleaningOptions, DefaultCleaner};
use crate::config::ParserConfig;
use crate::context::{FallbackContext, MappingContext};
use crate::error::ParserError;
use crate::mapping::FieldMapper;
use crate::strategy;
use crate::synonyms;
use crate::value;
use rapport_domain::{
    AnalysisResult, ExtractedData, ParseQuality, Record, RecordKind, RiskLevel, SafetyCheckResult,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Which rung of the ladder produced a recovered record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStrategy {
    /// Multi-tier field extraction over a partially-parsed map
    FieldExtraction,
    /// Free-text inference directly over the raw response
    IntelligentInference,
    /// Canned type-specific safe defaults
    UseDefaultValues,
    /// Completion of an already partially-built record
    UsePartialData,
}

impl FallbackStrategy {
    /// Stable name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            FallbackStrategy::FieldExtraction => "FIELD_EXTRACTION",
            FallbackStrategy::IntelligentInference => "INTELLIGENT_INFERENCE",
            FallbackStrategy::UseDefaultValues => "USE_DEFAULT_VALUES",
            FallbackStrategy::UsePartialData => "USE_PARTIAL_DATA",
        }
    }
}

/// Outcome of a fallback recovery
#[derive(Debug)]
pub enum FallbackOutcome {
    /// A record was recovered
    Success {
        /// The recovered record
        record: Record,
        /// The rung that produced it
        strategy: FallbackStrategy,
        /// Overall quality score in `[0, 1]`
        quality: f64,
    },
    /// Recovery was not applicable for this target
    Failure(ParserError),
}

/// Runs the seven-tier ladder when the strategy chain is exhausted
pub struct FallbackHandler {
    mapper: Arc<FieldMapper>,
    config: ParserConfig,
    cleaner: DefaultCleaner,
}

impl FallbackHandler {
    /// Create a handler sharing the process-wide field mapper
    pub fn new(mapper: Arc<FieldMapper>, config: ParserConfig) -> Self {
        Self {
            mapper,
            config,
            cleaner: DefaultCleaner,
        }
    }

    /// Recover a record after the strategy chain failed
    ///
    /// Never fails for the three canonical record kinds; the generic kind is
    /// rejected because it has no ladder of its own.
    pub fn handle_parsing_failure(
        &self,
        error: &ParserError,
        kind: RecordKind,
        ctx: &FallbackContext,
    ) -> FallbackOutcome {
        warn!(
            operation_id = %ctx.operation_id,
            target = %kind,
            "recovering from parse failure: {}",
            error
        );
        if ctx.detailed_logging {
            let preview: String = ctx.raw.chars().take(200).collect();
            debug!(operation_id = %ctx.operation_id, raw = %preview, "fallback input preview");
        }

        let map = self.recover_map(&ctx.raw);

        let (record, quality) = match kind {
            RecordKind::Analysis => {
                let result = self.extract_analysis(&map, &ctx.raw);
                let quality = score_analysis(&result);
                (Record::Analysis(result), quality)
            }
            RecordKind::SafetyCheck => {
                let result = self.extract_safety(&map, &ctx.raw);
                let quality = score_safety(&result);
                (Record::SafetyCheck(result), quality)
            }
            RecordKind::Extraction => {
                let result = self.extract_extraction(&map, &ctx.raw);
                let quality = score_extraction(&result);
                (Record::Extraction(result), quality)
            }
            RecordKind::Generic => {
                return FallbackOutcome::Failure(ParserError::UnsupportedTarget(kind));
            }
        };

        if quality.overall >= self.config.accept_threshold {
            info!(
                operation_id = %ctx.operation_id,
                quality = quality.overall,
                "field extraction accepted"
            );
            return FallbackOutcome::Success {
                record,
                strategy: FallbackStrategy::FieldExtraction,
                quality: quality.overall,
            };
        }

        if ctx.enable_inference {
            let (record, quality) = self.infer_record(kind, &ctx.raw);
            if quality.overall >= self.config.accept_threshold {
                info!(
                    operation_id = %ctx.operation_id,
                    quality = quality.overall,
                    "free-text inference accepted"
                );
                return FallbackOutcome::Success {
                    record,
                    strategy: FallbackStrategy::IntelligentInference,
                    quality: quality.overall,
                };
            }
        }

        warn!(operation_id = %ctx.operation_id, "all recovery tiers below threshold, using defaults");
        FallbackOutcome::Success {
            record: self.generate_default_value(kind, ctx),
            strategy: FallbackStrategy::UseDefaultValues,
            quality: DEFAULT_VALUE_QUALITY,
        }
    }

    /// Complete a partially-built record by re-running tiers 6-7 over its
    /// still-empty fields
    pub fn handle_partial_result(&self, partial: Record, ctx: &FallbackContext) -> FallbackOutcome {
        info!(operation_id = %ctx.operation_id, target = %partial.kind(), "completing partial result");

        let (record, quality) = match partial {
            Record::Analysis(mut result) => {
                let (line_reply, line_analysis) = infer_analysis_lines(&ctx.raw);
                if result.reply_suggestion.is_empty() {
                    result.reply_suggestion = line_reply.unwrap_or_else(|| canned_reply(&ctx.raw));
                }
                if result.strategy_analysis.is_empty() {
                    result.strategy_analysis =
                        line_analysis.unwrap_or_else(|| canned_strategy(&ctx.raw));
                }
                let quality = score_analysis(&result);
                (Record::Analysis(result), quality)
            }
            Record::SafetyCheck(mut result) => {
                let (_, line_risks, line_suggestion) = infer_safety_lines(&ctx.raw);
                if result.triggered_risks.is_empty() {
                    result.triggered_risks =
                        line_risks.unwrap_or_else(|| canned_triggered_risks(&Map::new(), &ctx.raw));
                }
                if result.suggestion.is_empty() {
                    result.suggestion =
                        line_suggestion.unwrap_or_else(|| canned_suggestion(&Map::new(), &ctx.raw));
                }
                let quality = score_safety(&result);
                (Record::SafetyCheck(result), quality)
            }
            Record::Extraction(partial) => {
                let mut facts = partial.facts;
                let mut red_tags = partial.red_tags;
                let mut green_tags = partial.green_tags;
                let (line_facts, line_red, line_green) = infer_extraction_lines(&ctx.raw);
                if facts.is_empty() {
                    facts = line_facts.unwrap_or_else(|| canned_facts(&Map::new(), &ctx.raw));
                }
                if red_tags.is_empty() {
                    red_tags = line_red.unwrap_or_else(|| canned_red_tags(&Map::new(), &ctx.raw));
                }
                if green_tags.is_empty() {
                    green_tags =
                        line_green.unwrap_or_else(|| canned_green_tags(&Map::new(), &ctx.raw));
                }
                let result = ExtractedData::new(facts, red_tags, green_tags);
                let quality = score_extraction(&result);
                (Record::Extraction(result), quality)
            }
            Record::Generic(_) => {
                return FallbackOutcome::Failure(ParserError::UnsupportedTarget(
                    RecordKind::Generic,
                ));
            }
        };

        if quality.overall >= self.config.accept_threshold {
            return FallbackOutcome::Success {
                record,
                strategy: FallbackStrategy::UsePartialData,
                quality: quality.overall,
            };
        }
        FallbackOutcome::Success {
            record: self.generate_default_value(record.kind(), ctx),
            strategy: FallbackStrategy::UseDefaultValues,
            quality: DEFAULT_VALUE_QUALITY,
        }
    }

    /// Fixed, type-specific safe default for a target kind
    pub fn generate_default_value(&self, kind: RecordKind, ctx: &FallbackContext) -> Record {
        match kind {
            RecordKind::Analysis => Record::Analysis(AnalysisResult {
                reply_suggestion: canned_reply(&ctx.raw),
                strategy_analysis: canned_strategy(&ctx.raw),
                risk_level: infer_risk_level(&ctx.raw),
            }),
            RecordKind::SafetyCheck => {
                let is_safe = canned_is_safe(&Map::new(), &ctx.raw);
                Record::SafetyCheck(SafetyCheckResult::new(
                    is_safe,
                    canned_triggered_risks(&Map::new(), &ctx.raw),
                    canned_suggestion(&Map::new(), &ctx.raw),
                ))
            }
            RecordKind::Extraction => Record::Extraction(ExtractedData::new(
                canned_facts(&Map::new(), &ctx.raw),
                canned_red_tags(&Map::new(), &ctx.raw),
                canned_green_tags(&Map::new(), &ctx.raw),
            )),
            RecordKind::Generic => Record::Generic(Map::new()),
        }
    }

    /// Best-effort untyped map from the raw text; an unrecoverable document
    /// yields an empty map so the text tiers still run
    fn recover_map(&self, raw: &str) -> Map<String, Value> {
        let cleaned = self.cleaner.clean(raw, &CleaningOptions::default());
        let mapping = if self.config.enable_fuzzy_mapping {
            MappingContext::default().with_fuzzy(self.config.fuzzy_threshold)
        } else {
            MappingContext::default()
        };
        strategy::decode_generic_map(&cleaned, &self.mapper, &mapping).unwrap_or_default()
    }

    /// Run tiers 1-7 for an analysis record
    fn extract_analysis(&self, map: &Map<String, Value>, raw: &str) -> AnalysisResult {
        // Tiers 1-3: canonical, localized, ecosystem-variant names
        let mut reply = value::get_str(map, "replySuggestion")
            .or_else(|| first_str(map, &synonyms::REPLY_SYNONYMS))
            .or_else(|| first_str(map, &synonyms::REPLY_VARIANTS));
        let mut analysis = value::get_str(map, "strategyAnalysis")
            .or_else(|| first_str(map, &synonyms::STRATEGY_SYNONYMS))
            .or_else(|| first_str(map, &synonyms::STRATEGY_VARIANTS));
        let mut risk = value::get_str(map, "riskLevel")
            .or_else(|| first_str(map, &synonyms::RISK_LEVEL_SYNONYMS))
            .map(|label| RiskLevel::from_label(&label));

        // Tier 4: one level inside known wrapper objects
        for nested in wrapper_objects(map) {
            if reply.is_none() {
                reply = value::get_str(nested, "replySuggestion")
                    .or_else(|| first_str(nested, &synonyms::REPLY_SYNONYMS))
                    .or_else(|| first_str(nested, &synonyms::REPLY_VARIANTS));
            }
            if analysis.is_none() {
                analysis = value::get_str(nested, "strategyAnalysis")
                    .or_else(|| first_str(nested, &synonyms::STRATEGY_SYNONYMS))
                    .or_else(|| first_str(nested, &synonyms::STRATEGY_VARIANTS));
            }
            if risk.is_none() {
                risk = value::get_str(nested, "riskLevel")
                    .or_else(|| first_str(nested, &synonyms::RISK_LEVEL_SYNONYMS))
                    .or_else(|| value::get_str(nested, "risk_level"))
                    .map(|label| RiskLevel::from_label(&label));
            }
        }

        // Tier 5: first non-blank array element
        if reply.is_none() {
            reply = first_array_element(map, &synonyms::REPLY_ARRAY_KEYS);
        }
        if analysis.is_none() {
            analysis = first_array_element(map, &synonyms::STRATEGY_ARRAY_KEYS);
        }

        // Tier 6: free-text inference over the raw response
        if reply.is_none() || analysis.is_none() {
            let (line_reply, line_analysis) = infer_analysis_lines(raw);
            reply = reply.or(line_reply);
            analysis = analysis.or(line_analysis);
        }
        // An explicitly stated level wins; keywords only fill a missing one
        let risk = risk.unwrap_or_else(|| infer_risk_level(raw));

        // Tier 7: deterministic canned defaults
        AnalysisResult {
            reply_suggestion: reply.unwrap_or_else(|| canned_reply(raw)),
            strategy_analysis: analysis.unwrap_or_else(|| canned_strategy(raw)),
            risk_level: risk,
        }
    }

    /// Run tiers 1-7 for a safety check record
    fn extract_safety(&self, map: &Map<String, Value>, raw: &str) -> SafetyCheckResult {
        let mut is_safe = value::get_bool(map, "isSafe")
            .or_else(|| first_bool(map, &synonyms::IS_SAFE_SYNONYMS))
            .or_else(|| first_bool(map, &synonyms::IS_SAFE_VARIANTS));
        let mut risks = value::get_string_list(map, "triggeredRisks")
            .or_else(|| first_list(map, &synonyms::TRIGGERED_RISKS_SYNONYMS))
            .or_else(|| first_list(map, &synonyms::TRIGGERED_RISKS_VARIANTS));
        let mut suggestion = value::get_str(map, "suggestion")
            .or_else(|| first_str(map, &synonyms::SUGGESTION_SYNONYMS))
            .or_else(|| first_str(map, &synonyms::SUGGESTION_VARIANTS));

        for nested in wrapper_objects(map) {
            if is_safe.is_none() {
                is_safe = value::get_bool(nested, "isSafe")
                    .or_else(|| first_bool(nested, &synonyms::IS_SAFE_SYNONYMS));
            }
            if risks.is_none() {
                risks = value::get_string_list(nested, "triggeredRisks")
                    .or_else(|| first_list(nested, &synonyms::TRIGGERED_RISKS_SYNONYMS));
            }
            if suggestion.is_none() {
                suggestion = value::get_str(nested, "suggestion")
                    .or_else(|| first_str(nested, &synonyms::SUGGESTION_SYNONYMS));
            }
        }

        if risks.is_none() {
            risks = first_list(map, &synonyms::RISK_ARRAY_KEYS).filter(|list| !list.is_empty());
        }

        if is_safe.is_none() || risks.is_none() || suggestion.is_none() {
            let inferred = infer_safety_lines(raw);
            is_safe = is_safe.or(inferred.0);
            risks = risks.or(inferred.1);
            suggestion = suggestion.or(inferred.2);
        }

        let is_safe = is_safe.unwrap_or_else(|| canned_is_safe(map, raw));
        SafetyCheckResult::new(
            is_safe,
            risks.unwrap_or_else(|| canned_triggered_risks(map, raw)),
            suggestion.unwrap_or_else(|| canned_suggestion(map, raw)),
        )
    }

    /// Run tiers 1-7 for an extraction record
    fn extract_extraction(&self, map: &Map<String, Value>, raw: &str) -> ExtractedData {
        let mut facts = value::get_fact_map(map, "facts")
            .or_else(|| first_fact_map(map, &synonyms::FACTS_SYNONYMS))
            .or_else(|| first_fact_map(map, &synonyms::FACTS_VARIANTS));
        let mut red_tags = value::get_string_list(map, "redTags")
            .or_else(|| first_list(map, &synonyms::RED_TAGS_SYNONYMS))
            .or_else(|| first_list(map, &synonyms::RED_TAGS_VARIANTS));
        let mut green_tags = value::get_string_list(map, "greenTags")
            .or_else(|| first_list(map, &synonyms::GREEN_TAGS_SYNONYMS))
            .or_else(|| first_list(map, &synonyms::GREEN_TAGS_VARIANTS));

        for nested in wrapper_objects(map) {
            if facts.is_none() {
                facts = value::get_fact_map(nested, "facts")
                    .or_else(|| first_fact_map(nested, &synonyms::FACTS_SYNONYMS));
            }
            if red_tags.is_none() {
                red_tags = value::get_string_list(nested, "redTags")
                    .or_else(|| first_list(nested, &synonyms::RED_TAGS_SYNONYMS));
            }
            if green_tags.is_none() {
                green_tags = value::get_string_list(nested, "greenTags")
                    .or_else(|| first_list(nested, &synonyms::GREEN_TAGS_SYNONYMS));
            }
        }

        // Tier 5: unlabeled tag arrays, partitioned by avoidance keywords
        if red_tags.is_none() || green_tags.is_none() {
            let (red, green) = partition_tag_arrays(map);
            if red_tags.is_none() && !red.is_empty() {
                red_tags = Some(red);
            }
            if green_tags.is_none() && !green.is_empty() {
                green_tags = Some(green);
            }
        }

        if facts.is_none() || red_tags.is_none() || green_tags.is_none() {
            let inferred = infer_extraction_lines(raw);
            facts = facts.or(inferred.0);
            red_tags = red_tags.or(inferred.1);
            green_tags = green_tags.or(inferred.2);
        }

        ExtractedData::new(
            facts.unwrap_or_else(|| canned_facts(map, raw)),
            red_tags.unwrap_or_else(|| canned_red_tags(map, raw)),
            green_tags.unwrap_or_else(|| canned_green_tags(map, raw)),
        )
    }

    /// Second pass: tiers 6-7 directly over the raw text, ignoring any map
    fn infer_record(&self, kind: RecordKind, raw: &str) -> (Record, ParseQuality) {
        let empty = Map::new();
        match kind {
            RecordKind::Analysis => {
                let (reply, analysis) = infer_analysis_lines(raw);
                let result = AnalysisResult {
                    reply_suggestion: reply.unwrap_or_else(|| canned_reply(raw)),
                    strategy_analysis: analysis.unwrap_or_else(|| canned_strategy(raw)),
                    risk_level: infer_risk_level(raw),
                };
                let quality = score_analysis(&result);
                (Record::Analysis(result), quality)
            }
            RecordKind::SafetyCheck => {
                let (is_safe, risks, suggestion) = infer_safety_lines(raw);
                let result = SafetyCheckResult::new(
                    is_safe.unwrap_or_else(|| canned_is_safe(&empty, raw)),
                    risks.unwrap_or_else(|| canned_triggered_risks(&empty, raw)),
                    suggestion.unwrap_or_else(|| canned_suggestion(&empty, raw)),
                );
                let quality = score_safety(&result);
                (Record::SafetyCheck(result), quality)
            }
            RecordKind::Extraction | RecordKind::Generic => {
                let (facts, red, green) = infer_extraction_lines(raw);
                let result = ExtractedData::new(
                    facts.unwrap_or_else(|| canned_facts(&empty, raw)),
                    red.unwrap_or_else(|| canned_red_tags(&empty, raw)),
                    green.unwrap_or_else(|| canned_green_tags(&empty, raw)),
                );
                let quality = score_extraction(&result);
                (Record::Extraction(result), quality)
            }
        }
    }
}

/// Quality assigned to the canned-default path
const DEFAULT_VALUE_QUALITY: f64 = 0.1;

// Fixed penalties and confidence bucket boundaries, preserved from field
// observation of real responses. Changing them changes which recovery path
// wins for borderline input.
const ANALYSIS_FIELD_PENALTY: f64 = 0.4;
const SAFETY_SUGGESTION_PENALTY: f64 = 0.3;
const EXTRACTION_FACTS_PENALTY: f64 = 0.35;
const EXTRACTION_RED_PENALTY: f64 = 0.35;
const EXTRACTION_GREEN_PENALTY: f64 = 0.3;

/// Score an analysis record
pub(crate) fn score_analysis(result: &AnalysisResult) -> ParseQuality {
    let reply_len = result.reply_suggestion.chars().count();
    let analysis_len = result.strategy_analysis.chars().count();

    // riskLevel always has a value
    let filled = 1 + usize::from(reply_len > 0) + usize::from(analysis_len > 0);
    let completeness = filled as f64 / 3.0;

    let mut accuracy = 1.0;
    if reply_len == 0 {
        accuracy -= ANALYSIS_FIELD_PENALTY;
    }
    if analysis_len == 0 {
        accuracy -= ANALYSIS_FIELD_PENALTY;
    }

    let confidence = if reply_len > 50 && analysis_len > 100 {
        0.9
    } else if reply_len > 20 && analysis_len > 50 {
        0.7
    } else if reply_len > 0 && analysis_len > 0 {
        0.5
    } else {
        0.2
    };

    ParseQuality::new(completeness, accuracy, confidence)
}

/// Score a safety check record
pub(crate) fn score_safety(result: &SafetyCheckResult) -> ParseQuality {
    let suggestion_len = result.suggestion.chars().count();

    // isSafe and triggeredRisks always have values
    let filled = 2 + usize::from(suggestion_len > 0);
    let completeness = filled as f64 / 3.0;

    let accuracy = if suggestion_len == 0 {
        1.0 - SAFETY_SUGGESTION_PENALTY
    } else {
        1.0
    };

    let confidence = if suggestion_len > 50 {
        0.9
    } else if suggestion_len > 20 {
        0.7
    } else if suggestion_len > 0 {
        0.5
    } else {
        0.3
    };

    ParseQuality::new(completeness, accuracy, confidence)
}

/// Score an extraction record
pub(crate) fn score_extraction(result: &ExtractedData) -> ParseQuality {
    let facts = result.facts.len();
    let red = result.red_tags.len();
    let green = result.green_tags.len();

    let filled = usize::from(facts > 0) + usize::from(red > 0) + usize::from(green > 0);
    let completeness = filled as f64 / 3.0;

    let mut accuracy = 1.0;
    if facts == 0 {
        accuracy -= EXTRACTION_FACTS_PENALTY;
    }
    if red == 0 {
        accuracy -= EXTRACTION_RED_PENALTY;
    }
    if green == 0 {
        accuracy -= EXTRACTION_GREEN_PENALTY;
    }

    let confidence = if facts >= 3 && (red >= 2 || green >= 2) {
        0.9
    } else if facts >= 1 && (red >= 1 || green >= 1) {
        0.7
    } else if facts >= 1 || red >= 1 || green >= 1 {
        0.5
    } else {
        0.2
    };

    ParseQuality::new(completeness, accuracy, confidence)
}

/// First non-blank string value among the named keys, in declared order
fn first_str(map: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| value::get_str(map, name))
}

/// First boolean value among the named keys
fn first_bool(map: &Map<String, Value>, names: &[&str]) -> Option<bool> {
    names.iter().find_map(|name| value::get_bool(map, name))
}

/// First string list among the named keys
fn first_list(map: &Map<String, Value>, names: &[&str]) -> Option<Vec<String>> {
    names
        .iter()
        .find_map(|name| value::get_string_list(map, name))
}

/// First flattenable object among the named keys
fn first_fact_map(map: &Map<String, Value>, names: &[&str]) -> Option<HashMap<String, String>> {
    names.iter().find_map(|name| value::get_fact_map(map, name))
}

/// Known wrapper objects present in the map, in declared key order
fn wrapper_objects(map: &Map<String, Value>) -> Vec<&Map<String, Value>> {
    synonyms::WRAPPER_KEYS
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_object))
        .collect()
}

/// First non-blank element of the first populated array among the named keys
fn first_array_element(map: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        map.get(*name)?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Split unlabeled tag arrays into red (avoidance-flavored) and green tags
fn partition_tag_arrays(map: &Map<String, Value>) -> (Vec<String>, Vec<String>) {
    let mut red = Vec::new();
    let mut green = Vec::new();
    for key in synonyms::TAG_ARRAY_KEYS {
        if let Some(items) = value::get_string_list(map, key) {
            for item in items {
                let lower = item.to_lowercase();
                let is_red = item.contains("不要")
                    || item.contains("避免")
                    || item.contains("风险")
                    || lower.contains("don't")
                    || lower.contains("avoid")
                    || lower.contains("risk")
                    || lower.contains("warning");
                if is_red {
                    red.push(item);
                } else {
                    green.push(item);
                }
            }
        }
    }
    (red, green)
}

/// Text after the first `:` or `：` separator on a line
fn after_separator(line: &str) -> Option<String> {
    let idx = line.find([':', '：'])?;
    let sep_len = line[idx..].chars().next().map(char::len_utf8)?;
    let tail = line[idx + sep_len..].trim().trim_matches('"').trim();
    if tail.is_empty() {
        None
    } else {
        Some(tail.to_string())
    }
}

/// Tier 6 for analysis: scan lines for reply and strategy indicators
fn infer_analysis_lines(raw: &str) -> (Option<String>, Option<String>) {
    let mut reply = None;
    let mut analysis = None;
    for line in raw.lines() {
        if reply.is_none() && line.contains("建议") && line.contains("回复") {
            reply = after_separator(line);
        }
        if analysis.is_none() && (line.contains("分析") || line.contains("策略")) {
            analysis = after_separator(line);
        }
    }
    (reply, analysis)
}

/// Categorical risk inference: high-severity keywords outrank medium-severity
/// keywords outrank the safe default
pub(crate) fn infer_risk_level(raw: &str) -> RiskLevel {
    let lower = raw.to_lowercase();
    if synonyms::HIGH_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        RiskLevel::Danger
    } else if synonyms::MEDIUM_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        RiskLevel::Warning
    } else {
        RiskLevel::Safe
    }
}

/// Tier 6 for safety checks: line scanning plus a risk-line pattern
#[allow(clippy::type_complexity)]
fn infer_safety_lines(raw: &str) -> (Option<bool>, Option<Vec<String>>, Option<String>) {
    static RISK_LINE: OnceLock<Regex> = OnceLock::new();
    let risk_line = RISK_LINE.get_or_init(|| {
        Regex::new(r"(?:风险|雷区|问题|issue|risk)[:：]\s*([^\n]+)").expect("static pattern")
    });

    let mut is_safe = None;
    let mut suggestion = None;
    for line in raw.lines() {
        let lower = line.to_lowercase();
        if is_safe.is_none() && (line.contains("安全") || lower.contains("safe")) {
            let negative = line.contains("不安全")
                || lower.contains("unsafe")
                || lower.contains("false")
                || line.contains("风险");
            is_safe = Some(!negative);
        }
        if suggestion.is_none() && (line.contains("建议") || lower.contains("suggestion")) {
            suggestion = after_separator(line);
        }
    }

    let risks: Vec<String> = risk_line
        .captures_iter(raw)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let risks = if risks.is_empty() { None } else { Some(risks) };

    if is_safe.is_none() {
        let lower = raw.to_lowercase();
        if synonyms::HIGH_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
            is_safe = Some(false);
        } else if lower.contains("安全") || lower.contains("无风险") || lower.contains("正常") {
            is_safe = Some(true);
        }
    }

    (is_safe, risks, suggestion)
}

/// Tier 6 for extraction: fact lines, red-tag lines, green-tag lines
#[allow(clippy::type_complexity)]
fn infer_extraction_lines(
    raw: &str,
) -> (
    Option<HashMap<String, String>>,
    Option<Vec<String>>,
    Option<Vec<String>>,
) {
    let mut facts = HashMap::new();
    let mut red = Vec::new();
    let mut green = Vec::new();

    for line in raw.lines() {
        let lower = line.to_lowercase();

        if let Some(idx) = line.find([':', '：']) {
            let key = line[..idx].trim().trim_matches('"').to_string();
            if !key.is_empty()
                && synonyms::FACT_LINE_KEYWORDS
                    .iter()
                    .any(|k| key.contains(k) || key.to_lowercase().contains(k))
            {
                if let Some(val) = after_separator(line) {
                    facts.insert(key, val);
                }
            }
        }

        if synonyms::RED_TAG_LINE_KEYWORDS
            .iter()
            .any(|k| line.contains(k) || lower.contains(k))
        {
            if let Some(tag) = after_separator(line) {
                red.push(tag);
            }
        }
        if synonyms::GREEN_TAG_LINE_KEYWORDS
            .iter()
            .any(|k| line.contains(k) || lower.contains(k))
        {
            if let Some(tag) = after_separator(line) {
                green.push(tag);
            }
        }
    }

    (
        if facts.is_empty() { None } else { Some(facts) },
        if red.is_empty() { None } else { Some(red) },
        if green.is_empty() { None } else { Some(green) },
    )
}

/// Tier 7: canned reply keyed off domain keywords in the raw text
fn canned_reply(raw: &str) -> String {
    for (keyword, phrase) in synonyms::CANNED_REPLIES {
        if raw.contains(keyword) {
            return phrase.to_string();
        }
    }
    synonyms::DEFAULT_REPLY.to_string()
}

/// Tier 7: canned strategy analysis keyed off domain keywords
fn canned_strategy(raw: &str) -> String {
    for (keyword, phrase) in synonyms::CANNED_STRATEGIES {
        if raw.contains(keyword) {
            return phrase.to_string();
        }
    }
    synonyms::DEFAULT_STRATEGY.to_string()
}

/// Tier 7: safety verdict from risk-indicating keys and keywords
fn canned_is_safe(map: &Map<String, Value>, raw: &str) -> bool {
    let risky_keys = map.keys().any(|key| {
        let lower = key.to_lowercase();
        lower.contains("risk") || lower.contains("danger") || lower.contains("warning")
    });
    let risky_text = raw.contains("风险") || raw.contains("危险") || raw.contains("警告");
    !(risky_keys || risky_text)
}

/// Tier 7: triggered risks from risk-named map entries, else canned phrases
fn canned_triggered_risks(map: &Map<String, Value>, raw: &str) -> Vec<String> {
    let mut risks = Vec::new();
    for (key, val) in map {
        let lower = key.to_lowercase();
        if lower.contains("risk") || lower.contains("warning") {
            match val {
                Value::String(s) if !s.trim().is_empty() => risks.push(s.trim().to_string()),
                Value::Array(items) => risks.extend(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                ),
                _ => {}
            }
        }
    }
    if risks.is_empty() {
        let lower = raw.to_lowercase();
        for (keyword, phrase) in synonyms::CANNED_RED_TAGS {
            if lower.contains(keyword) {
                risks.push(phrase.to_string());
                break;
            }
        }
    }
    risks
}

/// Tier 7: canned safety suggestion matching the inferred verdict
fn canned_suggestion(map: &Map<String, Value>, raw: &str) -> String {
    if canned_is_safe(map, raw) {
        synonyms::SAFE_SUGGESTION.to_string()
    } else {
        synonyms::UNSAFE_SUGGESTION.to_string()
    }
}

/// Tier 7: facts from info-flavored map entries, else an info-line pattern
fn canned_facts(map: &Map<String, Value>, raw: &str) -> HashMap<String, String> {
    static INFO_LINE: OnceLock<Regex> = OnceLock::new();
    let info_line = INFO_LINE.get_or_init(|| {
        Regex::new(r"(?:信息|资料|info|data)[:：]\s*([^\n]+)").expect("static pattern")
    });

    let mut facts = HashMap::new();
    for (key, val) in map {
        let lower = key.to_lowercase();
        if lower.contains("info")
            || lower.contains("data")
            || key.contains("信息")
            || key.contains("资料")
        {
            match val {
                Value::Object(object) => facts.extend(value::flatten_facts(object)),
                Value::String(s) if !s.trim().is_empty() => {
                    facts.insert(key.clone(), s.trim().to_string());
                }
                _ => {}
            }
        }
    }
    if facts.is_empty() {
        let matches: Vec<String> = info_line
            .captures_iter(raw)
            .map(|c| c[1].trim().to_string())
            .collect();
        if !matches.is_empty() {
            facts.insert("提取信息".to_string(), matches.join(", "));
        }
    }
    facts
}

/// Tier 7: red tags from risk-named map entries, else the first matching
/// canned phrase
fn canned_red_tags(map: &Map<String, Value>, raw: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for (key, val) in map {
        let lower = key.to_lowercase();
        if lower.contains("risk")
            || lower.contains("warning")
            || lower.contains("danger")
            || key.contains("风险")
            || key.contains("警告")
        {
            match val {
                Value::String(s) if !s.trim().is_empty() => tags.push(s.trim().to_string()),
                Value::Array(items) => tags.extend(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                ),
                _ => {}
            }
        }
    }
    if tags.is_empty() {
        let lower = raw.to_lowercase();
        for (keyword, phrase) in synonyms::CANNED_RED_TAGS {
            if lower.contains(keyword) {
                tags.push(phrase.to_string());
                break;
            }
        }
    }
    tags
}

/// Tier 7: green tags from suggestion-named map entries, else the first
/// matching canned phrase
fn canned_green_tags(map: &Map<String, Value>, raw: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for (key, val) in map {
        let lower = key.to_lowercase();
        if lower.contains("suggest")
            || lower.contains("recommend")
            || lower.contains("tip")
            || key.contains("建议")
            || key.contains("推荐")
        {
            match val {
                Value::String(s) if !s.trim().is_empty() => tags.push(s.trim().to_string()),
                Value::Array(items) => tags.extend(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                ),
                _ => {}
            }
        }
    }
    if tags.is_empty() {
        let lower = raw.to_lowercase();
        for (keyword, phrase) in synonyms::CANNED_GREEN_TAGS {
            if lower.contains(keyword) {
                tags.push(phrase.to_string());
                break;
            }
        }
    }
    tags
}
