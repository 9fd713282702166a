//! Parse orchestration
//!
//! One entry point per record kind plus a kind-dispatched [`parse`]. Each call
//! cleans the raw response, runs the strict, lenient, and generic strategies
//! in order against the cleaned text, and on exhaustion hands the *original*
//! uncleaned text to the fallback ladder. The three canonical record kinds
//! therefore always yield a record; only the open-ended generic kind can fail.
//!
//! [`parse`]: ResponseParser::parse

use crate::clean::{Cleaner, CleaningOptions, DefaultCleaner};
use crate::config::ParserConfig;
use crate::context::{MappingContext, ParsingContext};
use crate::error::ParserError;
use crate::fallback::{FallbackHandler, FallbackOutcome, FallbackStrategy};
use crate::mapping::FieldMapper;
use crate::strategy::{self, Strategy};
use rapport_domain::{
    AnalysisResult, ExtractedData, Record, RecordKind, SafetyCheckResult,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which stage of the pipeline produced a record
///
/// A schema-level strategy win means the fallback ladder never ran for the
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOrigin {
    /// One of the strict, lenient, or generic strategies decoded the response
    Strategy(Strategy),
    /// The strategy chain was exhausted and the fallback ladder recovered
    Fallback(FallbackStrategy),
}

/// The recovery pipeline: cleaner, strategy chain, field mapper, fallback
/// ladder
///
/// One instance is meant to be shared across calls (and threads); the field
/// mapper is the only mutable state and is internally synchronized.
pub struct ResponseParser<C: Cleaner = DefaultCleaner> {
    cleaner: C,
    mapper: Arc<FieldMapper>,
    fallback: FallbackHandler,
    config: ParserConfig,
}

impl ResponseParser<DefaultCleaner> {
    /// Create a parser with the default cleaner and default configuration
    pub fn new() -> Self {
        Self::with_cleaner(DefaultCleaner, ParserConfig::default())
    }

    /// Create a parser with the default cleaner and an explicit configuration
    pub fn with_config(config: ParserConfig) -> Result<Self, ParserError> {
        config.validate().map_err(ParserError::Config)?;
        Ok(Self::with_cleaner(DefaultCleaner, config))
    }
}

impl Default for ResponseParser<DefaultCleaner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Cleaner> ResponseParser<C> {
    /// Create a parser with a custom cleaner
    pub fn with_cleaner(cleaner: C, config: ParserConfig) -> Self {
        Self::with_mapper(cleaner, Arc::new(FieldMapper::new()), config)
    }

    /// Create a parser over an externally-built field mapper, e.g. one loaded
    /// from a mapping resource via [`FieldTable::from_toml_or_default`]
    ///
    /// [`FieldTable::from_toml_or_default`]: crate::mapping::FieldTable::from_toml_or_default
    pub fn with_mapper(cleaner: C, mapper: Arc<FieldMapper>, config: ParserConfig) -> Self {
        let fallback = FallbackHandler::new(Arc::clone(&mapper), config.clone());
        Self {
            cleaner,
            mapper,
            fallback,
            config,
        }
    }

    /// The shared field mapper, for dynamic mapping management
    pub fn mapper(&self) -> &Arc<FieldMapper> {
        &self.mapper
    }

    /// Parse a raw response into an [`AnalysisResult`]; never fails
    pub fn parse_analysis_result(
        &self,
        raw: &str,
        ctx: &ParsingContext,
    ) -> Result<AnalysisResult, ParserError> {
        match self.parse(raw, RecordKind::Analysis, ctx)? {
            Record::Analysis(result) => Ok(result),
            other => Err(ParserError::InvalidFormat(format!(
                "recovered a {} record for an analysis request",
                other.kind()
            ))),
        }
    }

    /// Parse a raw response into a [`SafetyCheckResult`]; never fails
    pub fn parse_safety_check(
        &self,
        raw: &str,
        ctx: &ParsingContext,
    ) -> Result<SafetyCheckResult, ParserError> {
        match self.parse(raw, RecordKind::SafetyCheck, ctx)? {
            Record::SafetyCheck(result) => Ok(result),
            other => Err(ParserError::InvalidFormat(format!(
                "recovered a {} record for a safety check request",
                other.kind()
            ))),
        }
    }

    /// Parse a raw response into an [`ExtractedData`]; never fails
    pub fn parse_extracted_data(
        &self,
        raw: &str,
        ctx: &ParsingContext,
    ) -> Result<ExtractedData, ParserError> {
        match self.parse(raw, RecordKind::Extraction, ctx)? {
            Record::Extraction(result) => Ok(result),
            other => Err(ParserError::InvalidFormat(format!(
                "recovered a {} record for an extraction request",
                other.kind()
            ))),
        }
    }

    /// Parse a raw response into a record of the requested kind
    ///
    /// The canonical kinds recover through the fallback ladder and cannot
    /// fail. The generic kind yields the canonicalized map when any JSON
    /// object is recoverable and [`ParserError::InvalidFormat`] otherwise.
    pub fn parse(
        &self,
        raw: &str,
        kind: RecordKind,
        ctx: &ParsingContext,
    ) -> Result<Record, ParserError> {
        self.parse_with_origin(raw, kind, ctx)
            .map(|(record, _)| record)
    }

    /// Like [`parse`], also reporting which stage produced the record
    ///
    /// [`parse`]: ResponseParser::parse
    pub fn parse_with_origin(
        &self,
        raw: &str,
        kind: RecordKind,
        ctx: &ParsingContext,
    ) -> Result<(Record, ParseOrigin), ParserError> {
        info!(
            operation_id = %ctx.operation_id,
            operation = %ctx.operation_type,
            model = %ctx.model_name,
            target = %kind,
            raw_len = raw.len(),
            "parsing response"
        );

        let options = CleaningOptions {
            detailed_logging: self.detailed_logging(ctx),
            ..CleaningOptions::default()
        };
        let cleaned = self.cleaner.clean(raw, &options);

        if kind == RecordKind::Generic {
            // The cleaner degrades object-free text to "{}"; that is a miss
            // for an open-ended target, not an empty success
            if !raw.contains('{') {
                return Err(ParserError::InvalidFormat(
                    "response contained no JSON object".to_string(),
                ));
            }
            let map = strategy::decode_generic_map(&cleaned, &self.mapper, &self.mapping_context())
                .map_err(|e| {
                    ParserError::InvalidFormat(format!("no JSON object recoverable: {}", e))
                })?;
            return Ok((
                Record::Generic(map),
                ParseOrigin::Strategy(Strategy::Generic),
            ));
        }

        match self.run_strategies(&cleaned, kind, ctx) {
            Ok((record, strategy)) => {
                info!(
                    operation_id = %ctx.operation_id,
                    strategy = strategy.name(),
                    "parse succeeded"
                );
                Ok((record, ParseOrigin::Strategy(strategy)))
            }
            Err(error) => {
                warn!(
                    operation_id = %ctx.operation_id,
                    target = %kind,
                    "strategy chain exhausted: {}",
                    error
                );
                let fallback_ctx = ctx.to_fallback_context(raw, self.config.enable_inference);
                match self.fallback.handle_parsing_failure(&error, kind, &fallback_ctx) {
                    FallbackOutcome::Success {
                        record,
                        strategy,
                        quality,
                    } => {
                        info!(
                            operation_id = %ctx.operation_id,
                            strategy = strategy.name(),
                            quality,
                            "fallback recovery succeeded"
                        );
                        Ok((record, ParseOrigin::Fallback(strategy)))
                    }
                    FallbackOutcome::Failure(e) => Err(e),
                }
            }
        }
    }

    /// Complete a record whose required fields are partially empty
    pub fn complete_partial(
        &self,
        partial: Record,
        raw: &str,
        ctx: &ParsingContext,
    ) -> Result<Record, ParserError> {
        let fallback_ctx = ctx.to_fallback_context(raw, self.config.enable_inference);
        match self.fallback.handle_partial_result(partial, &fallback_ctx) {
            FallbackOutcome::Success { record, .. } => Ok(record),
            FallbackOutcome::Failure(e) => Err(e),
        }
    }

    /// Learn a dynamic field mapping from observed candidate key names
    ///
    /// Candidates below the configured learn threshold are rejected.
    pub fn learn_field_mapping(&self, canonical: &str, candidates: &[String], confidence: f64) {
        if confidence < self.config.learn_threshold {
            debug!(
                canonical,
                confidence, "mapping candidate below learn threshold, skipping"
            );
            return;
        }
        self.mapper.learn_mapping(canonical, candidates, confidence);
    }

    /// Run the strict, lenient, and generic strategies in order
    fn run_strategies(
        &self,
        cleaned: &str,
        kind: RecordKind,
        ctx: &ParsingContext,
    ) -> Result<(Record, Strategy), ParserError> {
        let detailed = self.detailed_logging(ctx);
        let mut last_error = None;

        for strategy in [Strategy::Strict, Strategy::Lenient, Strategy::Generic] {
            if detailed {
                debug!(
                    operation_id = %ctx.operation_id,
                    strategy = strategy.name(),
                    "attempting strategy"
                );
            }
            match self.run_strategy(strategy, cleaned, kind) {
                Ok(record) => return Ok((normalize(record), strategy)),
                Err(e) => {
                    if detailed {
                        debug!(
                            operation_id = %ctx.operation_id,
                            strategy = strategy.name(),
                            "strategy failed: {}",
                            e
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ParserError::InvalidFormat("no strategy applicable".to_string())))
    }

    fn run_strategy(
        &self,
        strategy: Strategy,
        cleaned: &str,
        kind: RecordKind,
    ) -> Result<Record, ParserError> {
        match strategy {
            Strategy::Strict => match kind {
                RecordKind::Analysis => {
                    strategy::decode_strict::<AnalysisResult>(cleaned).map(Record::Analysis)
                }
                RecordKind::SafetyCheck => {
                    strategy::decode_strict::<SafetyCheckResult>(cleaned).map(Record::SafetyCheck)
                }
                RecordKind::Extraction => {
                    strategy::decode_strict::<ExtractedData>(cleaned).map(Record::Extraction)
                }
                RecordKind::Generic => Err(ParserError::UnsupportedTarget(kind)),
            },
            Strategy::Lenient => match kind {
                RecordKind::Analysis => {
                    strategy::decode_lenient::<AnalysisResult>(cleaned).map(Record::Analysis)
                }
                RecordKind::SafetyCheck => {
                    strategy::decode_lenient::<SafetyCheckResult>(cleaned).map(Record::SafetyCheck)
                }
                RecordKind::Extraction => {
                    strategy::decode_lenient::<ExtractedData>(cleaned).map(Record::Extraction)
                }
                RecordKind::Generic => Err(ParserError::UnsupportedTarget(kind)),
            },
            Strategy::Generic => {
                let map =
                    strategy::decode_generic_map(cleaned, &self.mapper, &self.mapping_context())?;
                // A map carrying none of the schema's fields is a miss, not a
                // hit full of defaults; the ladder sees the raw text instead
                if !has_expected_field(&map, kind) {
                    return Err(ParserError::InvalidFormat(
                        "no canonical field present after mapping".to_string(),
                    ));
                }
                Ok(match kind {
                    RecordKind::Analysis => Record::Analysis(strategy::analysis_from_map(&map)),
                    RecordKind::SafetyCheck => {
                        Record::SafetyCheck(strategy::safety_from_map(&map))
                    }
                    RecordKind::Extraction => {
                        Record::Extraction(strategy::extraction_from_map(&map))
                    }
                    RecordKind::Generic => Record::Generic(map),
                })
            }
        }
    }

    fn mapping_context(&self) -> MappingContext {
        if self.config.enable_fuzzy_mapping {
            MappingContext::default().with_fuzzy(self.config.fuzzy_threshold)
        } else {
            MappingContext::default()
        }
    }

    fn detailed_logging(&self, ctx: &ParsingContext) -> bool {
        ctx.detailed_logging || self.config.detailed_logging
    }
}

/// Re-apply constructor invariants that a direct serde decode skips
///
/// Tag and risk lists are ordered, case-sensitively deduplicated collections
/// no matter which strategy produced them.
fn normalize(record: Record) -> Record {
    match record {
        Record::SafetyCheck(r) => {
            Record::SafetyCheck(SafetyCheckResult::new(r.is_safe, r.triggered_risks, r.suggestion))
        }
        Record::Extraction(r) => {
            Record::Extraction(ExtractedData::new(r.facts, r.red_tags, r.green_tags))
        }
        other => other,
    }
}

/// Does the canonicalized map carry at least one schema field for `kind`?
fn has_expected_field(map: &Map<String, Value>, kind: RecordKind) -> bool {
    let fields: &[&str] = match kind {
        RecordKind::Analysis => &AnalysisResult::EXPECTED_FIELDS,
        RecordKind::SafetyCheck => &SafetyCheckResult::EXPECTED_FIELDS,
        RecordKind::Extraction => &ExtractedData::EXPECTED_FIELDS,
        RecordKind::Generic => return true,
    };
    fields.iter().any(|field| map.contains_key(*field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapport_domain::RiskLevel;

    fn parser() -> ResponseParser {
        ResponseParser::new()
    }

    fn ctx() -> ParsingContext {
        ParsingContext::new("test", "test-model")
    }

    #[test]
    fn test_canonical_json_parses_strictly() {
        let raw = r#"{"replySuggestion":"hi","strategyAnalysis":"friendly","riskLevel":"SAFE"}"#;
        let result = parser().parse_analysis_result(raw, &ctx()).unwrap();
        assert_eq!(result.reply_suggestion, "hi");
        assert_eq!(result.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn test_fenced_json_with_trailing_comma() {
        let raw = "```json\n{\"isSafe\": true, \"triggeredRisks\": [], \"suggestion\": \"ok\",}\n```";
        let result = parser().parse_safety_check(raw, &ctx()).unwrap();
        assert!(result.is_safe);
    }

    #[test]
    fn test_localized_keys_parse_via_mapping() {
        let raw = r#"{"回复建议":"你好","策略分析":"对方很友好","风险等级":"安全"}"#;
        let result = parser().parse_analysis_result(raw, &ctx()).unwrap();
        assert_eq!(result.reply_suggestion, "你好");
        assert_eq!(result.strategy_analysis, "对方很友好");
        assert_eq!(result.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn test_free_text_recovers_through_fallback() {
        let result = parser()
            .parse_analysis_result("这个话题很危险，不要继续", &ctx())
            .unwrap();
        assert_eq!(result.risk_level, RiskLevel::Danger);
        assert!(!result.reply_suggestion.is_empty());
    }

    #[test]
    fn test_generic_kind_returns_canonicalized_map() {
        let raw = r#"{"回复建议":"你好","extra":1}"#;
        match parser().parse(raw, RecordKind::Generic, &ctx()).unwrap() {
            Record::Generic(map) => {
                assert!(map.contains_key("replySuggestion"));
                assert!(map.contains_key("extra"));
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_generic_kind_fails_on_prose() {
        let result = parser().parse("no structure here", RecordKind::Generic, &ctx());
        assert!(matches!(result, Err(ParserError::InvalidFormat(_))));
    }

    #[test]
    fn test_origin_distinguishes_strategies_from_fallback() {
        let parser = parser();
        let strict = r#"{"replySuggestion":"hi","strategyAnalysis":"ok","riskLevel":"SAFE"}"#;
        let (_, origin) = parser
            .parse_with_origin(strict, RecordKind::Analysis, &ctx())
            .unwrap();
        assert_eq!(origin, ParseOrigin::Strategy(Strategy::Strict));

        let (_, origin) = parser
            .parse_with_origin("完全没有结构的文本", RecordKind::Analysis, &ctx())
            .unwrap();
        assert!(matches!(origin, ParseOrigin::Fallback(_)));
    }

    #[test]
    fn test_empty_object_falls_through_to_defaults() {
        // {} satisfies no schema and carries no canonical field
        let result = parser().parse_safety_check("{}", &ctx()).unwrap();
        assert!(result.is_safe);
        assert!(!result.suggestion.is_empty());
    }
}
