//! End-to-end recovery tests over the full pipeline

use proptest::prelude::*;
use rapport_parser::{
    DefaultCleaner, FieldMapper, FieldTable, MappingContext, ParseOrigin, ParserConfig,
    ParsingContext, Record, RecordKind, ResponseParser, RiskLevel, Strategy,
};
use std::sync::Arc;

fn ctx() -> ParsingContext {
    ParsingContext::new("test", "test-model")
}

#[test]
fn canonical_json_round_trips_unchanged() {
    let parser = ResponseParser::new();
    let raw = r#"{"replySuggestion":"周末去爬山怎么样？","strategyAnalysis":"对方在试探共同兴趣","riskLevel":"WARNING"}"#;
    let result = parser.parse_analysis_result(raw, &ctx()).unwrap();
    assert_eq!(result.reply_suggestion, "周末去爬山怎么样？");
    assert_eq!(result.strategy_analysis, "对方在试探共同兴趣");
    assert_eq!(result.risk_level, RiskLevel::Warning);
}

#[test]
fn canonical_json_wins_on_strict_without_fallback() {
    let parser = ResponseParser::new();
    let cases = [
        (
            RecordKind::Analysis,
            r#"{"replySuggestion":"hi","strategyAnalysis":"ok","riskLevel":"SAFE"}"#,
        ),
        (
            RecordKind::SafetyCheck,
            r#"{"isSafe":true,"triggeredRisks":[],"suggestion":"ok"}"#,
        ),
        (
            RecordKind::Extraction,
            r#"{"facts":{"爱好":"摄影"},"redTags":[],"greenTags":["有耐心"]}"#,
        ),
    ];
    for (kind, raw) in cases {
        let (_, origin) = parser.parse_with_origin(raw, kind, &ctx()).unwrap();
        assert_eq!(
            origin,
            ParseOrigin::Strategy(Strategy::Strict),
            "{} did not short-circuit on strict",
            kind
        );
    }
}

#[test]
fn fenced_and_prose_wrapped_json_parses() {
    let parser = ResponseParser::new();
    let raw = "好的，这是分析结果：\n```json\n{\"replySuggestion\": \"hi\", \"strategyAnalysis\": \"ok\", \"riskLevel\": \"SAFE\"}\n```\n希望有帮助！";
    let result = parser.parse_analysis_result(raw, &ctx()).unwrap();
    assert_eq!(result.reply_suggestion, "hi");
}

#[test]
fn localized_synonym_json_yields_full_analysis() {
    let parser = ResponseParser::new();
    let raw = r#"{"回复建议":"你好","策略分析":"对方很友好","风险等级":"安全"}"#;
    let result = parser.parse_analysis_result(raw, &ctx()).unwrap();
    assert_eq!(result.reply_suggestion, "你好");
    assert_eq!(result.strategy_analysis, "对方很友好");
    assert_eq!(result.risk_level, RiskLevel::Safe);
}

#[test]
fn high_severity_keyword_forces_danger() {
    let parser = ResponseParser::new();
    let result = parser
        .parse_analysis_result("这个话题很危险，马上换话题", &ctx())
        .unwrap();
    assert_eq!(result.risk_level, RiskLevel::Danger);
}

#[test]
fn medium_severity_keyword_forces_warning() {
    let parser = ResponseParser::new();
    let result = parser
        .parse_analysis_result("有一点风险，措辞要委婉", &ctx())
        .unwrap();
    assert_eq!(result.risk_level, RiskLevel::Warning);
}

#[test]
fn no_risk_keyword_defaults_to_safe() {
    let parser = ResponseParser::new();
    let result = parser
        .parse_analysis_result("聊得很开心，继续保持", &ctx())
        .unwrap();
    assert_eq!(result.risk_level, RiskLevel::Safe);
}

#[test]
fn unstructured_text_recovers_relevant_red_tag() {
    let parser = ResponseParser::new();
    let result = parser
        .parse_extracted_data("not json at all 风险 禁止谈论前任", &ctx())
        .unwrap();
    assert!(result.red_tags.iter().any(|t| t.contains("前任")));
}

#[test]
fn truncated_json_is_repaired() {
    let parser = ResponseParser::new();
    let raw = r#"{"isSafe": false, "triggeredRisks": ["提及收入"], "suggestion": "换话题"#;
    let result = parser.parse_safety_check(raw, &ctx()).unwrap();
    assert!(!result.is_safe);
}

#[test]
fn tag_lists_dedup_case_sensitively() {
    let parser = ResponseParser::new();
    let raw = r#"{"facts":{"爱好":"摄影"},"redTags":["A","a","A"," A "],"greenTags":[]}"#;
    let result = parser.parse_extracted_data(raw, &ctx()).unwrap();
    assert_eq!(result.red_tags, vec!["A", "a"]);
}

#[test]
fn nested_wrapper_object_is_unwrapped() {
    let parser = ResponseParser::new();
    let raw = r#"{"analysis": {"回复建议": "好的", "策略分析": "语气平和"}}"#;
    let result = parser.parse_analysis_result(raw, &ctx()).unwrap();
    assert_eq!(result.reply_suggestion, "好的");
    assert_eq!(result.strategy_analysis, "语气平和");
}

#[test]
fn canonical_kinds_never_fail() {
    let parser = ResponseParser::new();
    let inputs = ["", "{}", "垃圾数据", "{{{{", "null", "[1,2,3]", "```json```"];
    for raw in inputs {
        assert!(parser.parse_analysis_result(raw, &ctx()).is_ok(), "analysis failed on {:?}", raw);
        assert!(parser.parse_safety_check(raw, &ctx()).is_ok(), "safety failed on {:?}", raw);
        assert!(parser.parse_extracted_data(raw, &ctx()).is_ok(), "extraction failed on {:?}", raw);
    }
}

#[test]
fn generic_kind_fails_only_without_an_object() {
    let parser = ResponseParser::new();
    assert!(parser.parse("prose only", RecordKind::Generic, &ctx()).is_err());
    match parser.parse(r#"{"回复建议":"hi"}"#, RecordKind::Generic, &ctx()).unwrap() {
        Record::Generic(map) => assert!(map.contains_key("replySuggestion")),
        other => panic!("unexpected record: {:?}", other),
    }
}

#[test]
fn identical_input_yields_identical_output() {
    let parser = ResponseParser::new();
    let raw = "对方提到了工作和前任，注意分寸";
    let a = parser.parse(raw, RecordKind::Extraction, &ctx()).unwrap();
    let b = parser.parse(raw, RecordKind::Extraction, &ctx()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn field_mapping_is_idempotent() {
    let mapper = FieldMapper::new();
    let mapping = MappingContext::default().with_fuzzy(0.7);
    let json = r#"{"回复建议":"你好","风险等级":"安全","雷区":["前任"]}"#;
    let once = mapper.map_fields(json, &mapping);
    let twice = mapper.map_fields(&once, &mapping);
    assert_eq!(once, twice);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = ParserConfig {
        accept_threshold: 2.0,
        ..ParserConfig::default()
    };
    assert!(ResponseParser::with_config(config).is_err());
}

#[test]
fn malformed_mapping_resource_falls_back_to_builtin_table() {
    let table = FieldTable::from_toml_or_default("this is [ not toml");
    let mapper = Arc::new(FieldMapper::with_table(table));
    let parser = ResponseParser::with_mapper(DefaultCleaner, mapper, ParserConfig::default());
    let raw = r#"{"回复建议":"你好","策略分析":"友好","风险等级":"安全"}"#;
    let result = parser.parse_analysis_result(raw, &ctx()).unwrap();
    assert_eq!(result.reply_suggestion, "你好");
}

#[test]
fn disabled_inference_still_recovers_via_defaults() {
    let config = ParserConfig {
        enable_inference: false,
        ..ParserConfig::default()
    };
    let parser = ResponseParser::with_config(config).unwrap();
    let result = parser.parse_analysis_result("完全无关的文本", &ctx()).unwrap();
    assert!(!result.reply_suggestion.is_empty());
}

proptest! {
    // Termination and totality: arbitrary input must neither panic nor fail
    // for the canonical kinds
    #[test]
    fn prop_never_panics_on_arbitrary_input(raw in ".{0,300}") {
        let parser = ResponseParser::new();
        prop_assert!(parser.parse_analysis_result(&raw, &ctx()).is_ok());
        prop_assert!(parser.parse_safety_check(&raw, &ctx()).is_ok());
        prop_assert!(parser.parse_extracted_data(&raw, &ctx()).is_ok());
    }

    #[test]
    fn prop_mapping_output_stays_parseable(
        reply in "[a-z甲乙丙丁]{0,12}",
        strategy in "[a-z甲乙丙丁]{0,12}",
    ) {
        let parser = ResponseParser::new();
        let raw = format!(
            r#"{{"回复建议":"{}","策略分析":"{}","风险等级":"安全"}}"#,
            reply, strategy
        );
        let result = parser.parse_analysis_result(&raw, &ctx()).unwrap();
        prop_assert_eq!(result.reply_suggestion, reply.trim());
        prop_assert_eq!(result.strategy_analysis, strategy.trim());
    }
}
