//! Rapport Parser
//!
//! Recovers structured records from unreliable LLM chat-assistant responses.
//!
//! # Overview
//!
//! Models wrap JSON in markdown fences, localize field names, emit half-valid
//! syntax, or answer in free prose. This crate turns all of that into typed
//! records: every parse call cleans the response, runs a strict → lenient →
//! generic strategy chain, and on exhaustion hands the original text to a
//! seven-tier fallback ladder that always produces *something* for the three
//! canonical record kinds.
//!
//! # Architecture
//!
//! ```text
//! Raw response → Cleaner → Strict → Lenient → Generic → Fallback ladder
//!                                     (field mapper)      (7 tiers + scoring)
//! ```
//!
//! # Key Features
//!
//! - **Total recovery**: analysis, safety-check, and extraction targets never
//!   fail; the worst case is a canned default scored at 0.1
//! - **Field canonicalization**: localized and ecosystem-variant key names are
//!   rewritten to the canonical schema, exactly or fuzzily
//! - **Quality scoring**: every recovered record carries completeness,
//!   accuracy, and confidence components behind an acceptance threshold
//! - **Deterministic**: identical input always yields an identical record
//!
//! # Example Usage
//!
//! ```
//! use rapport_parser::{ParsingContext, ResponseParser};
//!
//! let parser = ResponseParser::new();
//! let ctx = ParsingContext::new("analyze", "demo-model");
//!
//! let raw = r#"```json
//! {"回复建议": "你好", "策略分析": "对方很友好", "风险等级": "安全"}
//! ```"#;
//!
//! let result = parser.parse_analysis_result(raw, &ctx)?;
//! assert_eq!(result.reply_suggestion, "你好");
//! # Ok::<(), rapport_parser::ParserError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod clean;
mod config;
mod context;
mod error;
mod fallback;
mod mapping;
mod parser;
mod strategy;
mod synonyms;
mod value;

pub use clean::{Cleaner, CleaningOptions, DefaultCleaner};
pub use config::ParserConfig;
pub use context::{FallbackContext, MappingContext, ParsingContext};
pub use error::ParserError;
pub use fallback::{FallbackHandler, FallbackOutcome, FallbackStrategy};
pub use mapping::{FieldEntry, FieldMapper, FieldTable, MappingStatistics};
pub use parser::{ParseOrigin, ResponseParser};
pub use strategy::Strategy;

pub use rapport_domain::{
    AnalysisResult, ExtractedData, ParseQuality, Record, RecordKind, RiskLevel, SafetyCheckResult,
};
