//! Rapport Domain Layer
//!
//! This crate contains the record types recovered from LLM responses and the
//! value objects that describe how well a recovery went. It holds no parsing
//! logic of its own; the recovery pipeline lives in `rapport-parser`.
//!
//! ## Key Concepts
//!
//! - **Record**: a closed sum type over the canonical record shapes the
//!   assistant understands (analysis, safety check, extraction) plus one
//!   generic open variant
//! - **RiskLevel**: three-valued severity that is never absent
//! - **ParseQuality**: composite `[0, 1]` score attached to any recovered
//!   record
//!
//! ## Architecture
//!
//! All types here are immutable value objects: once a record is returned from
//! a parse it is never mutated, so instances can be shared across threads
//! freely. Serde attributes define the canonical wire schema that the strict
//! and lenient decoders in `rapport-parser` target.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod extraction;
pub mod quality;
pub mod record;
pub mod safety;
pub mod tags;

// Re-exports for convenience
pub use analysis::{AnalysisResult, RiskLevel};
pub use extraction::ExtractedData;
pub use quality::ParseQuality;
pub use record::{Record, RecordKind};
pub use safety::SafetyCheckResult;
pub use tags::dedup_tags;
