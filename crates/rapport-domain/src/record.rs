//! Closed sum type over the recoverable record shapes

use crate::{AnalysisResult, ExtractedData, SafetyCheckResult};
use serde_json::{Map, Value};
use std::fmt;

/// Tag naming one of the recoverable record shapes
///
/// The set is closed: adding a new record kind is a compile-time-checked
/// change, since every dispatch site matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// [`AnalysisResult`]
    Analysis,
    /// [`SafetyCheckResult`]
    SafetyCheck,
    /// [`ExtractedData`]
    Extraction,
    /// Untyped key/value map, for callers that post-process themselves
    Generic,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Analysis => "AnalysisResult",
            RecordKind::SafetyCheck => "SafetyCheckResult",
            RecordKind::Extraction => "ExtractedData",
            RecordKind::Generic => "Generic",
        };
        f.write_str(name)
    }
}

/// A recovered record of one of the known shapes
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Chat analysis
    Analysis(AnalysisResult),
    /// Pre-send safety check
    SafetyCheck(SafetyCheckResult),
    /// Contact-fact extraction
    Extraction(ExtractedData),
    /// Untyped canonicalized map
    Generic(Map<String, Value>),
}

impl Record {
    /// The tag matching this record's shape
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Analysis(_) => RecordKind::Analysis,
            Record::SafetyCheck(_) => RecordKind::SafetyCheck,
            Record::Extraction(_) => RecordKind::Extraction,
            Record::Generic(_) => RecordKind::Generic,
        }
    }
}
