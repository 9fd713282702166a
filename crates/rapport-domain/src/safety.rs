//! Pre-send safety check record

use crate::tags::dedup_tags;
use serde::{Deserialize, Serialize};

/// Verdict on whether a drafted message is safe to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyCheckResult {
    /// True when no configured risk was triggered
    pub is_safe: bool,

    /// Names of the risks the draft triggered, ordered, case-sensitively
    /// deduplicated
    pub triggered_risks: Vec<String>,

    /// Human-readable advice on how to proceed
    pub suggestion: String,
}

impl SafetyCheckResult {
    /// Expected field names of the canonical schema
    pub const EXPECTED_FIELDS: [&'static str; 3] = ["isSafe", "triggeredRisks", "suggestion"];

    /// Construct a result, deduplicating the risk list
    pub fn new(is_safe: bool, triggered_risks: Vec<String>, suggestion: impl Into<String>) -> Self {
        Self {
            is_safe,
            triggered_risks: dedup_tags(triggered_risks),
            suggestion: suggestion.into(),
        }
    }
}
