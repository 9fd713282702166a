//! Chat analysis record and risk severity

use serde::{Deserialize, Serialize};

/// Severity assigned to a conversational move
///
/// A risk level is always present on an [`AnalysisResult`]; there is no
/// "unknown" state. When nothing indicates otherwise the level is `Safe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// No detected risk
    #[default]
    Safe,
    /// Proceed with caution
    Warning,
    /// High-severity risk, message should not be sent as-is
    Danger,
}

impl RiskLevel {
    /// Parse a risk level from the tokens LLMs actually emit
    ///
    /// Accepts the canonical uppercase names, common English aliases, and the
    /// localized forms observed in real responses. Unrecognized input maps to
    /// `Safe`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "danger" | "high" | "危险" | "高" | "高风险" => RiskLevel::Danger,
            "warning" | "medium" | "警告" | "注意" | "中" => RiskLevel::Warning,
            _ => RiskLevel::Safe,
        }
    }

    /// Canonical uppercase name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Warning => "WARNING",
            RiskLevel::Danger => "DANGER",
        }
    }
}

/// Result of analyzing a chat exchange: what to reply and why
///
/// All three fields are required by the canonical schema; the strict decoder
/// rejects documents missing any of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Suggested reply text, ready to send
    pub reply_suggestion: String,

    /// Reasoning about the other party's state and the recommended strategy
    pub strategy_analysis: String,

    /// Severity of continuing the conversation as suggested
    pub risk_level: RiskLevel,
}

impl AnalysisResult {
    /// Expected field names of the canonical schema
    pub const EXPECTED_FIELDS: [&'static str; 3] =
        ["replySuggestion", "strategyAnalysis", "riskLevel"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_default_is_safe() {
        assert_eq!(RiskLevel::default(), RiskLevel::Safe);
    }

    #[test]
    fn test_risk_level_from_label_aliases() {
        assert_eq!(RiskLevel::from_label("DANGER"), RiskLevel::Danger);
        assert_eq!(RiskLevel::from_label("危险"), RiskLevel::Danger);
        assert_eq!(RiskLevel::from_label("注意"), RiskLevel::Warning);
        assert_eq!(RiskLevel::from_label("medium"), RiskLevel::Warning);
        assert_eq!(RiskLevel::from_label("安全"), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_label("garbage"), RiskLevel::Safe);
    }

    #[test]
    fn test_risk_level_wire_format() {
        let json = serde_json::to_string(&RiskLevel::Danger).unwrap();
        assert_eq!(json, "\"DANGER\"");
        let parsed: RiskLevel = serde_json::from_str("\"WARNING\"").unwrap();
        assert_eq!(parsed, RiskLevel::Warning);
    }

    #[test]
    fn test_analysis_result_camel_case_keys() {
        let json = r#"{"replySuggestion":"hi","strategyAnalysis":"friendly","riskLevel":"SAFE"}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.reply_suggestion, "hi");
        assert_eq!(result.strategy_analysis, "friendly");
        assert_eq!(result.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn test_analysis_result_missing_field_rejected() {
        let json = r#"{"replySuggestion":"hi"}"#;
        assert!(serde_json::from_str::<AnalysisResult>(json).is_err());
    }
}
