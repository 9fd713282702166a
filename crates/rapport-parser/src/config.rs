//! Configuration for the response parser

use serde::{Deserialize, Serialize};

/// Tunable thresholds of the recovery pipeline
///
/// The numeric defaults are empirically chosen and load-bearing: callers that
/// override them change which recovery path wins for borderline responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Minimum overall quality for a field-extraction recovery to be accepted
    pub accept_threshold: f64,

    /// Minimum similarity for a fuzzy field-name match
    pub fuzzy_threshold: f64,

    /// Minimum confidence below which `learn_mapping` rejects a candidate
    pub learn_threshold: f64,

    /// Run the fuzzy pass during field mapping
    pub enable_fuzzy_mapping: bool,

    /// Run free-text inference when field extraction scores too low
    pub enable_inference: bool,

    /// Emit per-tier debug logging
    pub detailed_logging: bool,
}

impl ParserConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            return Err("accept_threshold must be in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err("fuzzy_threshold must be in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.learn_threshold) {
            return Err("learn_threshold must be in [0, 1]".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.3,
            fuzzy_threshold: 0.7,
            learn_threshold: 0.5,
            enable_fuzzy_mapping: true,
            enable_inference: true,
            detailed_logging: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ParserConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let mut config = ParserConfig::default();
        config.accept_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ParserConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ParserConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config.accept_threshold, parsed.accept_threshold);
        assert_eq!(config.fuzzy_threshold, parsed.fuzzy_threshold);
        assert_eq!(config.enable_inference, parsed.enable_inference);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(ParserConfig::from_toml("not = [valid").is_err());
    }
}
