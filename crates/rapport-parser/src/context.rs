//! Per-call metadata threaded through the recovery pipeline

use std::collections::HashMap;
use uuid::Uuid;

/// Immutable per-call metadata, created once per parse request
///
/// The operation id correlates the log lines of every strategy and tier
/// attempted for one response.
#[derive(Debug, Clone)]
pub struct ParsingContext {
    /// Unique id for this parse call (UUIDv7)
    pub operation_id: String,

    /// What the caller was doing (e.g. "analyze", "safety_check")
    pub operation_type: String,

    /// Name of the model that produced the response
    pub model_name: String,

    /// Emit per-attempt debug logging
    pub detailed_logging: bool,

    /// Arbitrary caller-supplied properties
    pub properties: HashMap<String, String>,
}

impl ParsingContext {
    /// Create a context with a fresh operation id
    pub fn new(operation_type: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            operation_id: Uuid::now_v7().to_string(),
            operation_type: operation_type.into(),
            model_name: model_name.into(),
            detailed_logging: false,
            properties: HashMap::new(),
        }
    }

    /// Enable per-attempt debug logging
    pub fn with_detailed_logging(mut self, enabled: bool) -> Self {
        self.detailed_logging = enabled;
        self
    }

    /// Attach a caller-supplied property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Derive the fallback context, capturing the original uncleaned text
    pub fn to_fallback_context(&self, raw: &str, enable_inference: bool) -> FallbackContext {
        FallbackContext {
            operation_id: self.operation_id.clone(),
            operation_type: self.operation_type.clone(),
            model_name: self.model_name.clone(),
            raw: raw.to_string(),
            enable_inference,
            detailed_logging: self.detailed_logging,
        }
    }
}

impl Default for ParsingContext {
    fn default() -> Self {
        Self::new("parse", "unknown")
    }
}

/// Context handed to the fallback ladder after the strategy chain failed
///
/// Carries the *original* raw text, not the cleaned variant, so free-text
/// inference sees everything the model actually wrote.
#[derive(Debug, Clone)]
pub struct FallbackContext {
    /// Operation id inherited from the parsing context
    pub operation_id: String,
    /// Operation type inherited from the parsing context
    pub operation_type: String,
    /// Model name inherited from the parsing context
    pub model_name: String,
    /// Raw, uncleaned response text
    pub raw: String,
    /// Whether tiers 6-7 may run as a second pass
    pub enable_inference: bool,
    /// Emit per-tier debug logging
    pub detailed_logging: bool,
}

/// Options controlling one field-mapping call
#[derive(Debug, Clone)]
pub struct MappingContext {
    /// Run the fuzzy pass over keys the exact pass did not rewrite
    pub enable_fuzzy: bool,
    /// Minimum similarity for a fuzzy match
    pub fuzzy_threshold: f64,
    /// Emit per-replacement debug logging
    pub detailed_logging: bool,
}

impl Default for MappingContext {
    fn default() -> Self {
        Self {
            enable_fuzzy: false,
            fuzzy_threshold: 0.7,
            detailed_logging: false,
        }
    }
}

impl MappingContext {
    /// Enable the fuzzy pass at the given similarity threshold
    pub fn with_fuzzy(mut self, threshold: f64) -> Self {
        self.enable_fuzzy = true;
        self.fuzzy_threshold = threshold;
        self
    }
}
