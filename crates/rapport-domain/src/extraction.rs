//! Contact-fact extraction record

use crate::tags::dedup_tags;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Facts and conversation tags extracted from a chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    /// Key/value facts about the contact (birthday, hobby, ...)
    pub facts: HashMap<String, String>,

    /// Topics to avoid, ordered and case-sensitively deduplicated
    pub red_tags: Vec<String>,

    /// Topics that work well, ordered and case-sensitively deduplicated
    pub green_tags: Vec<String>,
}

impl ExtractedData {
    /// Expected field names of the canonical schema
    pub const EXPECTED_FIELDS: [&'static str; 3] = ["facts", "redTags", "greenTags"];

    /// Construct a record, deduplicating both tag lists
    pub fn new(
        facts: HashMap<String, String>,
        red_tags: Vec<String>,
        green_tags: Vec<String>,
    ) -> Self {
        Self {
            facts,
            red_tags: dedup_tags(red_tags),
            green_tags: dedup_tags(green_tags),
        }
    }

    /// True when no field carries any content
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.red_tags.is_empty() && self.green_tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_deduplicates_tags() {
        let data = ExtractedData::new(
            HashMap::new(),
            vec!["A".to_string(), "a".to_string(), "A".to_string()],
            vec![],
        );
        // Case-sensitive: "A" and "a" are distinct
        assert_eq!(data.red_tags, vec!["A", "a"]);
    }

    #[test]
    fn test_camel_case_keys() {
        let json = r#"{"facts":{"爱好":"摄影"},"redTags":["前任"],"greenTags":["旅行"]}"#;
        let data: ExtractedData = serde_json::from_str(json).unwrap();
        assert_eq!(data.facts.get("爱好").map(String::as_str), Some("摄影"));
        assert_eq!(data.red_tags, vec!["前任"]);
    }

    #[test]
    fn test_is_empty() {
        let data = ExtractedData::new(HashMap::new(), vec![], vec![]);
        assert!(data.is_empty());
    }
}
