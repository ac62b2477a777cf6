//! Metadata filter
//!
//! A filter is a set of `key = value` equality conditions over passage
//! metadata. All conditions must hold (AND). Matching is exact and
//! case-sensitive; there are no OR, negation, or range operators.

use crate::error::{RetrievalError, RetrievalResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Equality filter over passage metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Required key/value pairs (AND semantics)
    pub equals: BTreeMap<String, String>,
}

impl MetadataFilter {
    /// Create an empty filter (matches all)
    pub fn new() -> Self {
        MetadataFilter {
            equals: BTreeMap::new(),
        }
    }

    /// Add an equality condition
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    /// Parse a comma-separated list of `key=value` pairs
    ///
    /// Whitespace around keys and values is trimmed. An empty input
    /// yields an empty filter. Missing `=`, an empty key or value, and
    /// a repeated key are all rejected.
    pub fn parse(expr: &str) -> RetrievalResult<Self> {
        let mut filter = MetadataFilter::new();
        if expr.trim().is_empty() {
            return Ok(filter);
        }

        for clause in expr.split(',') {
            let clause = clause.trim();
            let Some((key, value)) = clause.split_once('=') else {
                return Err(RetrievalError::invalid_filter(format!(
                    "expected key=value, got '{}'",
                    clause
                )));
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                return Err(RetrievalError::invalid_filter(format!(
                    "empty key in '{}'",
                    clause
                )));
            }
            if value.is_empty() {
                return Err(RetrievalError::invalid_filter(format!(
                    "empty value for key '{}'",
                    key
                )));
            }
            if filter.equals.contains_key(key) {
                return Err(RetrievalError::invalid_filter(format!(
                    "duplicate key '{}'",
                    key
                )));
            }
            filter.equals.insert(key.to_string(), value.to_string());
        }

        Ok(filter)
    }

    /// Check if metadata satisfies every condition
    pub fn matches(&self, metadata: &HashMap<String, String>) -> bool {
        self.equals
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }

    /// Check if filter is empty (matches all)
    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    /// Number of conditions
    pub fn len(&self) -> usize {
        self.equals.len()
    }
}

impl FromStr for MetadataFilter {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetadataFilter::parse(s)
    }
}

impl fmt::Display for MetadataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.equals.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_metadata_filter_empty_matches_all() {
        let filter = MetadataFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&HashMap::new()));
        assert!(filter.matches(&meta(&[("any", "value")])));
    }

    #[test]
    fn test_metadata_filter_eq_match() {
        let filter = MetadataFilter::new().eq("topic", "solar").eq("lang", "en");
        assert_eq!(filter.len(), 2);

        assert!(filter.matches(&meta(&[("topic", "solar"), ("lang", "en"), ("x", "y")])));
        assert!(!filter.matches(&meta(&[("topic", "wind"), ("lang", "en")])));
        assert!(!filter.matches(&meta(&[("topic", "solar")])));
    }

    #[test]
    fn test_metadata_filter_case_sensitive() {
        let filter = MetadataFilter::new().eq("topic", "solar");
        assert!(!filter.matches(&meta(&[("topic", "Solar")])));
        assert!(!filter.matches(&meta(&[("Topic", "solar")])));
    }

    #[test]
    fn test_metadata_filter_no_partial_match() {
        let filter = MetadataFilter::new().eq("topic", "sol");
        assert!(!filter.matches(&meta(&[("topic", "solar")])));
    }

    #[test]
    fn test_parse_pairs() {
        let filter = MetadataFilter::parse(" topic = solar , source=arxiv ").unwrap();
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.equals.get("topic").map(String::as_str), Some("solar"));
        assert_eq!(filter.equals.get("source").map(String::as_str), Some("arxiv"));
    }

    #[test]
    fn test_parse_empty_is_match_all() {
        assert!(MetadataFilter::parse("").unwrap().is_empty());
        assert!(MetadataFilter::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_value_may_contain_equals() {
        let filter = MetadataFilter::parse("expr=a=b").unwrap();
        assert_eq!(filter.equals.get("expr").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["topic", "=solar", "topic=", "topic=solar,", "a=1,a=2"] {
            let err = MetadataFilter::parse(bad).unwrap_err();
            assert!(
                matches!(err, RetrievalError::InvalidFilter { .. }),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        let filter = MetadataFilter::new().eq("b", "2").eq("a", "1");
        assert_eq!(filter.to_string(), "a=1,b=2");
        let parsed: MetadataFilter = filter.to_string().parse().unwrap();
        assert_eq!(parsed, filter);
    }
}
