//! Passage types
//!
//! A passage is the atomic retrievable unit: stable identifier, raw text,
//! and a flat string-to-string metadata map. Passages are owned by the
//! corpus; the index holds them behind an `Arc` and never mutates them.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

/// Stable passage identifier
///
/// Identifiers must be unique within a corpus and stable across rebuilds.
/// Ordering is plain lexicographic byte order and is used as the final
/// tie-breaker everywhere results are ranked.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassageId(String);

impl PassageId {
    /// Create a new identifier
    pub fn new(id: impl Into<String>) -> Self {
        PassageId(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PassageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PassageId {
    fn from(s: &str) -> Self {
        PassageId(s.to_string())
    }
}

impl From<String> for PassageId {
    fn from(s: String) -> Self {
        PassageId(s)
    }
}

impl Borrow<str> for PassageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PassageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A retrievable unit of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Unique, rebuild-stable identifier
    pub id: PassageId,

    /// Raw text content
    pub text: String,

    /// Attribute map used by the metadata filter
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Passage {
    /// Create a passage with no metadata
    pub fn new(id: impl Into<PassageId>, text: impl Into<String>) -> Self {
        Passage {
            id: id.into(),
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    /// Builder: add a metadata attribute
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Look up a metadata value
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passage_id_ordering_is_lexicographic() {
        let mut ids: Vec<PassageId> = vec!["p2".into(), "p10".into(), "p1".into()];
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(PassageId::as_str).collect();
        assert_eq!(sorted, vec!["p1", "p10", "p2"]);
    }

    #[test]
    fn test_passage_id_display() {
        assert_eq!(PassageId::new("doc-7").to_string(), "doc-7");
    }

    #[test]
    fn test_passage_builder() {
        let p = Passage::new("p1", "solar panel efficiency")
            .with_meta("topic", "solar")
            .with_meta("source", "arxiv");
        assert_eq!(p.id.as_str(), "p1");
        assert_eq!(p.meta("topic"), Some("solar"));
        assert_eq!(p.meta("missing"), None);
        assert_eq!(p.metadata.len(), 2);
    }

    #[test]
    fn test_passage_deserialize_without_metadata() {
        let p: Passage = serde_json::from_str(r#"{"id":"p1","text":"hello"}"#).unwrap();
        assert_eq!(p.id, PassageId::from("p1"));
        assert!(p.metadata.is_empty());
    }

    #[test]
    fn test_passage_id_serializes_transparently() {
        let json = serde_json::to_string(&PassageId::new("p9")).unwrap();
        assert_eq!(json, "\"p9\"");
    }
}
