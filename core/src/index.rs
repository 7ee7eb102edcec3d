#![deny(missing_docs)]

//! # Included Index
//!
//! Per-call lookup table over a document's `included` list, keyed by
//! `type:::id`. Each entry holds the raw resource until it is resolved, then
//! the resolved result, so a resource is validated and flattened at most once
//! per parse call.

use serde_json::Value;
use std::collections::HashMap;

/// One side-loaded resource.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludedEntry {
    /// The raw resource object. Taken out once resolution starts.
    pub raw: Value,
    /// The resolved resource, once available.
    pub processed: Option<Value>,
}

/// Lookup table of side-loaded resources.
#[derive(Debug, Default)]
pub struct IncludedIndex {
    entries: HashMap<String, IncludedEntry>,
}

/// Builds the index key for a resource.
pub fn index_key(resource_type: &str, id: &str) -> String {
    format!("{resource_type}:::{id}")
}

impl IncludedIndex {
    /// Builds the index from validated included resources. Later duplicates win.
    pub fn build(included: Vec<Value>) -> Self {
        let entries = included
            .into_iter()
            .filter_map(|raw| {
                let key = index_key(raw.get("type")?.as_str()?, raw.get("id")?.as_str()?);
                Some((
                    key,
                    IncludedEntry {
                        raw,
                        processed: None,
                    },
                ))
            })
            .collect();
        Self { entries }
    }

    /// Looks up an entry mutably.
    pub fn get_mut(&mut self, resource_type: &str, id: &str) -> Option<&mut IncludedEntry> {
        self.entries.get_mut(&index_key(resource_type, id))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_and_lookup() {
        let mut index = IncludedIndex::build(vec![
            json!({"type": "person", "id": "1", "attributes": {"name": "A"}}),
            json!({"type": "tag", "id": "1"}),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.get_mut("person", "1").unwrap().raw["attributes"]["name"],
            json!("A")
        );
        assert!(index.get_mut("person", "1").unwrap().processed.is_none());
        assert!(index.get_mut("person", "2").is_none());
    }

    #[test]
    fn test_later_duplicate_wins() {
        let mut index = IncludedIndex::build(vec![
            json!({"type": "person", "id": "1", "v": 1}),
            json!({"type": "person", "id": "1", "v": 2}),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get_mut("person", "1").unwrap().raw["v"], json!(2));
    }

    #[test]
    fn test_key_format() {
        assert_eq!(index_key("person", "7"), "person:::7");
    }
}
