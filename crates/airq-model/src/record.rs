//! One decoded input row.

use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Normalized header name to coerced value, for a single input row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, replacing any earlier value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when no field carries a value. A record without fields counts as
    /// all-null.
    pub fn is_all_null(&self) -> bool {
        self.fields.values().all(Value::is_null)
    }

    pub fn values_mut(&mut self) -> btree_map::ValuesMut<'_, String, Value> {
        self.fields.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_null() {
        let record: Record = [("co_gt", Value::Null), ("t", Value::Null)]
            .into_iter()
            .collect();
        assert!(record.is_all_null());

        let record: Record = [("co_gt", Value::Null), ("t", Value::Number(13.6))]
            .into_iter()
            .collect();
        assert!(!record.is_all_null());
    }

    #[test]
    fn test_empty_record_is_all_null() {
        assert!(Record::new().is_all_null());
    }

    #[test]
    fn test_insert_replaces() {
        let mut record = Record::new();
        assert_eq!(record.insert("rh", Value::Number(48.9)), None);
        assert_eq!(
            record.insert("rh", Value::Number(47.7)),
            Some(Value::Number(48.9))
        );
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("rh"), Some(&Value::Number(47.7)));
    }
}
