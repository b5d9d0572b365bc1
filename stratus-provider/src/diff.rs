//! Structural diff between two property maps.
//!
//! The diff is derived, stateless, and discarded after use: it feeds the
//! replace-vs-update decision and tells an update which properties
//! actually changed. Nested structures compare by deep equality.

use std::collections::BTreeMap;

use crate::property::{PropertyMap, PropertyValue};

/// An old/new value pair for a changed property.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDiff {
    pub old: PropertyValue,
    pub new: PropertyValue,
}

/// Key-wise comparison of two property maps. A key present on one side
/// only counts as changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectDiff {
    /// Keys only present in the new map.
    pub adds: BTreeMap<String, PropertyValue>,
    /// Keys only present in the old map.
    pub deletes: BTreeMap<String, PropertyValue>,
    /// Keys present on both sides with unequal values.
    pub updates: BTreeMap<String, ValueDiff>,
}

impl ObjectDiff {
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.deletes.is_empty() && self.updates.is_empty()
    }

    /// Whether `key` was added, deleted, or updated.
    pub fn changed(&self, key: &str) -> bool {
        self.adds.contains_key(key)
            || self.deletes.contains_key(key)
            || self.updates.contains_key(key)
    }

    /// All changed keys, in order.
    pub fn changed_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .adds
            .keys()
            .chain(self.deletes.keys())
            .chain(self.updates.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys
    }
}

/// Computes the structural diff from `old` to `new`.
pub fn diff(old: &PropertyMap, new: &PropertyMap) -> ObjectDiff {
    let mut result = ObjectDiff::default();
    for (key, old_value) in old {
        match new.get(key) {
            None => {
                result.deletes.insert(key.clone(), old_value.clone());
            }
            Some(new_value) if new_value != old_value => {
                result.updates.insert(
                    key.clone(),
                    ValueDiff {
                        old: old_value.clone(),
                        new: new_value.clone(),
                    },
                );
            }
            Some(_) => {}
        }
    }
    for (key, new_value) in new {
        if !old.contains_key(key) {
            result.adds.insert(key.clone(), new_value.clone());
        }
    }
    result
}
