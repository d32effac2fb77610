//! Contribution payload model.
//!
//! # Responsibility
//! - Hold one fragment's mapping from group key to description items.
//! - Keep the payload byte-for-byte as the generator produced it.
//!
//! # Invariants
//! - Group order is the order in which each key was first inserted.
//! - Re-inserting an existing key replaces its items in place (last wins).
//! - Items are opaque: never trimmed, escaped, reordered or validated.
//! - An empty item list is a legal value and is kept.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Formatter;

/// One group of description items inside a contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementorGroup {
    /// Logical source of the items, usually a crate name.
    pub key: String,
    /// Opaque description items in generator order.
    pub items: Vec<String>,
}

/// One fragment's contribution to the shared implementor index.
///
/// Serialized as a JSON object whose keys appear in group order, matching the
/// object literal the fragment script builds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contribution {
    groups: Vec<ImplementorGroup>,
}

impl Contribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`Contribution::insert`].
    pub fn with_group<K, I, S>(mut self, key: K, items: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(key, items.into_iter().map(Into::into).collect());
        self
    }

    /// Assigns `items` to `key`.
    ///
    /// Returns the items previously stored under `key`, if any. The key keeps
    /// the position of its first insertion.
    pub fn insert(&mut self, key: impl Into<String>, items: Vec<String>) -> Option<Vec<String>> {
        let key = key.into();
        if let Some(group) = self.groups.iter_mut().find(|group| group.key == key) {
            return Some(std::mem::replace(&mut group.items, items));
        }
        self.groups.push(ImplementorGroup { key, items });
        None
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|group| group.key == key)
            .map(|group| group.items.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.groups.iter().any(|group| group.key == key)
    }

    /// Returns group keys in group order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.key.as_str())
    }

    pub fn groups(&self) -> &[ImplementorGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<ImplementorGroup> {
        self.groups
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of description items across all groups.
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }
}

impl<K, S> FromIterator<(K, Vec<S>)> for Contribution
where
    K: Into<String>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, Vec<S>)>>(iter: T) -> Self {
        let mut contribution = Contribution::new();
        for (key, items) in iter {
            contribution.insert(key, items.into_iter().map(Into::into).collect());
        }
        contribution
    }
}

impl Serialize for Contribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.key, &group.items)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Contribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ContributionVisitor)
    }
}

struct ContributionVisitor;

impl<'de> Visitor<'de> for ContributionVisitor {
    type Value = Contribution;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a map from group key to a list of description items")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut contribution = Contribution::new();
        while let Some((key, items)) = access.next_entry::<String, Vec<String>>()? {
            contribution.insert(key, items);
        }
        Ok(contribution)
    }
}

#[cfg(test)]
mod tests {
    use super::Contribution;

    #[test]
    fn insert_keeps_first_position_and_replaces_items() {
        let mut contribution = Contribution::new()
            .with_group("libc", Vec::<String>::new())
            .with_group("rand", ["a"]);

        let previous = contribution.insert("libc", vec!["b".to_string()]);

        assert_eq!(previous, Some(vec![]));
        assert_eq!(contribution.keys().collect::<Vec<_>>(), vec!["libc", "rand"]);
        assert_eq!(contribution.get("libc"), Some(&["b".to_string()][..]));
    }

    #[test]
    fn empty_group_is_present() {
        let contribution = Contribution::new().with_group("libc", Vec::<String>::new());

        assert!(contribution.contains_key("libc"));
        assert_eq!(contribution.get("libc"), Some(&[][..]));
        assert_eq!(contribution.item_count(), 0);
        assert_eq!(contribution.len(), 1);
    }

    #[test]
    fn items_are_not_normalized() {
        let raw = "  impl <a class='trait'>Default</a> for X\n";
        let contribution = Contribution::new().with_group("rand", [raw, raw]);

        assert_eq!(
            contribution.get("rand"),
            Some(&[raw.to_string(), raw.to_string()][..])
        );
    }

    #[test]
    fn missing_key_returns_none() {
        let contribution = Contribution::new();
        assert!(contribution.get("rand").is_none());
        assert!(contribution.is_empty());
    }
}
