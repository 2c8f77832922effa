//! Property grouping
//!
//! A component-definition encodes table rows as flat property lists: every
//! property of one row shares the same `remarks` value. Grouping turns the
//! property bag back into rows.

use crate::oscal::{DefinedComponent, Property};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One row: property names mapped to values, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyRow {
    entries: Vec<(String, String)>,
}

impl PropertyRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a column; an overwritten column keeps its position
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PropertyRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertyRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut row = PropertyRow::new();
        for (k, v) in map {
            match v {
                serde_json::Value::String(s) => row.insert(&k, &s),
                other => row.insert(&k, &other.to_string()),
            }
        }
        Ok(row)
    }
}

/// Group properties by their `remarks` correlation key
///
/// Returns one row per distinct key, in the order keys are first seen.
/// Properties without remarks share a single ungrouped row.
pub fn group_by_correlation_key(props: &[Property]) -> Vec<PropertyRow> {
    let mut keys: Vec<Option<&str>> = Vec::new();
    let mut rows: Vec<PropertyRow> = Vec::new();

    for prop in props {
        let key = prop.remarks.as_deref();
        let index = match keys.iter().position(|k| *k == key) {
            Some(index) => index,
            None => {
                keys.push(key);
                rows.push(PropertyRow::new());
                rows.len() - 1
            }
        };
        rows[index].insert(&prop.name, &prop.value);
    }

    rows
}

/// Group a component's properties into rows
pub fn group_props_by_remarks(component: &DefinedComponent) -> Vec<PropertyRow> {
    group_by_correlation_key(&component.props)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str, value: &str, remarks: Option<&str>) -> Property {
        let p = Property::new(name, value);
        match remarks {
            Some(r) => p.with_remarks(r),
            None => p,
        }
    }

    #[test]
    fn test_groups_preserve_first_seen_order() {
        let props = vec![
            prop("Rule_Id", "R2", Some("r2")),
            prop("Rule_Id", "R1", Some("r1")),
            prop("Check_Id", "C2", Some("r2")),
            prop("Check_Id", "C1", Some("r1")),
        ];

        let rows = group_by_correlation_key(&props);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Rule_Id"), Some("R2"));
        assert_eq!(rows[0].get("Check_Id"), Some("C2"));
        assert_eq!(rows[1].get("Rule_Id"), Some("R1"));
    }

    #[test]
    fn test_props_without_remarks_share_one_bucket() {
        let props = vec![
            prop("Rule_Id", "R1", Some("r1")),
            prop("Comment", "a", None),
            prop("Other", "b", None),
        ];

        let rows = group_by_correlation_key(&props);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].len(), 2);
        assert!(!rows[1].contains("Rule_Id"));
    }

    #[test]
    fn test_repeated_name_overwrites_in_place() {
        let props = vec![
            prop("Rule_Id", "R1", Some("r1")),
            prop("Check_Id", "C1", Some("r1")),
            prop("Rule_Id", "R1b", Some("r1")),
        ];

        let rows = group_by_correlation_key(&props);
        let columns: Vec<(&str, &str)> = rows[0].iter().collect();
        assert_eq!(columns, vec![("Rule_Id", "R1b"), ("Check_Id", "C1")]);
    }

    #[test]
    fn test_row_serializes_as_ordered_map() {
        let row = PropertyRow::new().with("b", "2").with("a", "1");
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"b":"2","a":"1"}"#);
        let back: PropertyRow = serde_json::from_str(r#"{"b":"2","a":"1"}"#).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_empty_props_yield_no_rows() {
        assert!(group_by_correlation_key(&[]).is_empty());
    }
}
