use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::nlp::{LABEL_PERSON, LABEL_SKILL};

/// The five fixed output categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    PersonName,
    Skill,
    WorkExperience,
    Certification,
    ContactInfo,
}

/// Display key for each category, in column order.
const DISPLAY_KEYS: [(Category, &str); 5] = [
    (Category::PersonName, "Person Name"),
    (Category::Skill, "Skill"),
    (Category::WorkExperience, "Work Experience"),
    (Category::Certification, "Certification"),
    (Category::ContactInfo, "Contact Info"),
];

impl Category {
    pub const ALL: [Category; 5] = [
        Category::PersonName,
        Category::Skill,
        Category::WorkExperience,
        Category::Certification,
        Category::ContactInfo,
    ];

    pub fn display_key(&self) -> &'static str {
        DISPLAY_KEYS
            .iter()
            .find(|(c, _)| c == self)
            .map(|(_, key)| *key)
            .unwrap_or_default()
    }

    /// Category fed directly by a pipeline entity label, if any.
    pub fn for_entity_label(label: &str) -> Option<Category> {
        match label {
            LABEL_PERSON => Some(Category::PersonName),
            LABEL_SKILL => Some(Category::Skill),
            _ => None,
        }
    }
}

/// Category → unique matched strings. Every category is always present.
///
/// Sets are ordered only so responses are stable; membership is what counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    categories: BTreeMap<Category, BTreeSet<String>>,
}

impl Default for ExtractionResult {
    fn default() -> Self {
        Self {
            categories: Category::ALL
                .iter()
                .map(|c| (*c, BTreeSet::new()))
                .collect(),
        }
    }
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the value was already present.
    pub fn insert(&mut self, category: Category, value: impl Into<String>) -> bool {
        self.categories.entry(category).or_default().insert(value.into())
    }

    pub fn get(&self, category: Category) -> &BTreeSet<String> {
        // Every category is seeded in `default`.
        &self.categories[&category]
    }

    pub fn contains(&self, category: Category, value: &str) -> bool {
        self.get(category).contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &BTreeSet<String>)> {
        self.categories.iter().map(|(c, set)| (*c, set))
    }

    pub fn total(&self) -> usize {
        self.categories.values().map(BTreeSet::len).sum()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Column-per-category table; shorter columns are padded with `None`.
    pub fn to_table(&self) -> ExtractionTable {
        let columns: Vec<String> = Category::ALL
            .iter()
            .map(|c| c.display_key().to_string())
            .collect();
        let values: Vec<Vec<&String>> = Category::ALL
            .iter()
            .map(|c| self.get(*c).iter().collect())
            .collect();
        let height = values.iter().map(Vec::len).max().unwrap_or(0);
        let rows = (0..height)
            .map(|row| {
                values
                    .iter()
                    .map(|column| column.get(row).map(|v| v.to_string()))
                    .collect()
            })
            .collect();
        ExtractionTable { columns, rows }
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::ALL.len()))?;
        for category in Category::ALL {
            map.serialize_entry(category.display_key(), self.get(category))?;
        }
        map.end()
    }
}

/// Tabular projection of an `ExtractionResult` for the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keys_are_fixed() {
        let keys: Vec<_> = Category::ALL.iter().map(|c| c.display_key()).collect();
        assert_eq!(
            keys,
            vec![
                "Person Name",
                "Skill",
                "Work Experience",
                "Certification",
                "Contact Info"
            ]
        );
    }

    #[test]
    fn test_entity_label_mapping() {
        assert_eq!(Category::for_entity_label("PERSON"), Some(Category::PersonName));
        assert_eq!(Category::for_entity_label("SKILL"), Some(Category::Skill));
        assert_eq!(Category::for_entity_label("ORG"), None);
    }

    #[test]
    fn test_new_result_has_all_keys_empty() {
        let result = ExtractionResult::new();
        for category in Category::ALL {
            assert!(result.get(category).is_empty());
        }
        assert!(result.is_empty());
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut result = ExtractionResult::new();
        assert!(result.insert(Category::Skill, "Rust"));
        assert!(!result.insert(Category::Skill, "Rust"));
        assert_eq!(result.get(Category::Skill).len(), 1);
        assert_eq!(result.total(), 1);
    }

    #[test]
    fn test_serializes_with_display_keys() {
        let mut result = ExtractionResult::new();
        result.insert(Category::ContactInfo, "jane@example.com");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["Contact Info"][0], "jane@example.com");
        assert_eq!(json["Person Name"], serde_json::json!([]));
        assert_eq!(json.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_table_pads_short_columns() {
        let mut result = ExtractionResult::new();
        result.insert(Category::Skill, "Go");
        result.insert(Category::Skill, "Rust");
        result.insert(Category::PersonName, "Jane Doe");
        let table = result.to_table();
        assert_eq!(table.columns.len(), 5);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0].as_deref(), Some("Jane Doe"));
        assert_eq!(table.rows[1][0], None);
        assert_eq!(table.rows[1][1].as_deref(), Some("Rust"));
        assert!(table.rows.iter().all(|r| r.len() == 5));
    }

    #[test]
    fn test_empty_table_has_columns_and_no_rows() {
        let table = ExtractionResult::new().to_table();
        assert_eq!(table.columns.len(), 5);
        assert!(table.rows.is_empty());
    }
}
