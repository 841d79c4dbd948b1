//! Header resolution.
//!
//! A [`HeaderMap`] is built once per input, on the first row: from the
//! header row itself, from a record type's declared column order, or
//! synthesized as `column{i}`. It is immutable after construction.

use hashbrown::HashMap;

/// Column-name to column-index mapping for one input.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl HeaderMap {
    /// Build from the field strings of a header row.
    ///
    /// On duplicate names the first occurrence wins, matching
    /// position-independent lookup expectations.
    #[must_use]
    pub fn from_row(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    /// Build from a declared column order.
    #[must_use]
    pub fn from_column_order(order: &[&str]) -> Self {
        Self::from_row(order.iter().map(|s| (*s).to_owned()).collect())
    }

    /// Synthesize `column0..columnN-1` for headerless inputs.
    #[must_use]
    pub fn synthetic(count: usize) -> Self {
        Self::from_row((0..count).map(|i| format!("column{i}")).collect())
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column names in source order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index of a column by exact name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Name of the column at `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&str> {
        self.names.get(i).map(String::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_lookup() {
        let map = HeaderMap::from_row(vec!["name".to_owned(), "age".to_owned()]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.index_of("age"), Some(1));
        assert_eq!(map.index_of("missing"), None);
        assert_eq!(map.get(0), Some("name"));
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let map = HeaderMap::from_row(vec!["x".to_owned(), "x".to_owned(), "y".to_owned()]);
        assert_eq!(map.index_of("x"), Some(0));
        assert_eq!(map.index_of("y"), Some(2));
    }

    #[test]
    fn test_synthetic_names() {
        let map = HeaderMap::synthetic(3);
        assert_eq!(map.names(), &["column0", "column1", "column2"]);
        assert_eq!(map.index_of("column2"), Some(2));
    }
}
