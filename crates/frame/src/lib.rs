//! Column-oriented tabular value model for framestore
//!
//! This crate provides the value type cached by `framestore-cache`: an
//! ordered collection of named, typed columns plus an optional row index.
//! Columns in one frame may have different lengths (ragged frames are
//! legal), and a column may hold mixed scalar types.
//!
//! The model is deliberately small: construction, introspection, serde
//! support, and structural equality. Query and transformation belong to
//! the producers and consumers of cached frames, not here.

mod column;

pub use column::{Cell, Column};

use serde::{Deserialize, Serialize};

/// Row index of a frame.
///
/// `Range` is the default positional index (0, 1, 2, ...) and carries no
/// data of its own. `Labels` attaches an explicit label per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Index {
    Range,
    Labels(Vec<Cell>),
}

impl Default for Index {
    fn default() -> Self {
        Index::Range
    }
}

/// An ordered collection of named columns with an optional row index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<(String, Column)>,
    index: Index,
}

impl DataFrame {
    /// Create an empty frame with the default positional index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from `(name, column)` pairs.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, col)| (name.into(), col))
                .collect(),
            index: Index::Range,
        }
    }

    /// Append a column, keeping insertion order.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) {
        self.columns.push((name.into(), column));
    }

    /// Replace the row index.
    pub fn set_index(&mut self, index: Index) {
        self.index = index;
    }

    /// Builder-style variant of [`set_index`](Self::set_index).
    pub fn with_index(mut self, index: Index) -> Self {
        self.index = index;
        self
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Length of the longest column. Ragged frames report the maximum.
    pub fn num_rows(&self) -> usize {
        self.columns
            .iter()
            .map(|(_, col)| col.len())
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, col)| col)
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(name, column)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, col)| (name.as_str(), col))
    }

    /// True when any column stores mixed scalar types.
    pub fn has_mixed_columns(&self) -> bool {
        self.columns
            .iter()
            .any(|(_, col)| matches!(col, Column::Mixed(_)))
    }

    /// True when the frame carries an explicit label index.
    pub fn has_custom_index(&self) -> bool {
        !matches!(self.index, Index::Range)
    }
}

impl FromIterator<(String, Column)> for DataFrame {
    fn from_iter<I: IntoIterator<Item = (String, Column)>>(iter: I) -> Self {
        Self::from_columns(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::from_columns([
            ("one", Column::Int64(vec![1, 2, 3])),
            ("two", Column::Utf8(vec!["a".into(), "b".into(), "c".into()])),
        ])
    }

    #[test]
    fn column_lookup_and_order() {
        let frame = sample();
        assert_eq!(frame.num_columns(), 2);
        assert_eq!(frame.column("one"), Some(&Column::Int64(vec![1, 2, 3])));
        assert_eq!(frame.column("missing"), None);
        let names: Vec<_> = frame.column_names().collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn ragged_columns_report_longest() {
        let frame = DataFrame::from_columns([
            ("one", Column::Int64(vec![1, 2, 3])),
            ("pad", Column::Int64(vec![1, 2, 3, 4])),
        ]);
        assert_eq!(frame.num_rows(), 4);
    }

    #[test]
    fn mixed_and_index_detection() {
        let mut frame = sample();
        assert!(!frame.has_mixed_columns());
        assert!(!frame.has_custom_index());

        frame.push_column(
            "mixed",
            Column::Mixed(vec![Cell::Int(1), Cell::Str("x".into()), Cell::Null]),
        );
        frame.set_index(Index::Labels(vec![
            Cell::Str("r1".into()),
            Cell::Str("r2".into()),
            Cell::Str("r3".into()),
        ]));
        assert!(frame.has_mixed_columns());
        assert!(frame.has_custom_index());
    }

    #[test]
    fn structural_equality() {
        assert_eq!(sample(), sample());
        let mut other = sample();
        other.push_column("three", Column::Bool(vec![true]));
        assert_ne!(sample(), other);
    }

    #[test]
    fn serde_round_trip_preserves_frame() {
        let mut frame = sample();
        frame.set_index(Index::Labels(vec![Cell::Int(10), Cell::Int(20)]));
        let json = serde_json::to_string(&frame).unwrap();
        let back: DataFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame, back);

        let bytes = bincode::serialize(&frame).unwrap();
        let back: DataFrame = bincode::deserialize(&bytes).unwrap();
        assert_eq!(frame, back);
    }
}
