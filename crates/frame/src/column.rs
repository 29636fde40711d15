//! Column storage and scalar cells

use serde::{Deserialize, Serialize};

/// A dynamically typed scalar value.
///
/// Cells appear in [`Column::Mixed`] columns and in label indexes, where
/// a single static type cannot be assumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Str(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Str(v)
    }
}

/// Typed column storage.
///
/// The homogeneous variants hold one native vector each; `Mixed` falls
/// back to per-cell tagging for columns that hold more than one scalar
/// type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    Utf8(Vec<String>),
    Mixed(Vec<Cell>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Utf8(v) => v.len(),
            Column::Mixed(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell at `row`, or `None` past the end of this column.
    pub fn cell(&self, row: usize) -> Option<Cell> {
        match self {
            Column::Int64(v) => v.get(row).map(|x| Cell::Int(*x)),
            Column::Float64(v) => v.get(row).map(|x| Cell::Float(*x)),
            Column::Bool(v) => v.get(row).map(|x| Cell::Bool(*x)),
            Column::Utf8(v) => v.get(row).map(|x| Cell::Str(x.clone())),
            Column::Mixed(v) => v.get(row).cloned(),
        }
    }

    /// Build a column from cells, collapsing to a homogeneous variant
    /// when every cell shares one type.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        if !cells.is_empty() && cells.iter().all(|c| matches!(c, Cell::Int(_))) {
            return Column::Int64(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Int(v) => v,
                        _ => unreachable!(),
                    })
                    .collect(),
            );
        }
        if !cells.is_empty() && cells.iter().all(|c| matches!(c, Cell::Float(_))) {
            return Column::Float64(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Float(v) => v,
                        _ => unreachable!(),
                    })
                    .collect(),
            );
        }
        if !cells.is_empty() && cells.iter().all(|c| matches!(c, Cell::Bool(_))) {
            return Column::Bool(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Bool(v) => v,
                        _ => unreachable!(),
                    })
                    .collect(),
            );
        }
        if !cells.is_empty() && cells.iter().all(|c| matches!(c, Cell::Str(_))) {
            return Column::Utf8(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Str(v) => v,
                        _ => unreachable!(),
                    })
                    .collect(),
            );
        }
        Column::Mixed(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_access_per_variant() {
        let col = Column::Utf8(vec!["a".into(), "b".into()]);
        assert_eq!(col.cell(1), Some(Cell::Str("b".into())));
        assert_eq!(col.cell(2), None);

        let col = Column::Mixed(vec![Cell::Null, Cell::Bool(true)]);
        assert_eq!(col.cell(0), Some(Cell::Null));
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn from_cells_collapses_homogeneous() {
        let col = Column::from_cells(vec![Cell::Int(1), Cell::Int(2)]);
        assert_eq!(col, Column::Int64(vec![1, 2]));

        let col = Column::from_cells(vec![Cell::Int(1), Cell::Str("x".into())]);
        assert!(matches!(col, Column::Mixed(_)));
    }

    #[test]
    fn from_cells_keeps_empty_mixed() {
        assert!(matches!(Column::from_cells(vec![]), Column::Mixed(_)));
    }
}
