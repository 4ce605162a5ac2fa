use chrono::NaiveDate;

use std::fmt::{self, Display};

/// A single decoded spreadsheet value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    /// Returns true for empty cells, and for text that is empty or only
    /// whitespace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Date(d) => write!(f, "{d}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Number(f64::from(n))
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Empty, Into::into)
    }
}

/// A sheet of cells: a header row naming the columns, then data rows.
///
/// Rows shorter than the header are treated as having [`Cell::Empty`] in the
/// missing positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given column headers.
    #[must_use]
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row of cells, in header order.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Builder-style variant of [`Self::push_row`], handy for literal tables.
    #[must_use]
    pub fn with_row<C: Into<Cell>>(mut self, row: impl IntoIterator<Item = C>) -> Self {
        self.push_row(row.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of the first column called `name`, if any.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterates over the rows, each as a slice of cells in header order.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Returns the cell at column position `idx` of `row`.
    #[must_use]
    pub fn cell(row: &[Cell], idx: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        row.get(idx).unwrap_or(&EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_index_fn_finds_first_matching_header() {
        let table = Table::new(["date", "code", "code"]);
        assert_eq!(table.column_index("code"), Some(1));
        assert_eq!(table.column_index("qty"), None);
    }

    #[test]
    fn cell_fn_pads_short_rows_with_empty() {
        let table = Table::new(["a", "b"]).with_row(["x"]);
        let row = table.rows().next().unwrap();
        assert_eq!(Table::cell(row, 0), &Cell::Text("x".into()));
        assert_eq!(Table::cell(row, 1), &Cell::Empty);
    }

    #[test]
    fn is_empty_fn_treats_blank_text_as_empty() {
        assert!(Cell::Empty.is_empty());
        assert!(Cell::from("").is_empty());
        assert!(Cell::from(" \t").is_empty());
        assert!(!Cell::from("x").is_empty());
        assert!(!Cell::Number(0.0).is_empty());
    }

    #[test]
    fn option_converts_to_empty_cell_when_none() {
        assert_eq!(Cell::from(None::<f64>), Cell::Empty);
        assert_eq!(Cell::from(Some(2.5)), Cell::Number(2.5));
    }
}
