//! Table types.

use super::{Direction, Extensions, PositionHint};
use serde::{Deserialize, Serialize};

/// A rectangular table of cell strings.
///
/// All rows have the same number of cells. [`Table::new`] pads irregular
/// input with empty cells; validation rejects a table that is not
/// rectangular.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows in order, each an ordered sequence of cell strings
    pub rows: Vec<Vec<String>>,

    /// Number of leading header rows
    #[serde(default)]
    pub header_rows: usize,

    /// Table caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionHint>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Table {
    /// Create a table, padding short rows to the widest row.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self {
            rows,
            header_rows: 0,
            caption: None,
            direction: Direction::Auto,
            position: None,
            extensions: Extensions::new(),
        }
    }

    /// Create a table from anything string-like.
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// Set the number of header rows.
    pub fn with_header_rows(mut self, count: usize) -> Self {
        self.header_rows = count.min(self.rows.len());
        self
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Set the direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check that every row has the same cell count.
    pub fn is_rectangular(&self) -> bool {
        let width = self.column_count();
        self.rows.iter().all(|row| row.len() == width)
    }

    /// Get the header rows.
    pub fn header(&self) -> &[Vec<String>] {
        &self.rows[..self.header_rows.min(self.rows.len())]
    }

    /// Get the body rows (non-header).
    pub fn body(&self) -> &[Vec<String>] {
        &self.rows[self.header_rows.min(self.rows.len())..]
    }

    /// Get plain text content of the table (tab-separated rows).
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_pads_ragged_rows() {
        let table = Table::from_rows(vec![vec!["a", "b", "c"], vec!["d"], vec![]]);
        assert!(table.is_rectangular());
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.rows[1], vec!["d", "", ""]);
        assert_eq!(table.rows[2], vec!["", "", ""]);
    }

    #[test]
    fn test_header_and_body() {
        let table =
            Table::from_rows(vec![vec!["Name", "Age"], vec!["Ali", "30"]]).with_header_rows(1);
        assert_eq!(table.header().len(), 1);
        assert_eq!(table.body().len(), 1);
        assert_eq!(table.plain_text(), "Name\tAge\nAli\t30");
    }

    #[test]
    fn test_header_rows_bounded() {
        let table = Table::from_rows(vec![vec!["x"]]).with_header_rows(5);
        assert_eq!(table.header_rows, 1);
        assert!(table.body().is_empty());
    }
}
