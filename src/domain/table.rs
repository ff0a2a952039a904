//! Raw tabular input as delivered by a workbook reader.
//!
//! Cells are kept as optional text: an empty cell is `None`. Typed records are
//! only derived from these tables after validation has passed.

use std::collections::HashMap;

/// One named sheet: a header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            name: name.into(),
            columns,
            positions,
            rows: Vec::new(),
        }
    }

    /// Build a table from string literals; empty strings become empty cells.
    ///
    /// ```
    /// use valtree::domain::Table;
    /// let t = Table::from_strs("Sheet", &["A", "B"], &[&["1", ""]]);
    /// assert_eq!(t.len(), 1);
    /// ```
    pub fn from_strs(name: &str, columns: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new(name, columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(
                row.iter()
                    .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
                    .collect(),
            );
        }
        table
    }

    pub fn push_row(&mut self, cells: Vec<Option<String>>) {
        self.rows.push(cells);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Required columns absent from the header, sorted.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        let mut missing: Vec<String> = required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect();
        missing.sort();
        missing
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().enumerate().map(move |(index, cells)| Row {
            index,
            table: self,
            cells,
        })
    }
}

/// Borrowed view of a single data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    index: usize,
    table: &'a Table,
    cells: &'a [Option<String>],
}

impl<'a> Row<'a> {
    /// Row number as shown in a spreadsheet: 1-based, header on row 1.
    pub fn sheet_row(&self) -> usize {
        self.index + 2
    }

    /// Cell value for `column`; `None` if the column is absent or the cell is empty.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let pos = *self.table.positions.get(column)?;
        self.cells
            .get(pos)
            .and_then(|c| c.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// The set of sheets read from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    tables: Vec<Table>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.insert(table);
        self
    }

    /// Add a sheet, replacing any sheet of the same name.
    pub fn insert(&mut self, table: Table) {
        self.tables.retain(|t| t.name != table.name);
        self.tables.push(table);
    }

    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_empty_cell_when_reading_row_then_returns_none() {
        let table = Table::from_strs("S", &["A", "B"], &[&["x", ""]]);
        let row = table.rows().next().unwrap();
        assert_eq!(row.get("A"), Some("x"));
        assert_eq!(row.get("B"), None);
        assert_eq!(row.get("C"), None);
        assert_eq!(row.sheet_row(), 2);
    }

    #[test]
    fn given_short_row_when_reading_trailing_column_then_returns_none() {
        let mut table = Table::new("S", vec!["A".into(), "B".into()]);
        table.push_row(vec![Some("x".into())]);
        let row = table.rows().next().unwrap();
        assert_eq!(row.get("B"), None);
    }

    #[test]
    fn given_required_columns_when_some_missing_then_lists_them_sorted() {
        let table = Table::from_strs("S", &["B"], &[]);
        assert_eq!(table.missing_columns(&["Z", "B", "A"]), vec!["A", "Z"]);
    }

    #[test]
    fn given_duplicate_sheet_name_when_inserting_then_replaces() {
        let wb = Workbook::new()
            .with_table(Table::from_strs("S", &["A"], &[]))
            .with_table(Table::from_strs("S", &["B"], &[]));
        assert_eq!(wb.sheet_names(), vec!["S"]);
        assert!(wb.sheet("S").unwrap().has_column("B"));
    }
}
