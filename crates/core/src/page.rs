//! The grid surfaces present on the current page and their rows.
//!
//! A grid that was never added here does not exist as far as the registry
//! and controller are concerned; registration against it is skipped.

use crate::grid::{GridDescriptor, GridId};
use crate::row::{Row, RowId};

/// Body of one grid: rows in display order (head first).
#[derive(Debug, Clone)]
pub struct GridTable {
    id: GridId,
    rows: Vec<Row>,
}

impl GridTable {
    pub fn id(&self) -> &GridId {
        &self.id
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Page {
    tables: Vec<GridTable>,
    next_row: u64,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty grid surface. Adding an existing id is a no-op.
    pub fn add_grid(&mut self, id: GridId) {
        if !self.has_grid(&id) {
            self.tables.push(GridTable { id, rows: Vec::new() });
        }
    }

    pub fn has_grid(&self, id: &GridId) -> bool {
        self.tables.iter().any(|t| &t.id == id)
    }

    pub fn table(&self, id: &GridId) -> Option<&GridTable> {
        self.tables.iter().find(|t| &t.id == id)
    }

    pub fn tables(&self) -> &[GridTable] {
        &self.tables
    }

    /// Append a rendered row at the bottom of a grid.
    pub fn push_row(&mut self, grid: &GridId, cells: Vec<String>) -> Option<RowId> {
        let id = self.allocate();
        let table = self.table_mut(grid)?;
        table.rows.push(Row::new(id, grid.clone(), cells));
        Some(id)
    }

    /// Insert an all-empty new row at the head of a grid body.
    pub(crate) fn insert_blank_at_head(&mut self, grid: &GridId, column_count: usize) -> Option<RowId> {
        let id = self.allocate();
        let table = self.table_mut(grid)?;
        table.rows.insert(0, Row::blank(id, grid.clone(), column_count));
        Some(id)
    }

    pub(crate) fn remove_row(&mut self, id: RowId) -> Option<Row> {
        self.tables.iter_mut().find_map(|t| {
            let pos = t.rows.iter().position(|r| r.id() == id)?;
            Some(t.rows.remove(pos))
        })
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows().find(|r| r.id() == id)
    }

    pub(crate) fn row_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.tables
            .iter_mut()
            .flat_map(|t| t.rows.iter_mut())
            .find(|r| r.id() == id)
    }

    /// Every row across every grid.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.tables.iter().flat_map(|t| t.rows.iter())
    }

    /// Number of rows flagged selected across all grids. Never above one.
    pub fn selected_count(&self) -> usize {
        self.rows().filter(|r| r.is_selected()).count()
    }

    /// Replace a grid's body with records from a listing response.
    ///
    /// Objects are mapped by field name, arrays by position. `null` and
    /// missing fields become `""`. Returns the number of rows rendered, or
    /// `None` if the grid is not on the page.
    pub fn load_records(
        &mut self,
        descriptor: &GridDescriptor,
        records: &[serde_json::Value],
    ) -> Option<usize> {
        let grid = descriptor.id().clone();
        if !self.has_grid(&grid) {
            return None;
        }

        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|record| record_cells(descriptor, record))
            .collect();

        if let Some(table) = self.table_mut(&grid) {
            table.rows.clear();
        }
        for cells in rows {
            self.push_row(&grid, cells);
        }
        log::debug!("loaded {} records into grid {}", records.len(), grid);
        Some(records.len())
    }

    fn table_mut(&mut self, id: &GridId) -> Option<&mut GridTable> {
        self.tables.iter_mut().find(|t| &t.id == id)
    }

    fn allocate(&mut self) -> RowId {
        self.next_row += 1;
        RowId(self.next_row)
    }
}

fn record_cells(descriptor: &GridDescriptor, record: &serde_json::Value) -> Vec<String> {
    match record {
        serde_json::Value::Array(values) => (0..descriptor.column_count())
            .map(|i| values.get(i).map(cell_text).unwrap_or_default())
            .collect(),
        _ => descriptor
            .field_names()
            .iter()
            .map(|name| record.get(name).map(cell_text).unwrap_or_default())
            .collect(),
    }
}

/// Text shown for a JSON value in a cell.
pub fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
