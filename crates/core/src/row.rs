//! One record's on-screen representation.

use crate::grid::GridId;

/// Stable handle for a row on the page. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub(crate) u64);

impl RowId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A row in exactly one grid.
///
/// Cell values are plain strings; an unset cell is `""`, never a sentinel.
/// The flags are transient UI state driven by the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: RowId,
    grid: GridId,
    cells: Vec<String>,
    mutable: Vec<bool>,
    is_new: bool,
    is_editing: bool,
    is_selected: bool,
}

impl Row {
    pub(crate) fn new(id: RowId, grid: GridId, cells: Vec<String>) -> Self {
        let mutable = vec![false; cells.len()];
        Self {
            id,
            grid,
            cells,
            mutable,
            is_new: false,
            is_editing: false,
            is_selected: false,
        }
    }

    pub(crate) fn blank(id: RowId, grid: GridId, column_count: usize) -> Self {
        let mut row = Self::new(id, grid, vec![String::new(); column_count]);
        row.is_new = true;
        row
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn grid(&self) -> &GridId {
        &self.grid
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    /// True if the cell accepts input right now.
    pub fn is_mutable(&self, column: usize) -> bool {
        self.mutable.get(column).copied().unwrap_or(false)
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.is_selected = selected;
    }

    pub(crate) fn set_new(&mut self, is_new: bool) {
        self.is_new = is_new;
    }

    /// Open every cell except the locked ones.
    pub(crate) fn begin_editing(&mut self, is_locked: impl Fn(usize) -> bool) {
        self.is_editing = true;
        for (column, slot) in self.mutable.iter_mut().enumerate() {
            *slot = !is_locked(column);
        }
    }

    pub(crate) fn end_editing(&mut self) {
        self.is_editing = false;
        self.mutable.iter_mut().for_each(|m| *m = false);
    }

    pub(crate) fn write_cell(&mut self, column: usize, value: String) {
        if let Some(cell) = self.cells.get_mut(column) {
            *cell = value;
        }
    }

    /// Put back a snapshot. Missing trailing values become `""`.
    pub(crate) fn restore(&mut self, snapshot: &[String]) {
        for (column, cell) in self.cells.iter_mut().enumerate() {
            *cell = snapshot.get(column).cloned().unwrap_or_default();
        }
    }
}
