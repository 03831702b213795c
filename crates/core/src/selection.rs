//! The single active row across all grids.
//!
//! All changes to the active-row reference go through `select` / `clear`,
//! so at most one row on the page carries the selected flag.

use crate::error::LifecycleError;
use crate::grid::GridId;
use crate::page::Page;
use crate::row::RowId;

/// The active row and the grid that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRow {
    pub row: RowId,
    pub grid: GridId,
}

/// What a `select` or `clear` changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub previous: Option<ActiveRow>,
    pub current: Option<ActiveRow>,
}

impl SelectionChange {
    /// True if the active row moved to a different grid.
    pub fn crossed_grids(&self) -> bool {
        match (&self.previous, &self.current) {
            (Some(prev), Some(cur)) => prev.grid != cur.grid,
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    active: Option<ActiveRow>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveRow> {
        self.active.as_ref()
    }

    pub fn active_grid(&self) -> Option<&GridId> {
        self.active.as_ref().map(|a| &a.grid)
    }

    pub fn is_active(&self, row: RowId) -> bool {
        self.active.as_ref().is_some_and(|a| a.row == row)
    }

    /// Make `row` the active row.
    ///
    /// The previous row loses its selected flag before the new one gains it.
    pub fn select(&mut self, page: &mut Page, row: RowId) -> Result<SelectionChange, LifecycleError> {
        let grid = page
            .row(row)
            .map(|r| r.grid().clone())
            .ok_or(LifecycleError::UnknownRow(row))?;

        let previous = self.active.take();
        if let Some(prev) = &previous {
            if let Some(prev_row) = page.row_mut(prev.row) {
                prev_row.set_selected(false);
            }
        }

        if let Some(next) = page.row_mut(row) {
            next.set_selected(true);
        }
        let current = ActiveRow { row, grid };
        log::debug!("selected row {} in grid {}", current.row, current.grid);
        self.active = Some(current.clone());

        Ok(SelectionChange { previous, current: Some(current) })
    }

    /// Drop the active-row reference. Cell contents are left untouched.
    ///
    /// The row may already have been removed from the page (cancelled add).
    pub fn clear(&mut self, page: &mut Page) -> SelectionChange {
        let previous = self.active.take();
        if let Some(prev) = &previous {
            if let Some(prev_row) = page.row_mut(prev.row) {
                prev_row.set_selected(false);
            }
        }
        SelectionChange { previous, current: None }
    }
}
