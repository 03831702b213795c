//! Row lifecycle controller.
//!
//! One controller serves every grid on the page; the active grid is whatever
//! grid owns the active row. States:
//!
//! ```text
//! Idle ──pick──▶ Selected ──Edit / double-pick──▶ EditingExisting
//!   │               │                                   │
//!   └──────Add──────┴──────────▶ EditingNew             │
//!                                   │                   │
//!                 Save ──▶ Saving ──┴─── success ──▶ Idle
//!                                   └─── failure ──▶ back to Editing*
//! Cancel: EditingNew removes the row, EditingExisting restores the
//! snapshot, Selected clears the selection. All end in Idle.
//! ```
//!
//! Policies: picking another row while editing is refused, Cancel while
//! saving is refused, double-pick goes straight to EditingExisting. A row
//! added to a grid with a locked identifier inherits the active row's
//! identifier.

use std::time::Instant;

use crate::error::{LifecycleError, PersistenceError};
use crate::grid::{GridDescriptor, GridId, GridRegistry};
use crate::notice::{Notice, NoticeLevel, Notices};
use crate::page::Page;
use crate::panel::CompanionPanel;
use crate::payload::{self, Payload};
use crate::row::{Row, RowId};
use crate::selection::SelectionTracker;
use crate::store::{PhotoResolver, RecordStore, SaveReceipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Idle,
    Selected,
    EditingNew,
    EditingExisting,
    Saving,
}

impl RowState {
    pub fn is_editing(self) -> bool {
        matches!(self, RowState::EditingNew | RowState::EditingExisting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    New,
    Existing,
}

/// Snapshot taken when a row becomes editable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub row: RowId,
    pub kind: EditKind,
    pub original_cells: Vec<String>,
}

/// Identifies one dispatched save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket(u64);

/// A save ready to be sent: `POST endpoint` with `payload` as JSON.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub ticket: SaveTicket,
    pub grid: GridId,
    pub endpoint: String,
    pub payload: Payload,
}

/// Everything the controller shares between grids, owned in one place.
#[derive(Debug, Default)]
pub struct GridContext {
    pub registry: GridRegistry,
    pub page: Page,
    pub selection: SelectionTracker,
}

#[derive(Debug)]
pub struct RowLifecycle {
    ctx: GridContext,
    session: Option<EditSession>,
    in_flight: Option<SaveTicket>,
    next_ticket: u64,
    panel: CompanionPanel,
    notices: Notices,
}

impl RowLifecycle {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self::with_context(GridContext::default(), placeholder)
    }

    pub fn with_context(ctx: GridContext, placeholder: impl Into<String>) -> Self {
        Self {
            ctx,
            session: None,
            in_flight: None,
            next_ticket: 0,
            panel: CompanionPanel::new(placeholder),
            notices: Notices::default(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn state(&self) -> RowState {
        if self.in_flight.is_some() {
            return RowState::Saving;
        }
        match &self.session {
            Some(s) if s.kind == EditKind::New => RowState::EditingNew,
            Some(_) => RowState::EditingExisting,
            None if self.ctx.selection.active().is_some() => RowState::Selected,
            None => RowState::Idle,
        }
    }

    pub fn context(&self) -> &GridContext {
        &self.ctx
    }

    pub fn page(&self) -> &Page {
        &self.ctx.page
    }

    pub fn registry(&self) -> &GridRegistry {
        &self.ctx.registry
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn active_row(&self) -> Option<&Row> {
        let active = self.ctx.selection.active()?;
        self.ctx.page.row(active.row)
    }

    pub fn active_descriptor(&self) -> Option<&GridDescriptor> {
        let active = self.ctx.selection.active()?;
        self.ctx.registry.lookup(&active.grid)
    }

    pub fn panel(&self) -> &CompanionPanel {
        &self.panel
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Dismiss notices that have outlived their time-to-live.
    pub fn expire_notices(&mut self, now: Instant) -> usize {
        self.notices.expire(now)
    }

    // ── Page setup ──────────────────────────────────────────────────

    /// Declare a grid surface as present on the page.
    pub fn add_grid(&mut self, id: GridId) {
        self.ctx.page.add_grid(id);
    }

    /// Best-effort registration; see [`GridRegistry::register`].
    pub fn register(&mut self, descriptor: GridDescriptor) -> bool {
        self.ctx.registry.register(descriptor, &self.ctx.page)
    }

    /// Render a listing into a registered grid, replacing its body.
    pub fn load_records(
        &mut self,
        grid: &GridId,
        records: &[serde_json::Value],
    ) -> Result<usize, LifecycleError> {
        if self.ctx.registry.lookup(grid).is_none() {
            return Err(LifecycleError::UnknownGrid(grid.clone()));
        }

        if self.ctx.selection.active_grid() == Some(grid) {
            if self.state() != RowState::Selected {
                return Err(LifecycleError::EditInProgress);
            }
            self.ctx.selection.clear(&mut self.ctx.page);
            self.sync_panel();
        }

        let descriptor = self
            .ctx
            .registry
            .lookup(grid)
            .ok_or_else(|| LifecycleError::UnknownGrid(grid.clone()))?;
        self.ctx
            .page
            .load_records(descriptor, records)
            .ok_or_else(|| LifecycleError::UnknownGrid(grid.clone()))
    }

    // ── Transitions ─────────────────────────────────────────────────

    /// Single pick: make `row` the active row without opening it.
    pub fn pick(&mut self, row: RowId) -> Result<RowState, LifecycleError> {
        match self.state() {
            RowState::Saving => return self.refuse(LifecycleError::SaveInFlight),
            state if state.is_editing() => {
                if self.ctx.selection.is_active(row) {
                    return Ok(state);
                }
                return self.refuse(LifecycleError::EditInProgress);
            }
            _ => {}
        }

        self.ctx.selection.select(&mut self.ctx.page, row)?;
        self.sync_panel();
        debug_assert!(self.ctx.page.selected_count() <= 1);
        Ok(self.state())
    }

    /// Double pick: select `row` and open it for editing in one step.
    pub fn double_pick(&mut self, row: RowId) -> Result<RowState, LifecycleError> {
        let state = self.pick(row)?;
        if state == RowState::Selected {
            return self.edit();
        }
        Ok(state)
    }

    /// Insert a blank row at the head of the active grid (or the first
    /// registered grid when nothing is active) and open it.
    ///
    /// When the target grid locks its identifier column, the new row is
    /// seeded with the active row's identifier; with no identifier to take,
    /// Add is refused.
    pub fn add(&mut self) -> Result<RowState, LifecycleError> {
        self.insert_new(None)
    }

    /// Insert a blank row at the head of a specific grid and open it.
    pub fn add_to(&mut self, grid: &GridId) -> Result<RowState, LifecycleError> {
        self.insert_new(Some(grid))
    }

    /// Open the active row for editing.
    pub fn edit(&mut self) -> Result<RowState, LifecycleError> {
        match self.state() {
            RowState::Saving => return self.refuse(LifecycleError::SaveInFlight),
            RowState::Idle => return self.refuse(LifecycleError::NoActiveRow),
            state if state.is_editing() => return self.refuse(LifecycleError::EditInProgress),
            _ => {}
        }

        let active = self
            .ctx
            .selection
            .active()
            .cloned()
            .ok_or(LifecycleError::NoActiveRow)?;
        let descriptor = self
            .ctx
            .registry
            .lookup(&active.grid)
            .ok_or_else(|| LifecycleError::UnknownGrid(active.grid.clone()))?;
        let row = self
            .ctx
            .page
            .row_mut(active.row)
            .ok_or(LifecycleError::UnknownRow(active.row))?;

        let original_cells = row.cells().to_vec();
        row.begin_editing(|c| descriptor.is_locked(c));
        self.session = Some(EditSession {
            row: active.row,
            kind: EditKind::Existing,
            original_cells,
        });
        log::debug!("editing row {} in grid {}", active.row, active.grid);
        Ok(self.state())
    }

    /// Type into a cell of the row being edited.
    pub fn set_cell(&mut self, column: usize, value: impl Into<String>) -> Result<(), LifecycleError> {
        if self.in_flight.is_some() {
            return Err(LifecycleError::SaveInFlight);
        }
        let row_id = self.session.as_ref().ok_or(LifecycleError::NotEditing)?.row;
        let row = self
            .ctx
            .page
            .row_mut(row_id)
            .ok_or(LifecycleError::UnknownRow(row_id))?;

        if column >= row.len() {
            return Err(LifecycleError::CellOutOfRange { column, column_count: row.len() });
        }
        if !row.is_mutable(column) {
            return Err(LifecycleError::CellLocked { column });
        }

        let value = value.into();
        let identifier_changed = self
            .ctx
            .registry
            .lookup(row.grid())
            .is_some_and(|d| d.identifier_column() == column)
            && row.cell(column).map(str::trim) != Some(value.trim());

        row.write_cell(column, value);
        if identifier_changed {
            self.sync_panel();
        }
        Ok(())
    }

    /// Abandon the current edit (or selection) and return to Idle.
    pub fn cancel(&mut self) -> Result<RowState, LifecycleError> {
        match self.state() {
            RowState::Saving => return self.refuse(LifecycleError::SaveInFlight),
            RowState::Idle => return Err(LifecycleError::NoActiveRow),
            _ => {}
        }

        if let Some(session) = self.session.take() {
            match session.kind {
                EditKind::New => {
                    self.ctx.page.remove_row(session.row);
                    log::debug!("discarded new row {}", session.row);
                }
                EditKind::Existing => {
                    if let Some(row) = self.ctx.page.row_mut(session.row) {
                        row.restore(&session.original_cells);
                        row.end_editing();
                    }
                    log::debug!("restored row {}", session.row);
                }
            }
        }

        self.ctx.selection.clear(&mut self.ctx.page);
        self.sync_panel();
        Ok(self.state())
    }

    /// Validate and serialize the row being edited, and mark the save as
    /// in flight. Nothing is sent; the caller performs the request and
    /// reports back through [`complete_save`](Self::complete_save).
    pub fn begin_save(&mut self) -> Result<SaveRequest, LifecycleError> {
        match self.state() {
            RowState::Saving => {
                log::debug!("save already in flight; ignoring");
                return Err(LifecycleError::SaveInFlight);
            }
            RowState::Idle | RowState::Selected => return Err(LifecycleError::NotEditing),
            _ => {}
        }

        let row_id = self.session.as_ref().ok_or(LifecycleError::NotEditing)?.row;
        let row = self.ctx.page.row(row_id).ok_or(LifecycleError::UnknownRow(row_id))?;
        let descriptor = self
            .ctx
            .registry
            .lookup_by_row(row)
            .ok_or_else(|| LifecycleError::UnknownGrid(row.grid().clone()))?;

        let payload = match payload::serialize(row, descriptor) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("save refused for row {}: {}", row_id, e);
                self.notices.push(NoticeLevel::Danger, e.to_string());
                return Err(LifecycleError::Validation(e));
            }
        };

        self.next_ticket += 1;
        let ticket = SaveTicket(self.next_ticket);
        let request = SaveRequest {
            ticket,
            grid: descriptor.id().clone(),
            endpoint: descriptor.endpoint().to_string(),
            payload,
        };
        self.in_flight = Some(ticket);
        log::debug!("dispatching save for row {} to {}", row_id, request.endpoint);
        Ok(request)
    }

    /// Resolve an in-flight save.
    ///
    /// Success closes the row and returns to Idle. Failure keeps the row
    /// editable so the operator can retry or cancel.
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<SaveReceipt, PersistenceError>,
    ) -> Result<RowState, LifecycleError> {
        if self.in_flight != Some(ticket) {
            return Err(LifecycleError::StaleSaveTicket);
        }
        self.in_flight = None;

        match result {
            Ok(receipt) => {
                if let Some(session) = self.session.take() {
                    if let Some(row) = self.ctx.page.row_mut(session.row) {
                        row.end_editing();
                        row.set_new(false);
                    }
                    log::info!("saved row {}", session.row);
                }
                self.ctx.selection.clear(&mut self.ctx.page);
                self.sync_panel();
                let message = receipt.message.unwrap_or_else(|| "Saved successfully".to_string());
                self.notices.push(NoticeLevel::Success, message);
                Ok(self.state())
            }
            Err(e) => {
                log::error!("save failed: {}", e);
                let err = LifecycleError::Persistence(e);
                self.notices.push(NoticeLevel::Danger, err.to_string());
                Err(err)
            }
        }
    }

    /// Run a complete save round trip against `store`.
    pub fn save(&mut self, store: &dyn RecordStore) -> Result<RowState, LifecycleError> {
        let request = self.begin_save()?;
        let result = store.persist(&request.endpoint, &request.payload);
        self.complete_save(request.ticket, result)
    }

    // ── Companion panel ─────────────────────────────────────────────

    /// Answer the panel's outstanding photo lookup, if any.
    pub fn resolve_photo(&mut self, resolver: &dyn PhotoResolver) {
        self.panel.resolve_pending(resolver);
    }

    /// A photo was uploaded for `identifier`; refresh if it is on display.
    pub fn photo_uploaded(&mut self, identifier: &str) {
        if self.panel.identifier() == Some(identifier.trim()) {
            self.panel.refresh();
        }
    }

    pub fn photo_removed(&mut self, identifier: &str) {
        self.panel.photo_removed(identifier);
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn insert_new(&mut self, target: Option<&GridId>) -> Result<RowState, LifecycleError> {
        match self.state() {
            RowState::Saving => return self.refuse(LifecycleError::SaveInFlight),
            state if state.is_editing() => return self.refuse(LifecycleError::EditInProgress),
            _ => {}
        }

        let grid = match target {
            Some(grid) => {
                if self.ctx.registry.lookup(grid).is_none() || !self.ctx.page.has_grid(grid) {
                    return Err(LifecycleError::UnknownGrid(grid.clone()));
                }
                grid.clone()
            }
            None => {
                let active = self
                    .ctx
                    .selection
                    .active_grid()
                    .filter(|g| self.ctx.registry.lookup(g).is_some())
                    .cloned();
                let fallback = || {
                    self.ctx
                        .registry
                        .primary(&self.ctx.page)
                        .map(|d| d.id().clone())
                };
                match active.or_else(fallback) {
                    Some(grid) => grid,
                    None => return self.refuse(LifecycleError::NoTargetGrid),
                }
            }
        };

        let seed = match self.identifier_seed(&grid) {
            Ok(seed) => seed,
            Err(err) => return self.refuse(err),
        };

        let descriptor = self
            .ctx
            .registry
            .lookup(&grid)
            .ok_or_else(|| LifecycleError::UnknownGrid(grid.clone()))?;
        let row_id = self
            .ctx
            .page
            .insert_blank_at_head(&grid, descriptor.column_count())
            .ok_or_else(|| LifecycleError::UnknownGrid(grid.clone()))?;

        self.ctx.selection.select(&mut self.ctx.page, row_id)?;
        let row = self
            .ctx
            .page
            .row_mut(row_id)
            .ok_or(LifecycleError::UnknownRow(row_id))?;
        if let Some(identifier) = seed {
            row.write_cell(descriptor.identifier_column(), identifier);
        }
        row.begin_editing(|c| descriptor.is_locked(c));
        let original_cells = row.cells().to_vec();
        self.session = Some(EditSession {
            row: row_id,
            kind: EditKind::New,
            original_cells,
        });
        self.sync_panel();
        log::debug!("added row {} to grid {}", row_id, grid);
        Ok(self.state())
    }

    /// The identifying value of the active row, trimmed; `""` if none.
    fn active_identifier(&self) -> String {
        self.active_row()
            .map(|row| {
                let column = self
                    .ctx
                    .registry
                    .lookup_by_row(row)
                    .map(|d| d.identifier_column())
                    .unwrap_or(0);
                row.cell(column).unwrap_or_default().trim().to_string()
            })
            .unwrap_or_default()
    }

    /// Identifier a new row in `grid` starts with. Only grids whose
    /// identifier column is locked take one, from the active row.
    fn identifier_seed(&self, grid: &GridId) -> Result<Option<String>, LifecycleError> {
        let descriptor = self
            .ctx
            .registry
            .lookup(grid)
            .ok_or_else(|| LifecycleError::UnknownGrid(grid.clone()))?;
        if !descriptor.is_locked(descriptor.identifier_column()) {
            return Ok(None);
        }
        let identifier = self.active_identifier();
        if identifier.is_empty() {
            return Err(LifecycleError::NoIdentifierSource {
                field: descriptor.identifier_field().to_string(),
            });
        }
        Ok(Some(identifier))
    }

    /// Point the companion panel at the active row's identifying value.
    fn sync_panel(&mut self) {
        let identifier = self.active_identifier();
        self.panel.sync(&identifier);
    }

    fn refuse<T>(&mut self, err: LifecycleError) -> Result<T, LifecycleError> {
        log::warn!("refused in state {:?}: {}", self.state(), err);
        self.notices.push(NoticeLevel::Warning, err.to_string());
        Err(err)
    }
}
