//! Interactive editing session.
//!
//! Reads one command per line and drives the row lifecycle through the
//! four bound controls, the way a page wires its Add/Edit/Save/Cancel
//! buttons. After every command the companion panel's pending lookup is
//! answered and queued notices are printed.
//!
//! Rows and columns are addressed 1-based.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use planilla_client::{BackendClient, ClientError};
use planilla_core::{
    Activation, Affordance, Control, ControlBinder, ControlHandle, ControlSurface,
    GridDescriptor, GridId, GridTable, LifecycleError, PhotoResolver, RecordStore, RowId,
    RowLifecycle, RowState,
};

const ADD: ControlHandle = ControlHandle(1);
const EDIT: ControlHandle = ControlHandle(2);
const SAVE: ControlHandle = ControlHandle(3);
const CANCEL: ControlHandle = ControlHandle(4);

pub const HELP: &str = "\
Commands:
  grids                      list grids and row counts
  show [GRID]                print a grid (default: active grid)
  pick GRID ROW              select a row
  dpick GRID ROW             select a row and start editing it
  add [GRID]                 insert a blank row and start editing it
  edit                       start editing the selected row
  set COL VALUE...           type VALUE into column COL of the edited row
  save                       save the edited row
  cancel                     discard the edit (or clear the selection)
  panel                      show the companion photo panel
  upload FILE                upload FILE as the active row's photo
  rmphoto                    remove the active row's photo
  help                       this text
  quit                       leave the session";

/// Photo file operations the session can trigger.
pub trait PhotoFiles {
    fn upload_photo(&self, identifier: &str, file: &Path) -> Result<String, ClientError>;
    fn remove_photo(&self, identifier: &str) -> Result<(), ClientError>;
}

impl PhotoFiles for BackendClient {
    fn upload_photo(&self, identifier: &str, file: &Path) -> Result<String, ClientError> {
        BackendClient::upload_photo(self, identifier, file)
    }

    fn remove_photo(&self, identifier: &str) -> Result<(), ClientError> {
        BackendClient::remove_photo(self, identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Grids,
    Show(Option<String>),
    Pick { grid: String, row: usize },
    DoublePick { grid: String, row: usize },
    Add(Option<String>),
    Edit,
    Set { column: usize, value: String },
    Save,
    Cancel,
    Panel,
    Upload(PathBuf),
    RemovePhoto,
    Help,
    Quit,
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();
    let first_arg = args.first().map(|s| s.to_string());

    let command = match word {
        "grids" => Command::Grids,
        "show" => Command::Show(first_arg),
        "pick" | "dpick" => {
            let [grid, row] = args.as_slice() else {
                return Err(format!("usage: {} GRID ROW", word));
            };
            let row = parse_position(row, "row")?;
            let grid = grid.to_string();
            if word == "pick" {
                Command::Pick { grid, row }
            } else {
                Command::DoublePick { grid, row }
            }
        }
        "add" => Command::Add(first_arg),
        "edit" => Command::Edit,
        "set" => {
            let (column, value) = match rest.split_once(char::is_whitespace) {
                Some((column, value)) => (column, value.trim_start()),
                None if !rest.is_empty() => (rest, ""),
                None => return Err("usage: set COL VALUE...".into()),
            };
            Command::Set { column: parse_position(column, "column")?, value: value.to_string() }
        }
        "save" => Command::Save,
        "cancel" => Command::Cancel,
        "panel" => Command::Panel,
        "upload" => match rest {
            "" => return Err("usage: upload FILE".into()),
            file => Command::Upload(PathBuf::from(file)),
        },
        "rmphoto" => Command::RemovePhoto,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(command))
}

fn parse_position(text: &str, what: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{} must be a number starting at 1, got '{}'", what, text)),
    }
}

pub struct EditSession<'a> {
    lifecycle: RowLifecycle,
    binder: ControlBinder,
    store: &'a dyn RecordStore,
    photos: &'a dyn PhotoResolver,
    files: &'a dyn PhotoFiles,
}

impl<'a> EditSession<'a> {
    pub fn new(
        lifecycle: RowLifecycle,
        store: &'a dyn RecordStore,
        photos: &'a dyn PhotoResolver,
        files: &'a dyn PhotoFiles,
    ) -> Self {
        let mut binder = ControlBinder::new();
        binder.bind_surface(&ControlSurface {
            add: Some(ADD),
            edit: Some(EDIT),
            save: Some(SAVE),
            cancel: Some(CANCEL),
        });
        Self { lifecycle, binder, store, photos, files }
    }

    pub fn lifecycle(&self) -> &RowLifecycle {
        &self.lifecycle
    }

    /// Read commands until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, out: &mut dyn Write) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            match parse_command(&line) {
                Ok(None) => {}
                Ok(Some(command)) => {
                    if !self.execute(command, out)? {
                        break;
                    }
                }
                Err(msg) => writeln!(out, "error: {}", msg)?,
            }
        }
        Ok(())
    }

    /// Run one command. Returns false when the session should end.
    pub fn execute(&mut self, command: Command, out: &mut dyn Write) -> io::Result<bool> {
        let outcome = match command {
            Command::Quit => return Ok(false),
            Command::Help => {
                writeln!(out, "{}", HELP)?;
                return Ok(true);
            }
            Command::Grids => {
                self.write_grids(out)?;
                return Ok(true);
            }
            Command::Show(grid) => {
                self.write_grid(grid.as_deref(), out)?;
                return Ok(true);
            }
            Command::Panel => {
                self.write_status(out)?;
                return Ok(true);
            }
            Command::Pick { grid, row } => match self.row_at(&grid, row) {
                Some(id) => self.lifecycle.pick(id),
                None => return no_such_row(&grid, row, out),
            },
            Command::DoublePick { grid, row } => match self.row_at(&grid, row) {
                Some(id) => self.lifecycle.double_pick(id),
                None => return no_such_row(&grid, row, out),
            },
            Command::Add(Some(grid)) => {
                if self.binder.is_enabled(ADD, &self.lifecycle) {
                    self.lifecycle.add_to(&GridId::new(grid))
                } else {
                    self.disabled(Control::Add, out)?
                }
            }
            Command::Add(None) => self.activate(ADD, out)?,
            Command::Edit => self.activate(EDIT, out)?,
            Command::Save => self.activate(SAVE, out)?,
            Command::Cancel => self.activate(CANCEL, out)?,
            Command::Set { column, value } => self
                .lifecycle
                .set_cell(column - 1, value)
                .map(|()| self.lifecycle.state()),
            Command::Upload(file) => {
                self.upload(&file, out)?;
                Ok(self.lifecycle.state())
            }
            Command::RemovePhoto => {
                self.remove_photo(out)?;
                Ok(self.lifecycle.state())
            }
        };

        self.lifecycle.resolve_photo(self.photos);
        self.report(outcome, out)?;
        Ok(true)
    }

    // ── Controls ────────────────────────────────────────────────────

    fn activate(
        &mut self,
        handle: ControlHandle,
        out: &mut dyn Write,
    ) -> io::Result<Result<RowState, LifecycleError>> {
        match self.binder.activate(handle, &mut self.lifecycle, self.store) {
            Activation::Dispatched { outcome, .. } => Ok(outcome),
            Activation::Disabled(control) => self.disabled(control, out),
            Activation::Unbound => Ok(Ok(self.lifecycle.state())),
        }
    }

    fn disabled(
        &self,
        control: Control,
        out: &mut dyn Write,
    ) -> io::Result<Result<RowState, LifecycleError>> {
        writeln!(
            out,
            "{} is disabled while {}",
            control.label(),
            state_label(self.lifecycle.state())
        )?;
        Ok(Ok(self.lifecycle.state()))
    }

    fn row_at(&self, grid: &str, position: usize) -> Option<RowId> {
        let table = self.lifecycle.page().table(&GridId::from(grid))?;
        table.rows().get(position.checked_sub(1)?).map(|row| row.id())
    }

    // ── Photos ──────────────────────────────────────────────────────

    fn upload(&mut self, file: &Path, out: &mut dyn Write) -> io::Result<()> {
        let Some(identifier) = self.lifecycle.panel().identifier().map(String::from) else {
            return writeln!(out, "[warning] Select a row first");
        };
        match self.files.upload_photo(&identifier, file) {
            Ok(_) => {
                self.lifecycle.photo_uploaded(&identifier);
                writeln!(out, "[success] Photo uploaded")
            }
            Err(e) => writeln!(out, "[danger] Error uploading photo: {}", e),
        }
    }

    fn remove_photo(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let Some(identifier) = self.lifecycle.panel().identifier().map(String::from) else {
            return writeln!(out, "[warning] Select a row first");
        };
        match self.files.remove_photo(&identifier) {
            Ok(()) => {
                self.lifecycle.photo_removed(&identifier);
                writeln!(out, "[success] Photo removed")
            }
            Err(e) => writeln!(out, "[danger] Error removing photo: {}", e),
        }
    }

    // ── Output ──────────────────────────────────────────────────────

    /// Print queued notices, then the error if no notice covered it.
    fn report(
        &mut self,
        outcome: Result<RowState, LifecycleError>,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let notices = self.lifecycle.drain_notices();
        for notice in &notices {
            writeln!(out, "[{}] {}", notice.level.label(), notice.text)?;
        }
        if let Err(e) = outcome {
            if notices.is_empty() {
                writeln!(out, "error: {}", e)?;
            }
        }
        self.write_status(out)
    }

    fn write_status(&self, out: &mut dyn Write) -> io::Result<()> {
        let panel = self.lifecycle.panel();
        let grid = self
            .lifecycle
            .active_descriptor()
            .map(|d| d.id().to_string())
            .unwrap_or_else(|| "-".to_string());
        let photo = match panel.affordance() {
            Affordance::Hidden => String::new(),
            Affordance::Upload => format!(" photo: {} (upload)", panel.image_src(now_millis())),
            Affordance::Remove => format!(" photo: {} (remove)", panel.image_src(now_millis())),
        };
        writeln!(out, "state: {} grid: {}{}", state_label(self.lifecycle.state()), grid, photo)
    }

    fn write_grids(&self, out: &mut dyn Write) -> io::Result<()> {
        for descriptor in self.lifecycle.registry().iter() {
            let rows = self
                .lifecycle
                .page()
                .table(descriptor.id())
                .map(|t| t.len())
                .unwrap_or(0);
            writeln!(
                out,
                "{:<18} {:>4} rows  {:>2} columns  -> {}",
                descriptor.id().as_str(),
                rows,
                descriptor.column_count(),
                descriptor.endpoint()
            )?;
        }
        Ok(())
    }

    fn write_grid(&self, grid: Option<&str>, out: &mut dyn Write) -> io::Result<()> {
        let descriptor = match grid {
            Some(id) => self.lifecycle.registry().lookup(&GridId::from(id)),
            None => self
                .lifecycle
                .active_descriptor()
                .or_else(|| self.lifecycle.registry().iter().next()),
        };
        let Some(descriptor) = descriptor else {
            return writeln!(out, "error: no such grid");
        };
        match self.lifecycle.page().table(descriptor.id()) {
            Some(table) => write_table(descriptor, table, out),
            None => writeln!(out, "error: grid {} is not on the page", descriptor.id()),
        }
    }
}

/// Print a grid: a header of field names, then one line per row.
/// Markers: `>` selected, `*` editing, `+` not yet saved.
pub fn write_table(descriptor: &GridDescriptor, table: &GridTable, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{} ({} rows)", descriptor.id(), table.len())?;
    writeln!(out, "       {}", descriptor.field_names().join(" | "))?;
    for (i, row) in table.rows().iter().enumerate() {
        let selected = if row.is_selected() { '>' } else { ' ' };
        let editing = if row.is_editing() { '*' } else { ' ' };
        let new = if row.is_new() { '+' } else { ' ' };
        writeln!(out, "{}{}{}{:>3}  {}", selected, editing, new, i + 1, row.cells().join(" | "))?;
    }
    Ok(())
}

fn no_such_row(grid: &str, row: usize, out: &mut dyn Write) -> io::Result<bool> {
    writeln!(out, "error: no row {} in {}", row, grid)?;
    Ok(true)
}

fn state_label(state: RowState) -> &'static str {
    match state {
        RowState::Idle => "idle",
        RowState::Selected => "selected",
        RowState::EditingNew => "editing-new",
        RowState::EditingExisting => "editing",
        RowState::Saving => "saving",
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
