//! Error taxonomy for the row lifecycle.
//!
//! - `ValidationError` never reaches the network; the row stays editable.
//! - `PersistenceError` is surfaced as a transient notice; the row stays editable.
//! - `LookupFailure` degrades the companion panel to its placeholder and is
//!   never shown to the user.
//! - `LifecycleError` wraps every rejected controller request.

use crate::grid::GridId;
use crate::row::RowId;

/// Pre-network validation failure from the payload serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The identifying field is blank after trimming.
    MissingIdentifier { field: String },
    /// The row has fewer live cells than the grid declares.
    ColumnCountMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingIdentifier { field } => {
                write!(f, "The field {} is required", field)
            }
            ValidationError::ColumnCountMismatch { expected, actual } => write!(
                f,
                "The row does not have the right number of columns (expected {}, found {})",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure of the persistence round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Non-2xx response. `body` is the response text (or its `mensaje`).
    Http { status: u16, body: String },
    /// The request never produced a response.
    Network(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Http { status, body } if body.is_empty() => {
                write!(f, "HTTP {}", status)
            }
            PersistenceError::Http { status, body } => write!(f, "HTTP {} {}", status, body),
            PersistenceError::Network(msg) => write!(f, "Network error: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Photo resolution failure. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    Http(u16),
    Network(String),
    Parse(String),
}

impl std::fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupFailure::Http(status) => write!(f, "photo lookup returned HTTP {}", status),
            LookupFailure::Network(msg) => write!(f, "photo lookup failed: {}", msg),
            LookupFailure::Parse(msg) => write!(f, "photo lookup returned bad JSON: {}", msg),
        }
    }
}

impl std::error::Error for LookupFailure {}

/// A grid descriptor that cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    NoFields(GridId),
    LockedColumnOutOfRange { grid: GridId, column: usize, column_count: usize },
    IdentifierColumnOutOfRange { grid: GridId, column: usize, column_count: usize },
}

impl std::fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorError::NoFields(grid) => write!(f, "grid {} declares no fields", grid),
            DescriptorError::LockedColumnOutOfRange { grid, column, column_count } => write!(
                f,
                "grid {}: locked column {} is outside 0..{}",
                grid, column, column_count
            ),
            DescriptorError::IdentifierColumnOutOfRange { grid, column, column_count } => write!(
                f,
                "grid {}: identifier column {} is outside 0..{}",
                grid, column, column_count
            ),
        }
    }
}

impl std::error::Error for DescriptorError {}

/// A controller request that was refused or failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The request needs an active row and there is none
    NoActiveRow,
    /// Another row is being edited
    EditInProgress,
    /// The request needs an editable row
    NotEditing,
    /// A save is already in flight
    SaveInFlight,
    /// Add found no registered grid to insert into
    NoTargetGrid,
    /// The target grid locks its identifier and no active row supplies one
    NoIdentifierSource { field: String },
    UnknownRow(RowId),
    UnknownGrid(GridId),
    CellLocked { column: usize },
    CellOutOfRange { column: usize, column_count: usize },
    /// A save completion arrived for a request that is no longer in flight
    StaleSaveTicket,
    Validation(ValidationError),
    Persistence(PersistenceError),
}

impl std::fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleError::NoActiveRow => write!(f, "Select a row first"),
            LifecycleError::EditInProgress => {
                write!(f, "Finish or cancel the current edit first")
            }
            LifecycleError::NotEditing => write!(f, "The active row is not being edited"),
            LifecycleError::SaveInFlight => write!(f, "A save is already in progress"),
            LifecycleError::NoTargetGrid => write!(f, "No grid is available to add a row to"),
            LifecycleError::NoIdentifierSource { field } => {
                write!(f, "Select a row with a {} first", field)
            }
            LifecycleError::UnknownRow(row) => write!(f, "Unknown row {}", row),
            LifecycleError::UnknownGrid(grid) => write!(f, "Unknown grid {}", grid),
            LifecycleError::CellLocked { column } => write!(f, "Column {} is locked", column),
            LifecycleError::CellOutOfRange { column, column_count } => write!(
                f,
                "Column {} is outside the row (0..{})",
                column, column_count
            ),
            LifecycleError::StaleSaveTicket => write!(f, "No save is waiting for this response"),
            LifecycleError::Validation(e) => write!(f, "{}", e),
            LifecycleError::Persistence(e) => write!(f, "Error saving: {}", e),
        }
    }
}

impl std::error::Error for LifecycleError {}

impl From<ValidationError> for LifecycleError {
    fn from(e: ValidationError) -> Self {
        LifecycleError::Validation(e)
    }
}

impl From<PersistenceError> for LifecycleError {
    fn from(e: PersistenceError) -> Self {
        LifecycleError::Persistence(e)
    }
}
