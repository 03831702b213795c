//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 1       | Universal | General error (unspecified)              |
//! | 2       | Universal | CLI usage error (bad args, missing file) |
//! | 3-9     | config    | Configuration file and grid definitions  |
//! | 40-49   | backend   | Personnel backend requests               |
//! | 60-69   | edit      | Interactive editing session              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use planilla_client::ClientError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Config (3-9)
// =============================================================================

/// Config file unreadable or not valid JSON.
pub const EXIT_CONFIG: u8 = 3;

/// A grid definition is invalid (no fields, column out of range).
pub const EXIT_CONFIG_GRID: u8 = 4;

// =============================================================================
// Backend (40-49)
// =============================================================================

/// Network failure talking to the backend.
pub const EXIT_BACKEND_NETWORK: u8 = 40;

/// Backend answered with a non-success status.
pub const EXIT_BACKEND_HTTP: u8 = 41;

/// Backend answer was not the expected JSON shape.
pub const EXIT_BACKEND_PARSE: u8 = 42;

/// Refused: bad credentials, unsupported photo type, blank identifier.
pub const EXIT_BACKEND_REJECTED: u8 = 43;

/// Local file could not be read.
pub const EXIT_BACKEND_IO: u8 = 44;

// =============================================================================
// Edit session (60-69)
// =============================================================================

/// Input ended while a row was still being edited.
pub const EXIT_EDIT_UNSAVED: u8 = 60;

/// Map a ClientError to its exit code.
pub fn client_exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::Network(_) => EXIT_BACKEND_NETWORK,
        ClientError::Http(..) => EXIT_BACKEND_HTTP,
        ClientError::Parse(_) => EXIT_BACKEND_PARSE,
        ClientError::Rejected(_) => EXIT_BACKEND_REJECTED,
        ClientError::Io(_) => EXIT_BACKEND_IO,
    }
}
