//! Personnel backend client, shared by the CLI and the lifecycle seams.
//!
//! This crate is the single source of truth for the backend wire contract:
//! row persistence, listings, single records, photo lookup, photo
//! upload/removal and login.
//!
//! No UI concepts. No retries.

mod client;
mod photo;
mod session;

pub use client::{BackendClient, ClientError};
pub use photo::{is_allowed_photo, ALLOWED_EXTENSIONS};
