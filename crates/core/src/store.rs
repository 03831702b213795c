//! Seams to the backend. The HTTP client implements these; tests use
//! in-memory fakes.

use crate::error::{LookupFailure, PersistenceError};
use crate::payload::Payload;

/// Successful persistence response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReceipt {
    /// Human-readable message from the response body, if any.
    pub message: Option<String>,
}

/// Persists one serialized row.
pub trait RecordStore {
    fn persist(&self, endpoint: &str, payload: &Payload) -> Result<SaveReceipt, PersistenceError>;
}

/// Outcome of a photo lookup that got an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoLookup {
    /// A displayable location for the photo.
    Found { location: String },
    /// The backend has no photo for this identifier.
    Missing,
}

impl PhotoLookup {
    /// Interpret a photo-resolution response body.
    ///
    /// `{url}` wins; `{foto: filename}` resolves under `static_base`;
    /// anything else (including `{}` and empty strings) is `Missing`.
    pub fn from_response(body: &serde_json::Value, static_base: &str) -> Self {
        let non_empty = |key: &str| {
            body.get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        if let Some(url) = non_empty("url") {
            return PhotoLookup::Found { location: url.to_string() };
        }
        if let Some(foto) = non_empty("foto") {
            return PhotoLookup::Found {
                location: format!("{}{}", static_base, foto),
            };
        }
        PhotoLookup::Missing
    }
}

/// Resolves the photo for an identifying value.
pub trait PhotoResolver {
    fn resolve(&self, identifier: &str) -> Result<PhotoLookup, LookupFailure>;
}
