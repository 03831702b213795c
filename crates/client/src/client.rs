//! Personnel backend HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). One cookie store is
//! shared by every request so a successful login carries over.

use std::time::Duration;

use planilla_config::FichaConfig;
use planilla_core::{
    Ficha, LookupFailure, Payload, PersistenceError, PhotoLookup, PhotoResolver, RecordStore,
    SaveReceipt,
};

/// Backend client (blocking).
#[derive(Clone)]
pub struct BackendClient {
    pub(crate) http: reqwest::blocking::Client,
    pub(crate) base_url: String,
    pub(crate) config: FichaConfig,
}

/// Error type for backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Network error
    Network(String),
    /// HTTP error with status code and body (or its `mensaje`)
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// File I/O error
    Io(String),
    /// Refused before or after the request (bad file type, bad login)
    Rejected(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Network(msg) => write!(f, "Network error: {}", msg),
            ClientError::Http(code, msg) if msg.is_empty() => write!(f, "HTTP {}", code),
            ClientError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ClientError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ClientError::Io(msg) => write!(f, "I/O error: {}", msg),
            ClientError::Rejected(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ClientError> for PersistenceError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Http(status, body) => PersistenceError::Http { status, body },
            ClientError::Network(msg) => PersistenceError::Network(msg),
            other => PersistenceError::Network(other.to_string()),
        }
    }
}

impl From<ClientError> for LookupFailure {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Http(status, _) => LookupFailure::Http(status),
            ClientError::Parse(msg) => LookupFailure::Parse(msg),
            ClientError::Network(msg) => LookupFailure::Network(msg),
            other => LookupFailure::Network(other.to_string()),
        }
    }
}

impl BackendClient {
    /// Create a client for the backend named in `config`.
    pub fn from_config(config: &FichaConfig) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("planilla/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config: config.clone(),
        })
    }

    /// Point the client at another server (tests, staging).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn config(&self) -> &FichaConfig {
        &self.config
    }

    /// Absolute URL for a backend path. Absolute inputs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    // ── Records ─────────────────────────────────────────────────────

    /// POST one serialized row. A `mensaje` in the response is returned in
    /// the receipt; on failure it replaces the raw body.
    pub fn persist(&self, endpoint: &str, payload: &Payload) -> Result<SaveReceipt, ClientError> {
        let url = self.url(endpoint);
        log::debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        if !(200..300).contains(&status) {
            let detail = mensaje(&body).unwrap_or(body);
            return Err(ClientError::Http(status, detail));
        }

        Ok(SaveReceipt { message: mensaje(&body) })
    }

    /// GET a listing. The body must be a JSON array of records.
    pub fn list_records(&self, endpoint: &str) -> Result<Vec<serde_json::Value>, ClientError> {
        let url = self.url(endpoint);
        let json = self.get_json(&url)?;
        match json {
            serde_json::Value::Array(records) => Ok(records),
            other => Err(ClientError::Parse(format!(
                "expected an array of records, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// GET one record by identifier. Accepts an object or an array whose
    /// first element is the record.
    pub fn fetch_record(&self, identifier: &str) -> Result<serde_json::Value, ClientError> {
        let url = self.url(&format!(
            "{}{}",
            self.config.api_empleado_base,
            urlencoding::encode(identifier.trim())
        ));
        match self.get_json(&url)? {
            serde_json::Value::Array(mut items) => {
                if items.is_empty() {
                    return Err(ClientError::Parse("empty record list".into()));
                }
                Ok(items.swap_remove(0))
            }
            record @ serde_json::Value::Object(_) => Ok(record),
            other => Err(ClientError::Parse(format!(
                "expected a record, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Fetch a record and resolve its card.
    pub fn fetch_ficha(&self, identifier: &str) -> Result<Ficha, ClientError> {
        self.fetch_record(identifier).map(|record| Ficha::from_value(&record))
    }

    // ── Photos ──────────────────────────────────────────────────────

    /// GET the photo location for an identifier.
    pub fn lookup_photo(&self, identifier: &str) -> Result<PhotoLookup, ClientError> {
        let url = self.url(&format!(
            "{}{}",
            self.config.api_foto_base,
            urlencoding::encode(identifier.trim())
        ));
        let json = self.get_json(&url)?;
        Ok(PhotoLookup::from_response(&json, &self.config.foto_static_base))
    }

    // ── HTTP helpers ────────────────────────────────────────────────

    fn get_json(&self, url: &str) -> Result<serde_json::Value, ClientError> {
        log::debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Http(status, body));
        }

        response.json().map_err(|e| ClientError::Parse(e.to_string()))
    }
}

impl RecordStore for BackendClient {
    fn persist(&self, endpoint: &str, payload: &Payload) -> Result<SaveReceipt, PersistenceError> {
        BackendClient::persist(self, endpoint, payload).map_err(PersistenceError::from)
    }
}

impl PhotoResolver for BackendClient {
    fn resolve(&self, identifier: &str) -> Result<PhotoLookup, LookupFailure> {
        self.lookup_photo(identifier).map_err(LookupFailure::from)
    }
}

// ── Free functions ──────────────────────────────────────────────────

/// The non-empty `mensaje` string of a JSON body, if any.
fn mensaje(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("mensaje")?
        .as_str()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
