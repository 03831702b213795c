//! Photo upload and removal.
//!
//! Both are multipart POSTs carrying the `dpi` field; the backend answers
//! with a redirect that reqwest follows.

use std::path::Path;

use reqwest::blocking::multipart::{Form, Part};

use crate::client::{BackendClient, ClientError};

/// File extensions the backend stores.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// True if `path` has one of [`ALLOWED_EXTENSIONS`] (case-insensitive).
pub fn is_allowed_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
}

impl BackendClient {
    /// Upload `file` as the photo for `identifier`. Returns the URL the
    /// backend redirected to.
    pub fn upload_photo(&self, identifier: &str, file: &Path) -> Result<String, ClientError> {
        let identifier = required_identifier(identifier)?;
        if !is_allowed_photo(file) {
            return Err(ClientError::Rejected(format!(
                "Unsupported photo type: {} (allowed: {})",
                file.display(),
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let data = std::fs::read(file).map_err(|e| ClientError::Io(e.to_string()))?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "foto".to_string());
        let form = Form::new()
            .text("dpi", identifier.to_string())
            .part("foto", Part::bytes(data).file_name(file_name));

        let url = self.url(&self.config.upload_path);
        log::debug!("POST {} (photo for {})", url, identifier);
        let response = self.send_form(&url, form)?;
        log::info!("uploaded photo for {}", identifier);
        Ok(response.url().to_string())
    }

    /// Delete the stored photo for `identifier`.
    pub fn remove_photo(&self, identifier: &str) -> Result<(), ClientError> {
        let identifier = required_identifier(identifier)?;
        let form = Form::new().text("dpi", identifier.to_string());

        let url = self.url(&self.config.remove_path);
        log::debug!("POST {} (remove photo for {})", url, identifier);
        self.send_form(&url, form)?;
        log::info!("removed photo for {}", identifier);
        Ok(())
    }

    fn send_form(&self, url: &str, form: Form) -> Result<reqwest::blocking::Response, ClientError> {
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Http(status, body));
        }
        Ok(response)
    }
}

fn required_identifier(identifier: &str) -> Result<&str, ClientError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(ClientError::Rejected("Select a row first".into()));
    }
    Ok(identifier)
}
