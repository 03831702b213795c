//! Form login. The session cookie lands in the client's cookie store.

use crate::client::{BackendClient, ClientError};

impl BackendClient {
    /// Log in with `usuario`/`password`. The backend redirects home on
    /// success and back to the login page on failure.
    pub fn login(&self, usuario: &str, password: &str) -> Result<(), ClientError> {
        let url = self.url(&self.config.login_path);
        log::debug!("POST {} (login as {})", url, usuario);
        let response = self
            .http
            .post(&url)
            .form(&[("usuario", usuario), ("password", password)])
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Http(status, body));
        }

        let login_path = self.config.login_path.trim_end_matches('/');
        if response.url().path().trim_end_matches('/') == login_path {
            log::warn!("login rejected for {}", usuario);
            return Err(ClientError::Rejected("Invalid username or password".into()));
        }

        log::info!("logged in as {}", usuario);
        Ok(())
    }
}
