//! Login credentials read from a JSON file.
//!
//! ```json
//! { "email": "you@example.com", "password": "..." }
//! ```
//!
//! `senha` is accepted in place of `password`. Credentials are never
//! persisted and the password never appears in `Debug` output.

use crate::error::{HarvestError, HarvestResult};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Email and password for the sign-in form.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    #[serde(alias = "senha")]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Load and validate a credentials file.
    pub fn from_file(path: &Path) -> HarvestResult<Self> {
        let invalid = |reason: String| HarvestError::CredentialsFileInvalid {
            path: path.to_path_buf(),
            reason,
        };

        let data = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let creds: Credentials = serde_json::from_str(&data).map_err(|e| invalid(e.to_string()))?;

        if creds.email.trim().is_empty() {
            return Err(invalid("email is empty".into()));
        }
        if creds.password.is_empty() {
            return Err(invalid("password is empty".into()));
        }
        Ok(creds)
    }
}
