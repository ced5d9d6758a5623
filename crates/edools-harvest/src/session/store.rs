//! JSON file persistence for the session cookie set.
//!
//! File layout:
//!
//! ```json
//! {
//!   "saved_at": "2026-10-19 14:03:07",
//!   "cookies": { "session_id": "abc123" }
//! }
//! ```
//!
//! The file is trusted as-is on load; expiry is only noticed when the
//! platform redirects a request to the sign-in page.

use super::Session;
use crate::config::HarvestConfig;
use crate::error::{HarvestError, HarvestResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk shape of the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub saved_at: String,
    pub cookies: BTreeMap<String, String>,
}

/// A single session slot backed by one JSON file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store configured for this invocation.
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self::new(config.session_file.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Persist the session's cookies with the current timestamp.
    ///
    /// Writes a sibling temp file first and renames it over the target.
    pub fn save(&self, session: &Session) -> HarvestResult<StoredSession> {
        let stored = StoredSession {
            saved_at: crate::timestamp::now(),
            cookies: session.cookies().clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::info!(
            path = %self.path.display(),
            cookies = stored.cookies.len(),
            "session saved"
        );
        Ok(stored)
    }

    /// Read the raw stored form.
    pub fn read(&self) -> HarvestResult<StoredSession> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HarvestError::SessionMissing(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&data).map_err(|e| HarvestError::SessionUnreadable {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Rebuild a [`Session`] for the configured platform.
    pub fn load(&self, config: &HarvestConfig) -> HarvestResult<Session> {
        let stored = self.read()?;
        tracing::debug!(
            path = %self.path.display(),
            saved_at = %stored.saved_at,
            cookies = stored.cookies.len(),
            "session loaded"
        );
        Ok(Session::with_cookies(
            config.base_url.clone(),
            config.user_agent.clone(),
            stored.cookies,
        )
        .with_cookie_domain(config.effective_cookie_domain()))
    }
}
