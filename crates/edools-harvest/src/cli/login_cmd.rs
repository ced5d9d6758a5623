//! `edools-harvest login <credentials-file>`: sign in and save cookies.

use super::output;
use crate::auth::{self, LoginStatus};
use crate::config::HarvestConfig;
use crate::session::SessionStore;
use anyhow::Result;
use std::path::Path;

/// Run the login command.
pub async fn run(config: &HarvestConfig, credentials: &Path, fresh: bool) -> Result<()> {
    let store = SessionStore::from_config(config);
    let status = auth::login(config, &store, credentials, fresh).await?;

    match status {
        LoginStatus::Reused { saved_at } => {
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "status": "reused",
                    "session_file": store.path().display().to_string(),
                    "saved_at": saved_at,
                }));
            }
            output::status(format!(
                "Session already saved at {} ({saved_at}); use --fresh to log in again.",
                store.path().display()
            ));
        }
        LoginStatus::LoggedIn { landed_on, stored } => {
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "status": "logged_in",
                    "session_file": store.path().display().to_string(),
                    "saved_at": stored.saved_at,
                    "cookies": stored.cookies.len(),
                    "redirected_to": landed_on.as_str(),
                }));
            }
            output::status(format!("Login succeeded; redirected to {landed_on}"));
            output::status(format!(
                "Saved {} cookie(s) to {}",
                stored.cookies.len(),
                store.path().display()
            ));
        }
    }

    Ok(())
}
