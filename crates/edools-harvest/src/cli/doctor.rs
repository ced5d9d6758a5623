//! Environment readiness check.

use crate::config::HarvestConfig;
use crate::renderer::chromium::find_chromium;
use crate::session::SessionStore;
use anyhow::Result;

/// Report configuration, Chromium availability and the saved session.
pub async fn run(config: &HarvestConfig) -> Result<()> {
    let chromium = find_chromium(config.chromium_path.as_deref());
    let store = SessionStore::from_config(config);
    let session = store.exists().then(|| store.read());

    if super::output::is_json() {
        let session_json = match &session {
            None => serde_json::json!({ "present": false }),
            Some(Ok(stored)) => serde_json::json!({
                "present": true,
                "saved_at": stored.saved_at,
                "cookies": stored.cookies.len(),
            }),
            Some(Err(e)) => serde_json::json!({ "present": true, "error": e.to_string() }),
        };
        super::output::print_json(&serde_json::json!({
            "base_url": config.base_url.as_str(),
            "sign_in_url": config.sign_in_url()?.as_str(),
            "cookie_domain": config.effective_cookie_domain(),
            "browser_fallback": config.browser_fallback,
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "session_file": store.path().display().to_string(),
            "session": session_json,
        }));
        return Ok(());
    }

    println!("edools-harvest doctor");
    println!("=====================");
    println!();
    println!("Base URL:      {}", config.base_url);
    println!("Sign-in URL:   {}", config.sign_in_url()?);
    println!("Cookie domain: {}", config.effective_cookie_domain());
    println!();

    match &session {
        None => println!(
            "[!!] No session at {}. Run `edools-harvest login <credentials-file>`.",
            store.path().display()
        ),
        Some(Ok(stored)) => println!(
            "[OK] Session at {}: {} cookie(s), saved {}",
            store.path().display(),
            stored.cookies.len(),
            stored.saved_at
        ),
        Some(Err(e)) => println!("[!!] {e}. Run `edools-harvest login <credentials-file> --fresh`."),
    }

    if !config.browser_fallback {
        println!("[--] Browser fallback disabled (EDOOLS_NO_BROWSER)");
    } else {
        match &chromium {
            Some(path) => println!("[OK] Chromium found: {}", path.display()),
            None => println!(
                "[!!] Chromium NOT found. Install Chrome/Chromium or set EDOOLS_CHROMIUM_PATH."
            ),
        }
    }

    println!();
    let ready = matches!(session, Some(Ok(_)));
    println!("Status: {}", if ready { "READY" } else { "NOT READY" });

    Ok(())
}
