//! Configuration loading and resolution.
//!
//! Values come from built-in defaults, then `EDOOLS_*` environment
//! variables, then command-line flags (applied by the binary).

use crate::error::{HarvestError, HarvestResult};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://faculdade-impacta.myedools.com";
pub const DEFAULT_SIGN_IN_PATH: &str = "/users/sign_in";
pub const DEFAULT_ORGANIZATION_ID: &str = "6352";
pub const DEFAULT_SESSION_FILE: &str = "session_cookies.json";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_RENDER_TIMEOUT_MS: u64 = 15_000;

/// Maximum redirects followed when fetching a course page.
pub const MAX_REDIRECT_HOPS: usize = 8;

/// Edools serves every school from a subdomain of this host.
const EDOOLS_HOST_SUFFIX: &str = "myedools.com";

/// Fixed desktop Firefox user-agent sent on every request.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0";

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Root of the school, e.g. `https://faculdade-impacta.myedools.com`.
    pub base_url: Url,
    /// Path of the sign-in form; also used to detect expired sessions.
    pub sign_in_path: String,
    /// Organization id posted with the login form.
    pub organization_id: String,
    /// Explicit cookie domain for browser injection.
    pub cookie_domain: Option<String>,
    /// Where the session store lives.
    pub session_file: PathBuf,
    pub user_agent: String,
    pub request_timeout_ms: u64,
    pub render_timeout_ms: u64,
    /// Whether the headless browser may be used when static HTML has no lessons.
    pub browser_fallback: bool,
    /// Explicit Chromium executable.
    pub chromium_path: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            organization_id: DEFAULT_ORGANIZATION_ID.to_string(),
            cookie_domain: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            user_agent: USER_AGENT.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            render_timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
            browser_fallback: true,
            chromium_path: None,
        }
    }
}

impl HarvestConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> HarvestResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> HarvestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = get("EDOOLS_BASE_URL") {
            config.set_base_url(&base)?;
        }
        if let Some(org) = get("EDOOLS_ORGANIZATION_ID") {
            config.organization_id = org;
        }
        if let Some(domain) = get("EDOOLS_COOKIE_DOMAIN") {
            config.cookie_domain = Some(domain);
        }
        if let Some(path) = get("EDOOLS_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        if let Some(flag) = get("EDOOLS_NO_BROWSER") {
            config.browser_fallback = !is_truthy(&flag);
        }
        if let Some(ms) = get("EDOOLS_RENDER_TIMEOUT_MS") {
            config.render_timeout_ms = ms.trim().parse().map_err(|_| {
                HarvestError::InvalidConfig(format!(
                    "EDOOLS_RENDER_TIMEOUT_MS must be a number of milliseconds, got '{ms}'"
                ))
            })?;
        }
        if let Some(path) = get("EDOOLS_CHROMIUM_PATH") {
            config.chromium_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Replace the base URL, validating it.
    pub fn set_base_url(&mut self, raw: &str) -> HarvestResult<()> {
        self.base_url = parse_http_url(raw)?;
        Ok(())
    }

    /// Absolute URL of the sign-in form.
    pub fn sign_in_url(&self) -> HarvestResult<Url> {
        self.base_url
            .join(&self.sign_in_path)
            .map_err(|e| HarvestError::InvalidUrl {
                url: self.sign_in_path.clone(),
                reason: e.to_string(),
            })
    }

    /// Whether `url` points at the sign-in form.
    pub fn is_sign_in(&self, url: &Url) -> bool {
        let wanted = self.sign_in_path.trim_end_matches('/');
        url.path().trim_end_matches('/').ends_with(wanted)
    }

    /// Cookie domain used when injecting the session into a browser.
    ///
    /// An explicit setting wins; Edools subdomains share `.myedools.com`;
    /// anything else uses the base URL host.
    pub fn effective_cookie_domain(&self) -> String {
        if let Some(domain) = &self.cookie_domain {
            return domain.clone();
        }
        let host = self.base_url.host_str().unwrap_or_default();
        if host == EDOOLS_HOST_SUFFIX || host.ends_with(&format!(".{EDOOLS_HOST_SUFFIX}")) {
            format!(".{EDOOLS_HOST_SUFFIX}")
        } else {
            host.to_string()
        }
    }
}

/// Parse an absolute `http`/`https` URL.
pub fn parse_http_url(raw: &str) -> HarvestResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| HarvestError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(HarvestError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}
