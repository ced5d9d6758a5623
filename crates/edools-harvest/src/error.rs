//! Error kinds for the login and scrape flows.
//!
//! Every failure is terminal for the current invocation. Each variant
//! carries enough context to tell the user what to do next, and maps to a
//! distinct process exit code.

use std::path::PathBuf;

/// Process exit codes, one per failure family.
pub mod exit_codes {
    pub const GENERIC: i32 = 1;
    /// Bad command line. Emitted by clap itself, never by a `HarvestError`.
    pub const USAGE: i32 = 2;
    pub const CREDENTIALS_INVALID: i32 = 3;
    pub const TOKEN_NOT_FOUND: i32 = 4;
    pub const AUTHENTICATION_REJECTED: i32 = 5;
    pub const SESSION_MISSING: i32 = 6;
    pub const SESSION_EXPIRED: i32 = 7;
    pub const NO_LESSONS_FOUND: i32 = 8;
    pub const RENDER_TIMEOUT: i32 = 9;
    pub const BROWSER_LAUNCH_FAILED: i32 = 10;
    pub const NETWORK: i32 = 11;
}

/// All errors that can occur while logging in or harvesting lessons.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("Credentials file {path} is invalid: {reason}")]
    CredentialsFileInvalid { path: PathBuf, reason: String },

    #[error("Anti-forgery token not found on {url} (page layout changed or a CAPTCHA was shown)")]
    TokenNotFound { url: String },

    #[error("Login rejected: {0}")]
    AuthenticationRejected(String),

    #[error("No saved session at {0}")]
    SessionMissing(PathBuf),

    #[error("Saved session at {path} is unreadable: {reason}")]
    SessionUnreadable { path: PathBuf, reason: String },

    #[error("Session expired: {url} redirected to the sign-in page")]
    SessionExpired { url: String },

    #[error("No lessons found on {url} ({})", passes_tried(.browser_tried))]
    NoLessonsFound { url: String, browser_tried: bool },

    #[error("Timed out after {timeout_ms}ms waiting for lessons to render on {url}")]
    RenderTimeout { url: String, timeout_ms: u64 },

    #[error("Could not launch the headless browser: {0}")]
    BrowserLaunchFailed(String),

    #[error("Headless browser failed while rendering: {0}")]
    RenderFailed(String),

    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Exceeded {max_hops} redirects starting at {url}")]
    TooManyRedirects { url: String, max_hops: usize },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn passes_tried(browser_tried: &bool) -> &'static str {
    if *browser_tried {
        "static HTML and rendered page"
    } else {
        "browser fallback disabled"
    }
}

/// Result alias for the library.
pub type HarvestResult<T> = Result<T, HarvestError>;

impl HarvestError {
    /// The process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use exit_codes::*;
        match self {
            Self::CredentialsFileInvalid { .. } => CREDENTIALS_INVALID,
            Self::TokenNotFound { .. } => TOKEN_NOT_FOUND,
            Self::AuthenticationRejected(_) => AUTHENTICATION_REJECTED,
            Self::SessionMissing(_) | Self::SessionUnreadable { .. } => SESSION_MISSING,
            Self::SessionExpired { .. } => SESSION_EXPIRED,
            Self::NoLessonsFound { .. } => NO_LESSONS_FOUND,
            Self::RenderTimeout { .. } => RENDER_TIMEOUT,
            Self::BrowserLaunchFailed(_) | Self::RenderFailed(_) => BROWSER_LAUNCH_FAILED,
            Self::UnexpectedStatus { .. }
            | Self::TooManyRedirects { .. }
            | Self::InvalidUrl { .. }
            | Self::Http(_) => NETWORK,
            Self::InvalidConfig(_) | Self::Io(_) | Self::Json(_) => GENERIC,
        }
    }

    /// A one-line suggestion for what the user should do next.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CredentialsFileInvalid { .. } => {
                Some(r#"Expected JSON like {"email": "you@example.com", "password": "..."}."#)
            }
            Self::TokenNotFound { .. } => {
                Some("Open the sign-in page in a browser and check for a CAPTCHA or a new layout.")
            }
            Self::AuthenticationRejected(_) => Some("Check the email and password."),
            Self::SessionMissing(_) => {
                Some("Log in first: edools-harvest login <credentials-file>")
            }
            Self::SessionUnreadable { .. } | Self::SessionExpired { .. } => {
                Some("Log in again: edools-harvest login <credentials-file> --fresh")
            }
            Self::NoLessonsFound { browser_tried: false, .. } => Some(
                "Unset EDOOLS_NO_BROWSER (or drop --no-browser) to try the headless browser.",
            ),
            Self::NoLessonsFound { .. } => {
                Some("The course may be empty or the site structure may have changed.")
            }
            Self::RenderTimeout { .. } => Some("Retry with a larger --render-timeout."),
            Self::BrowserLaunchFailed(_) => Some(
                "Install Chrome/Chromium or point EDOOLS_CHROMIUM_PATH at the executable.",
            ),
            _ => None,
        }
    }
}
