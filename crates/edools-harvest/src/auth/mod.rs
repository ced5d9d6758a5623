//! Session acquisition: sign in through the platform's web form.
//!
//! The handshake is linear:
//!
//! 1. GET the sign-in page and pull out the anti-forgery token.
//! 2. POST email, password, token and organization id, without following
//!    the redirect.
//! 3. A redirect means the credentials were accepted; follow it once so the
//!    platform can finish setting session cookies.
//! 4. Persist the cookie set.

use crate::acquisition::http_client::HttpClient;
use crate::acquisition::login_form::{extract_token, TOKEN_FIELD};
use crate::config::HarvestConfig;
use crate::credentials::Credentials;
use crate::error::{HarvestError, HarvestResult};
use crate::session::{Session, SessionStore, StoredSession};
use std::path::Path;
use url::Url;

/// A freshly authenticated session.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session: Session,
    /// Where the platform sent us after the login POST.
    pub landed_on: Url,
}

/// What `login` ended up doing.
#[derive(Debug, Clone)]
pub enum LoginStatus {
    /// A session file already existed and `fresh` was not requested.
    Reused { saved_at: String },
    /// A new session was acquired and saved.
    LoggedIn {
        landed_on: Url,
        stored: StoredSession,
    },
}

/// Performs the sign-in handshake.
pub struct SessionAcquirer<'a> {
    config: &'a HarvestConfig,
    client: HttpClient,
}

impl<'a> SessionAcquirer<'a> {
    pub fn new(config: &'a HarvestConfig) -> HarvestResult<Self> {
        Ok(Self {
            config,
            client: HttpClient::from_config(config)?,
        })
    }

    /// Sign in and return the authenticated session. Nothing is persisted.
    pub async fn acquire(&self, credentials: &Credentials) -> HarvestResult<Authenticated> {
        let sign_in = self.config.sign_in_url()?;
        let mut session = Session::new(self.config.base_url.clone(), &self.config.user_agent)
            .with_cookie_domain(self.config.effective_cookie_domain());

        let page = self.client.get(&mut session, &sign_in).await?;
        if !page.is_success() {
            return Err(HarvestError::UnexpectedStatus {
                url: sign_in.to_string(),
                status: page.status,
            });
        }
        let token = extract_token(&page.body).ok_or_else(|| HarvestError::TokenNotFound {
            url: sign_in.to_string(),
        })?;
        tracing::debug!("anti-forgery token found");

        let form = [
            (TOKEN_FIELD, token.as_str()),
            ("user[organization_id]", self.config.organization_id.as_str()),
            ("user[email]", credentials.email.as_str()),
            ("user[password]", credentials.password.as_str()),
        ];
        let resp = self.client.post_form(&mut session, &sign_in, &form).await?;

        let landed_on = match resp.redirect_target() {
            Some(target) => target?,
            None if resp.is_redirect() => {
                return Err(HarvestError::AuthenticationRejected(format!(
                    "sign-in answered {} without a Location header",
                    resp.status
                )))
            }
            None => {
                return Err(HarvestError::AuthenticationRejected(format!(
                    "sign-in returned status {} instead of a redirect",
                    resp.status
                )))
            }
        };
        if self.config.is_sign_in(&landed_on) {
            return Err(HarvestError::AuthenticationRejected(
                "sign-in redirected back to the sign-in page".into(),
            ));
        }

        let confirm = self.client.get(&mut session, &landed_on).await?;
        tracing::debug!(url = %landed_on, status = confirm.status, "followed login redirect");

        if session.is_empty() {
            return Err(HarvestError::AuthenticationRejected(
                "the platform did not set any session cookie".into(),
            ));
        }

        tracing::info!(
            email = %credentials.email,
            url = %landed_on,
            cookies = session.cookies().len(),
            "login succeeded"
        );
        Ok(Authenticated { session, landed_on })
    }
}

/// Sign in and save the session, or reuse the saved one unless `fresh`.
///
/// When reusing, the credentials file is not read at all and the saved
/// session is not validated.
pub async fn login(
    config: &HarvestConfig,
    store: &SessionStore,
    credentials_path: &Path,
    fresh: bool,
) -> HarvestResult<LoginStatus> {
    if !fresh && store.exists() {
        let saved_at = match store.read() {
            Ok(stored) => stored.saved_at,
            Err(e) => {
                tracing::warn!(error = %e, "saved session is unreadable, reusing anyway");
                String::from("unknown")
            }
        };
        tracing::info!(path = %store.path().display(), "session already saved; skipping login");
        return Ok(LoginStatus::Reused { saved_at });
    }

    let credentials = Credentials::from_file(credentials_path)?;
    let acquired = SessionAcquirer::new(config)?.acquire(&credentials).await?;
    let stored = store.save(&acquired.session)?;

    Ok(LoginStatus::LoggedIn {
        landed_on: acquired.landed_on,
        stored,
    })
}
