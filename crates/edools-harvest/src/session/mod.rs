//! Authenticated HTTP session state.
//!
//! A session is the cookie set issued by the platform plus the fixed
//! user-agent and the base URL it belongs to. It is passed explicitly
//! between the login and scrape flows and persisted by [`store`].
//!
//! Cookies are only sent to, and only accepted from, the session's own host
//! or its cookie domain.

pub mod store;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use url::Url;

pub use store::{SessionStore, StoredSession};

/// Cookies and request identity for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    base_url: Url,
    user_agent: String,
    /// e.g. `.myedools.com`; `None` limits cookies to the base host.
    cookie_domain: Option<String>,
    cookies: BTreeMap<String, String>,
}

impl Session {
    /// An empty session for `base_url`.
    pub fn new(base_url: Url, user_agent: impl Into<String>) -> Self {
        Self {
            base_url,
            user_agent: user_agent.into(),
            cookie_domain: None,
            cookies: BTreeMap::new(),
        }
    }

    /// A session restored from saved cookies.
    pub fn with_cookies(
        base_url: Url,
        user_agent: impl Into<String>,
        cookies: BTreeMap<String, String>,
    ) -> Self {
        Self {
            base_url,
            user_agent: user_agent.into(),
            cookie_domain: None,
            cookies,
        }
    }

    /// Also share cookies with every host under `domain`.
    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Whether requests to `url` may carry this session's cookies.
    pub fn shares_cookies_with(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if self.base_url.host_str() == Some(host) {
            return true;
        }
        self.cookie_domain
            .as_deref()
            .map(|domain| domain.trim_start_matches('.'))
            .filter(|domain| !domain.is_empty())
            .is_some_and(|domain| {
                host.eq_ignore_ascii_case(domain)
                    || host
                        .to_ascii_lowercase()
                        .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
            })
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Value for a `Cookie` request header, or `None` when there are no cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Merge one `Set-Cookie` header into the jar.
    ///
    /// Deletions (empty value, `Max-Age<=0`, or an `Expires` in the past)
    /// remove the cookie.
    pub fn absorb_set_cookie(&mut self, header: &str) {
        let Some(parsed) = parse_set_cookie(header) else {
            tracing::debug!(header, "ignoring malformed Set-Cookie");
            return;
        };
        if parsed.deleted {
            self.cookies.remove(&parsed.name);
        } else {
            self.cookies.insert(parsed.name, parsed.value);
        }
    }

    /// Merge every `Set-Cookie` header of a response.
    pub fn absorb_all<'a, I>(&mut self, headers: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for header in headers {
            self.absorb_set_cookie(header);
        }
    }
}

struct SetCookie {
    name: String,
    value: String,
    deleted: bool,
}

fn parse_set_cookie(header: &str) -> Option<SetCookie> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().to_string();

    let mut deleted = value.is_empty();
    for attr in parts {
        let (key, val) = match attr.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (attr.trim(), ""),
        };
        if key.eq_ignore_ascii_case("max-age") {
            if val.parse::<i64>().map(|age| age <= 0).unwrap_or(false) {
                deleted = true;
            }
        } else if key.eq_ignore_ascii_case("expires") {
            if let Ok(when) = DateTime::parse_from_rfc2822(val) {
                if when.with_timezone(&Utc) < Utc::now() {
                    deleted = true;
                }
            }
        }
    }

    Some(SetCookie {
        name: name.to_string(),
        value,
        deleted,
    })
}
