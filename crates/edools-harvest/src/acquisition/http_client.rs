//! Async HTTP client wrapping reqwest.
//!
//! Plain HTTP requests, no browser. Redirects are never followed
//! automatically: callers inspect each hop so that a bounce to the sign-in
//! page can be told apart from a normal redirect. Cookies and the
//! user-agent live in the caller's [`Session`]; cookies are exchanged only
//! with hosts the session covers. There are no retries.

use crate::config::HarvestConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::session::Session;
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE, USER_AGENT};
use std::time::Duration;
use url::Url;

/// Response from a single request (no redirect following).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Requested URL.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Raw `Location` header, if any.
    pub location: Option<String>,
    /// Every `Set-Cookie` header, in order.
    pub set_cookies: Vec<String>,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }

    /// The `Location` header resolved against the requested URL.
    pub fn redirect_target(&self) -> Option<HarvestResult<Url>> {
        if !self.is_redirect() {
            return None;
        }
        let location = self.location.as_deref()?;
        Some(self.url.join(location).map_err(|e| HarvestError::InvalidUrl {
            url: location.to_string(),
            reason: e.to_string(),
        }))
    }
}

/// HTTP client for the login and scrape flows.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client with a per-request timeout.
    pub fn new(timeout_ms: u64) -> HarvestResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &HarvestConfig) -> HarvestResult<Self> {
        Self::new(config.request_timeout_ms)
    }

    /// GET `url` with the session's cookies, absorbing any new ones.
    pub async fn get(&self, session: &mut Session, url: &Url) -> HarvestResult<HttpResponse> {
        tracing::debug!(%url, "GET");
        let builder = self.client.get(url.clone());
        self.send(session, url, builder).await
    }

    /// POST url-encoded form fields with the session's cookies.
    pub async fn post_form(
        &self,
        session: &mut Session,
        url: &Url,
        form_fields: &[(&str, &str)],
    ) -> HarvestResult<HttpResponse> {
        tracing::debug!(%url, fields = form_fields.len(), "POST form");
        let builder = self.client.post(url.clone()).form(form_fields);
        self.send(session, url, builder).await
    }

    async fn send(
        &self,
        session: &mut Session,
        url: &Url,
        mut builder: reqwest::RequestBuilder,
    ) -> HarvestResult<HttpResponse> {
        builder = builder.header(USER_AGENT, session.user_agent());
        let same_site = session.shares_cookies_with(url);
        if same_site {
            if let Some(cookie) = session.cookie_header() {
                builder = builder.header(COOKIE, cookie);
            }
        } else {
            tracing::debug!(%url, "foreign host; cookies withheld");
        }

        let r = builder.send().await?;
        let status = r.status().as_u16();

        let location = r
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let set_cookies: Vec<String> = r
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .collect();
        if same_site {
            session.absorb_all(set_cookies.iter().map(String::as_str));
        }

        let body = r.text().await?;
        tracing::debug!(%url, status, cookies = set_cookies.len(), "response");

        Ok(HttpResponse {
            url: url.clone(),
            status,
            location,
            set_cookies,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response(status: u16, location: Option<&str>) -> HttpResponse {
        HttpResponse {
            url: Url::parse("https://school.myedools.com/users/sign_in").unwrap(),
            status,
            location: location.map(str::to_string),
            set_cookies: Vec::new(),
            body: String::new(),
        }
    }

    #[test]
    fn test_redirect_target_resolves_relative() {
        let resp = response(302, Some("/enrollments"));
        let target = resp.redirect_target().unwrap().unwrap();
        assert_eq!(target.as_str(), "https://school.myedools.com/enrollments");
    }

    #[test]
    fn test_no_redirect_target_for_ok() {
        assert!(response(200, Some("/ignored")).redirect_target().is_none());
        assert!(response(302, None).redirect_target().is_none());
    }

    #[tokio::test]
    async fn test_cookies_flow_through_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/first"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "/second")
                    .append_header("set-cookie", "session_id=abc123; path=/")
                    .append_header("set-cookie", "other=1; path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/second"))
            .and(header("cookie", "other=1; session_id=abc123"))
            .and(header("user-agent", "test-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let mut session = Session::new(base.clone(), "test-agent");
        let client = HttpClient::new(5_000).unwrap();

        let first = client.get(&mut session, &base.join("/first").unwrap()).await.unwrap();
        assert!(first.is_redirect());
        assert_eq!(session.cookies().len(), 2);

        let next = first.redirect_target().unwrap().unwrap();
        let second = client.get(&mut session, &next).await.unwrap();
        assert_eq!(second.status, 200);
        assert_eq!(second.body, "ok");
    }

    #[tokio::test]
    async fn test_cookies_withheld_from_other_hosts() {
        let school = MockServer::start().await;
        let elsewhere = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("set-cookie", "tracker=1; path=/"),
            )
            .mount(&elsewhere)
            .await;

        let base = Url::parse(&school.uri()).unwrap();
        let mut session = Session::new(base, "test-agent");
        session.absorb_set_cookie("session_id=abc123");
        let client = HttpClient::new(5_000).unwrap();

        let foreign = Url::parse(&format!(
            "http://localhost:{}/asset",
            elsewhere.address().port()
        ))
        .unwrap();
        client.get(&mut session, &foreign).await.unwrap();

        let requests = elsewhere.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("cookie"));
        assert_eq!(session.cookie("tracker"), None);
        assert_eq!(session.cookie("session_id"), Some("abc123"));
    }

    #[tokio::test]
    async fn test_truncated_body_is_a_network_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\n\r\n<html><a href=")
                .await;
            let _ = socket.shutdown().await;
        });

        let url = Url::parse(&format!("http://{addr}/enrollments/1/courses/2")).unwrap();
        let mut session = Session::new(url.clone(), "test-agent");
        let err = HttpClient::new(5_000)
            .unwrap()
            .get(&mut session, &url)
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::Http(_)));
        assert_eq!(err.exit_code(), crate::error::exit_codes::NETWORK);
    }
}
