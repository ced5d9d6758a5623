//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use edools_harvest::config::HarvestConfig;
use edools_harvest::renderer::{
    BrowserCookie, Launcher, NavigationResult, RenderContext, Renderer,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

pub const SIGN_IN_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head>
  <meta name="csrf-param" content="authenticity_token" />
  <meta name="csrf-token" content="tok123" />
</head>
<body>
  <form action="/users/sign_in" method="post">
    <input type="hidden" name="authenticity_token" value="tok123" />
    <input type="email" name="user[email]" />
    <input type="password" name="user[password]" />
  </form>
</body>
</html>
"#;

pub const COURSE_PAGE: &str = r#"
<!DOCTYPE html>
<html><body>
  <nav><a href="/enrollments">Meus cursos</a></nav>
  <ul class="lessons">
    <li><a class="lesson-title" href="/enrollments/1/courses/2/course_contents/11">Aula 2</a></li>
    <li><a class="lesson-title" href="/enrollments/1/courses/2/course_contents/10">Aula 1</a></li>
    <li><a class="lesson-title" href="/enrollments/1/courses/2/course_contents/10#comments">Aula 1</a></li>
  </ul>
</body></html>
"#;

pub const EMPTY_COURSE_PAGE: &str = r#"
<!DOCTYPE html>
<html><body><div id="app"></div><script src="/packs/app.js"></script></body></html>
"#;

/// Config pointing at a mock server, with the session file in `dir`.
pub fn config_for(server: &MockServer, dir: &Path) -> HarvestConfig {
    let mut config = HarvestConfig::default();
    config.set_base_url(&server.uri()).unwrap();
    config.session_file = dir.join("session_cookies.json");
    config.request_timeout_ms = 5_000;
    config.render_timeout_ms = 200;
    config
}

/// Write a session store holding `session_id=abc123`.
pub fn write_session(config: &HarvestConfig) {
    std::fs::write(
        &config.session_file,
        r#"{"saved_at": "2026-10-19 10:00:00", "cookies": {"session_id": "abc123"}}"#,
    )
    .unwrap();
}

/// What the fake browser should do.
#[derive(Debug, Clone, Default)]
pub struct FakeBehavior {
    pub fail_launch: bool,
    pub rendered_html: String,
    pub renders: bool,
    pub land_on: Option<String>,
}

/// Observations recorded by the fake browser.
#[derive(Debug, Default)]
pub struct FakeState {
    pub launches: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub open_contexts: AtomicUsize,
    pub cookies: Mutex<Vec<BrowserCookie>>,
    pub visited: Mutex<Vec<String>>,
}

pub struct FakeLauncher {
    pub behavior: FakeBehavior,
    pub state: Arc<FakeState>,
}

impl FakeLauncher {
    pub fn new(behavior: FakeBehavior) -> (Arc<Self>, Arc<FakeState>) {
        let state = Arc::new(FakeState::default());
        let launcher = Arc::new(Self {
            behavior,
            state: Arc::clone(&state),
        });
        (launcher, state)
    }

    /// A launcher that must never be used.
    pub fn unused() -> (Arc<Self>, Arc<FakeState>) {
        Self::new(FakeBehavior {
            fail_launch: true,
            ..FakeBehavior::default()
        })
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn Renderer>> {
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_launch {
            bail!("Chromium not found");
        }
        Ok(Box::new(FakeRenderer {
            behavior: self.behavior.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeRenderer {
    behavior: FakeBehavior,
    state: Arc<FakeState>,
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        self.state.open_contexts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeContext {
            behavior: self.behavior.clone(),
            state: Arc::clone(&self.state),
            url: "about:blank".to_string(),
        }))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.state.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.state.open_contexts.load(Ordering::SeqCst)
    }
}

struct FakeContext {
    behavior: FakeBehavior,
    state: Arc<FakeState>,
    url: String,
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        self.state.visited.lock().unwrap().push(url.to_string());
        self.url = match &self.behavior.land_on {
            Some(target) if url.contains("/courses/") => target.clone(),
            _ => url.to_string(),
        };
        Ok(NavigationResult {
            final_url: self.url.clone(),
            load_time_ms: 1,
        })
    }

    async fn set_cookies(&mut self, cookies: &[BrowserCookie]) -> Result<()> {
        self.state.cookies.lock().unwrap().extend_from_slice(cookies);
        Ok(())
    }

    async fn wait_for_selector(&self, _selector: &str, _timeout_ms: u64) -> Result<bool> {
        Ok(self.behavior.renders)
    }

    async fn get_html(&self) -> Result<String> {
        Ok(self.behavior.rendered_html.clone())
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.open_contexts.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
