//! Chromium-based renderer using chromiumoxide.

use super::{BrowserCookie, Launcher, NavigationResult, RenderContext, Renderer};
use crate::config::HarvestConfig;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Interval between selector checks while waiting for client-side rendering.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Find the Chromium binary path.
///
/// An explicit path (from `--chromium`/`EDOOLS_CHROMIUM_PATH`) wins when it
/// exists; otherwise the system `PATH`, then the usual macOS location.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "configured Chromium path does not exist");
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches a headless Chromium per dynamic pass.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    pub fn from_config(config: &HarvestConfig) -> Self {
        Self::new(config.chromium_path.clone())
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn Renderer>> {
        let renderer = ChromiumRenderer::new(self.executable.as_deref()).await?;
        Ok(Box::new(renderer))
    }
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Create a new ChromiumRenderer, launching a headless Chromium instance.
    pub async fn new(executable: Option<&Path>) -> Result<Self> {
        let chrome_path = find_chromium(executable)
            .context("Chromium not found. Install Chrome/Chromium or set EDOOLS_CHROMIUM_PATH")?;
        tracing::debug!(path = %chrome_path.display(), "launching Chromium");

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1600, 1000)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--log-level=3")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Drive the CDP connection.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            handler,
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&mut self) -> Result<()> {
        let closed = self.browser.close().await;
        let waited = self.browser.wait().await;
        self.handler.abort();
        closed.context("failed to close Chromium")?;
        waited.context("failed to reap Chromium process")?;
        tracing::debug!("Chromium shut down");
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        // Both the request and the load wait count against `timeout_ms`.
        let page = &self.page;
        let result = tokio::time::timeout(Duration::from_millis(timeout_ms), async move {
            page.goto(url).await?;
            let _ = page.wait_for_navigation().await;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(())) => {
                let final_url = self.get_url().await.unwrap_or_else(|_| url.to_string());
                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn set_cookies(&mut self, cookies: &[BrowserCookie]) -> Result<()> {
        let params = cookies
            .iter()
            .map(|c| {
                CookieParam::builder()
                    .name(c.name.clone())
                    .value(c.value.clone())
                    .domain(c.domain.clone())
                    .path(c.path.clone())
                    .build()
                    .map_err(|e| anyhow::anyhow!("invalid cookie {}: {e}", c.name))
            })
            .collect::<Result<Vec<_>>>()?;

        self.page
            .set_cookies(params)
            .await
            .context("failed to set cookies")?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<bool> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn get_html(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?;

        let html: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert HTML result: {e:?}"))?;

        Ok(html)
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_path_falls_through() {
        let bogus = Path::new("/definitely/not/a/chrome");
        assert_ne!(find_chromium(Some(bogus)).as_deref(), Some(bogus));
    }

    #[test]
    fn test_existing_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("my-chrome");
        std::fs::write(&exe, b"").unwrap();
        assert_eq!(find_chromium(Some(&exe)), Some(exe.clone()));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_cookies_and_render() {
        let mut renderer = ChromiumRenderer::new(None)
            .await
            .expect("failed to create renderer");
        let mut ctx = renderer
            .new_context()
            .await
            .expect("failed to create context");

        ctx.navigate(
            "data:text/html,<a href='/enrollments/1/courses/2/course_contents/3'>Aula</a>",
            10000,
        )
        .await
        .expect("navigation failed");

        assert!(ctx
            .wait_for_selector(crate::extraction::lessons::LESSON_ANCHOR_SELECTOR, 2000)
            .await
            .expect("wait failed"));
        assert!(!ctx
            .wait_for_selector("a.never-rendered", 300)
            .await
            .expect("wait failed"));

        let html = ctx.get_html().await.expect("get_html failed");
        assert!(html.contains("course_contents/3"));

        // Unroutable address: the whole navigation must respect the bound.
        let started = Instant::now();
        assert!(ctx.navigate("http://10.255.255.1/", 500).await.is_err());
        assert!(started.elapsed() < Duration::from_secs(3));

        ctx.close().await.expect("close failed");
        assert_eq!(renderer.active_contexts(), 0);

        renderer.shutdown().await.expect("shutdown failed");
    }
}
