//! Dynamic pass: render the course page in a headless browser, then
//! extract lessons from the rendered DOM.
//!
//! The browser is launched per call and shut down on every exit path.

use super::lessons::LESSON_ANCHOR_SELECTOR;
use super::{extract_lessons, LessonRecord, LessonSource};
use crate::config::HarvestConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::renderer::{BrowserCookie, Launcher, RenderContext, Renderer};
use crate::session::Session;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Renders the course page with the session's cookies injected.
pub struct BrowserPass {
    launcher: Arc<dyn Launcher>,
    config: HarvestConfig,
}

impl BrowserPass {
    pub fn new(launcher: Arc<dyn Launcher>, config: &HarvestConfig) -> Self {
        Self {
            launcher,
            config: config.clone(),
        }
    }

    /// The session's cookies scoped to the platform's cookie domain.
    pub fn browser_cookies(&self, session: &Session) -> Vec<BrowserCookie> {
        let domain = self.config.effective_cookie_domain();
        session
            .cookies()
            .iter()
            .map(|(name, value)| BrowserCookie {
                name: name.clone(),
                value: value.clone(),
                domain: domain.clone(),
                path: "/".to_string(),
            })
            .collect()
    }

    async fn render(
        &self,
        renderer: &dyn Renderer,
        session: &Session,
        course_url: &Url,
    ) -> HarvestResult<Vec<LessonRecord>> {
        let mut ctx = renderer
            .new_context()
            .await
            .map_err(|e| HarvestError::BrowserLaunchFailed(format!("{e:#}")))?;
        let result = self.render_in(ctx.as_mut(), session, course_url).await;
        if let Err(e) = ctx.close().await {
            tracing::debug!(error = %e, "failed to close browser context");
        }
        result
    }

    async fn render_in(
        &self,
        ctx: &mut dyn RenderContext,
        session: &Session,
        course_url: &Url,
    ) -> HarvestResult<Vec<LessonRecord>> {
        let render_failed = |e: anyhow::Error| HarvestError::RenderFailed(format!("{e:#}"));

        // Cookies can only be attached once the browser is on the platform's origin.
        ctx.navigate(self.config.base_url.as_str(), self.config.request_timeout_ms)
            .await
            .map_err(render_failed)?;
        ctx.set_cookies(&self.browser_cookies(session))
            .await
            .map_err(render_failed)?;

        let nav = ctx
            .navigate(course_url.as_str(), self.config.request_timeout_ms)
            .await
            .map_err(render_failed)?;
        tracing::debug!(url = %nav.final_url, load_time_ms = nav.load_time_ms, "course page loaded");

        let landed = Url::parse(&nav.final_url).unwrap_or_else(|_| course_url.clone());
        if self.config.is_sign_in(&landed) {
            return Err(HarvestError::SessionExpired {
                url: course_url.to_string(),
            });
        }

        let rendered = ctx
            .wait_for_selector(LESSON_ANCHOR_SELECTOR, self.config.render_timeout_ms)
            .await
            .map_err(render_failed)?;
        if !rendered {
            return Err(HarvestError::RenderTimeout {
                url: course_url.to_string(),
                timeout_ms: self.config.render_timeout_ms,
            });
        }

        let html = ctx.get_html().await.map_err(render_failed)?;
        Ok(extract_lessons(&html, &landed))
    }
}

#[async_trait]
impl LessonSource for BrowserPass {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn collect(
        &self,
        session: &mut Session,
        course_url: &Url,
    ) -> HarvestResult<Vec<LessonRecord>> {
        let mut renderer = self
            .launcher
            .launch()
            .await
            .map_err(|e| HarvestError::BrowserLaunchFailed(format!("{e:#}")))?;

        let result = self.render(renderer.as_ref(), session, course_url).await;

        if let Err(e) = renderer.shutdown().await {
            tracing::warn!(error = %e, "browser shutdown failed");
        }
        if let Ok(lessons) = &result {
            tracing::info!(url = %course_url, found = lessons.len(), "browser pass done");
        }
        result
    }
}
