//! Lesson scraping with a static-then-browser fallback policy.

use crate::config::HarvestConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::extraction::browser_pass::BrowserPass;
use crate::extraction::static_pass::StaticPass;
use crate::extraction::{LessonRecord, LessonSource};
use crate::renderer::Launcher;
use crate::session::Session;
use std::sync::Arc;
use url::Url;

/// Lessons found for one course and the pass that found them.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub lessons: Vec<LessonRecord>,
    pub source: &'static str,
}

/// Try `primary`; if it finds nothing, try `fallback` when there is one.
///
/// Errors from `primary` (notably `SessionExpired`) are returned as-is and
/// never trigger the fallback.
pub async fn collect_lessons(
    session: &mut Session,
    course_url: &Url,
    primary: &dyn LessonSource,
    fallback: Option<&dyn LessonSource>,
) -> HarvestResult<Harvest> {
    let lessons = primary.collect(session, course_url).await?;
    if !lessons.is_empty() {
        return Ok(Harvest {
            lessons,
            source: primary.name(),
        });
    }

    let Some(fallback) = fallback else {
        return Err(HarvestError::NoLessonsFound {
            url: course_url.to_string(),
            browser_tried: false,
        });
    };

    tracing::info!(
        url = %course_url,
        from = primary.name(),
        to = fallback.name(),
        "no lessons in static HTML, falling back"
    );
    let lessons = fallback.collect(session, course_url).await?;
    if lessons.is_empty() {
        return Err(HarvestError::NoLessonsFound {
            url: course_url.to_string(),
            browser_tried: true,
        });
    }
    Ok(Harvest {
        lessons,
        source: fallback.name(),
    })
}

/// Scrape `course_url` with the configured passes.
///
/// `launcher` is only used when the static pass finds nothing and the
/// browser fallback is enabled.
pub async fn scrape_course(
    config: &HarvestConfig,
    session: &mut Session,
    course_url: &Url,
    launcher: Arc<dyn Launcher>,
) -> HarvestResult<Harvest> {
    let static_pass = StaticPass::new(config)?;
    let browser_pass = config
        .browser_fallback
        .then(|| BrowserPass::new(launcher, config));

    collect_lessons(
        session,
        course_url,
        &static_pass,
        browser_pass.as_ref().map(|p| p as &dyn LessonSource),
    )
    .await
}
