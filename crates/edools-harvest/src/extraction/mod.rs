//! Lesson extraction strategies.
//!
//! Two implementations of [`LessonSource`]: [`static_pass::StaticPass`]
//! reads the raw HTTP response, [`browser_pass::BrowserPass`] renders the
//! page in a headless browser first. The fallback policy lives in
//! [`crate::harvest`].

pub mod browser_pass;
pub mod lessons;
pub mod static_pass;

use crate::error::HarvestResult;
use crate::session::Session;
use async_trait::async_trait;
use url::Url;

pub use lessons::{extract_lessons, LessonRecord};

/// A way of turning a course URL into lesson records.
#[async_trait]
pub trait LessonSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Collect lessons for `course_url`. An empty list is not an error.
    async fn collect(
        &self,
        session: &mut Session,
        course_url: &Url,
    ) -> HarvestResult<Vec<LessonRecord>>;
}
