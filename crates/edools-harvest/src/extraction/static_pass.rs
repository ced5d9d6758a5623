//! Static pass: extract lessons straight from the HTTP response body.

use super::{extract_lessons, LessonRecord, LessonSource};
use crate::acquisition::http_client::HttpClient;
use crate::config::{HarvestConfig, MAX_REDIRECT_HOPS};
use crate::error::{HarvestError, HarvestResult};
use crate::session::Session;
use async_trait::async_trait;
use url::Url;

/// A fetched page after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: Url,
    pub body: String,
}

/// Fetches the course page over plain HTTP and parses it.
pub struct StaticPass {
    client: HttpClient,
    config: HarvestConfig,
}

impl StaticPass {
    pub fn new(config: &HarvestConfig) -> HarvestResult<Self> {
        Ok(Self {
            client: HttpClient::from_config(config)?,
            config: config.clone(),
        })
    }

    /// GET `url`, following redirects by hand.
    ///
    /// Fails with `SessionExpired` as soon as a hop points at the sign-in
    /// page.
    pub async fn fetch(&self, session: &mut Session, url: &Url) -> HarvestResult<FetchedPage> {
        let mut current = url.clone();
        for _ in 0..MAX_REDIRECT_HOPS {
            let resp = self.client.get(session, &current).await?;

            if let Some(target) = resp.redirect_target() {
                let target = target?;
                if self.config.is_sign_in(&target) {
                    tracing::warn!(url = %url, "redirected to sign-in; session expired");
                    return Err(HarvestError::SessionExpired {
                        url: url.to_string(),
                    });
                }
                tracing::debug!(from = %current, to = %target, "following redirect");
                current = target;
                continue;
            }

            if !resp.is_success() {
                return Err(HarvestError::UnexpectedStatus {
                    url: current.to_string(),
                    status: resp.status,
                });
            }
            return Ok(FetchedPage {
                final_url: current,
                body: resp.body,
            });
        }

        Err(HarvestError::TooManyRedirects {
            url: url.to_string(),
            max_hops: MAX_REDIRECT_HOPS,
        })
    }
}

#[async_trait]
impl LessonSource for StaticPass {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn collect(
        &self,
        session: &mut Session,
        course_url: &Url,
    ) -> HarvestResult<Vec<LessonRecord>> {
        let page = self.fetch(session, course_url).await?;
        let lessons = extract_lessons(&page.body, &page.final_url);
        tracing::info!(url = %page.final_url, found = lessons.len(), "static pass done");
        Ok(lessons)
    }
}
