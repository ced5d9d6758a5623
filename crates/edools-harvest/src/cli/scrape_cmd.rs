//! `edools-harvest scrape <course-url>`: harvest the lesson list.

use super::output;
use crate::config::{parse_http_url, HarvestConfig};
use crate::harvest::scrape_course;
use crate::output::{default_output_path, write_lessons, OutputFormat};
use crate::renderer::chromium::ChromiumLauncher;
use crate::session::SessionStore;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Run the scrape command.
pub async fn run(
    config: &HarvestConfig,
    course_url: &str,
    out: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let course_url = parse_http_url(course_url)?;
    let mut session = SessionStore::from_config(config).load(config)?;

    output::status(format!("Collecting lessons from {course_url}..."));
    let launcher = Arc::new(ChromiumLauncher::from_config(config));
    let harvest = scrape_course(config, &mut session, &course_url, launcher).await?;

    let path = out.unwrap_or_else(|| default_output_path(&course_url));
    write_lessons(&path, &harvest.lessons, format)?;

    let shown = std::fs::canonicalize(&path).unwrap_or(path);
    if output::is_json() {
        output::print_json(&serde_json::json!({
            "total": harvest.lessons.len(),
            "source": harvest.source,
            "output": shown.display().to_string(),
        }));
    }
    output::status(format!(
        "Saved {} lesson(s) to {} ({} pass)",
        harvest.lessons.len(),
        shown.display(),
        harvest.source
    ));
    Ok(())
}
