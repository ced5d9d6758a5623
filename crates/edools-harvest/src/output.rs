//! Lesson list files.
//!
//! The default wrapped form:
//!
//! ```json
//! {
//!   "coletado_em": "2026-10-19 14:03:07",
//!   "total": 2,
//!   "aulas": [ { "title": "Aula 1", "url": "https://..." } ]
//! }
//! ```
//!
//! `--bare` writes only the array. Output is pretty-printed with a trailing
//! newline; nothing but the timestamp varies between runs on the same input.

use crate::error::HarvestResult;
use crate::extraction::LessonRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use url::Url;

/// Shape of the lesson list file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `{"coletado_em", "total", "aulas"}`.
    #[default]
    Wrapped,
    /// Just the array of lessons.
    Bare,
}

/// The wrapped lesson list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonReport {
    pub coletado_em: String,
    pub total: usize,
    pub aulas: Vec<LessonRecord>,
}

impl LessonReport {
    pub fn new(lessons: Vec<LessonRecord>) -> Self {
        Self {
            coletado_em: crate::timestamp::now(),
            total: lessons.len(),
            aulas: lessons,
        }
    }
}

/// Serialize lessons in `format`.
pub fn render(lessons: &[LessonRecord], format: OutputFormat) -> HarvestResult<String> {
    let mut json = match format {
        OutputFormat::Wrapped => serde_json::to_string_pretty(&LessonReport::new(lessons.to_vec()))?,
        OutputFormat::Bare => serde_json::to_string_pretty(lessons)?,
    };
    json.push('\n');
    Ok(json)
}

/// Write lessons to `path`, creating parent directories.
pub fn write_lessons(
    path: &Path,
    lessons: &[LessonRecord],
    format: OutputFormat,
) -> HarvestResult<()> {
    let json = render(lessons, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), total = lessons.len(), "lessons written");
    Ok(())
}

/// `course-{id}_lessons.json` for a course URL.
///
/// The id is the number after `/courses/`; failing that, the last path
/// segment; failing that, `unknown`.
pub fn default_output_path(course_url: &Url) -> PathBuf {
    fn course_id_regex() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"/courses/(\d+)").expect("course id regex is valid"))
    }

    let ident = course_id_regex()
        .captures(course_url.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            course_url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string());

    PathBuf::from(format!("course-{ident}_lessons.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn lessons() -> Vec<LessonRecord> {
        vec![
            LessonRecord {
                title: "Aula 1".into(),
                url: "https://host/enrollments/1/courses/2/course_contents/10".into(),
            },
            LessonRecord {
                title: "Aula 2".into(),
                url: "https://host/enrollments/1/courses/2/course_contents/11".into(),
            },
        ]
    }

    #[test]
    fn test_wrapped_shape() {
        let text = render(&lessons(), OutputFormat::Wrapped).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["coletado_em"].is_string());
        value.as_object_mut().unwrap().remove("coletado_em");
        assert_json_eq!(
            value,
            json!({
                "total": 2,
                "aulas": [
                    {"title": "Aula 1", "url": "https://host/enrollments/1/courses/2/course_contents/10"},
                    {"title": "Aula 2", "url": "https://host/enrollments/1/courses/2/course_contents/11"}
                ]
            })
        );
    }

    #[test]
    fn test_bare_shape() {
        let text = render(&lessons(), OutputFormat::Bare).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_json_eq!(
            value,
            json!([
                {"title": "Aula 1", "url": "https://host/enrollments/1/courses/2/course_contents/10"},
                {"title": "Aula 2", "url": "https://host/enrollments/1/courses/2/course_contents/11"}
            ])
        );
    }

    #[test]
    fn test_non_ascii_kept_verbatim() {
        let records = vec![LessonRecord {
            title: "Introdução".into(),
            url: "https://host/enrollments/1/courses/2/course_contents/1".into(),
        }];
        let text = render(&records, OutputFormat::Bare).unwrap();
        assert!(text.contains("Introdução"));
    }

    #[test]
    fn test_default_output_path() {
        let url = Url::parse("https://host/enrollments/1/courses/2").unwrap();
        assert_eq!(default_output_path(&url), PathBuf::from("course-2_lessons.json"));

        let url = Url::parse("https://host/enrollments/1/courses/2/").unwrap();
        assert_eq!(default_output_path(&url), PathBuf::from("course-2_lessons.json"));

        let url = Url::parse("https://host/my/curso-python").unwrap();
        assert_eq!(
            default_output_path(&url),
            PathBuf::from("course-curso-python_lessons.json")
        );

        let url = Url::parse("https://host/").unwrap();
        assert_eq!(default_output_path(&url), PathBuf::from("course-unknown_lessons.json"));
    }

    #[test]
    fn test_write_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("aulas.json");
        write_lessons(&path, &lessons(), OutputFormat::Wrapped).unwrap();
        let report: LessonReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.aulas, lessons());
    }
}
