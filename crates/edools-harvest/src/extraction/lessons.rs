//! Lesson anchor extraction from course-page HTML.
//!
//! A lesson is any `<a href>` whose resolved path is
//! `/enrollments/{id}/courses/{id}/course_contents/{id}`. The same rule is
//! applied to the raw HTTP body and to the browser-rendered DOM.

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// CSS selector that is present once lesson anchors have been rendered.
pub const LESSON_ANCHOR_SELECTOR: &str = r#"a[href*="/course_contents/"]"#;

/// One lesson of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRecord {
    pub title: String,
    /// Absolute URL, fragment removed.
    pub url: String,
}

fn lesson_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/enrollments/(\d+)/courses/(\d+)/course_contents/(\d+)/?$")
            .expect("lesson path regex is valid")
    })
}

/// Numeric `(enrollment, course, content)` ids of a lesson URL.
pub fn lesson_ids(url: &Url) -> Option<(u64, u64, u64)> {
    let caps = lesson_path_regex().captures(url.path())?;
    let id = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    Some((id(1)?, id(2)?, id(3)?))
}

/// Extract lessons from `html`, resolving links against `page_url`.
///
/// The result is deduplicated by URL (first title wins) and sorted by the
/// numeric ids in the path, ties broken by URL.
pub fn extract_lessons(html: &str, page_url: &Url) -> Vec<LessonRecord> {
    let document = Html::parse_document(html);
    let anchor_sel = Selector::parse("a[href]").expect("anchor selector is valid");

    let mut seen = HashSet::new();
    let mut found: Vec<((u64, u64, u64), LessonRecord)> = Vec::new();

    for el in document.select(&anchor_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Ok(mut url) = page_url.join(href.trim()) else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        url.set_fragment(None);
        let Some(ids) = lesson_ids(&url) else {
            continue;
        };
        let url = url.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }

        let title = Some(element_text(&el))
            .filter(|t| !t.is_empty())
            .or_else(|| {
                el.value()
                    .attr("title")
                    .map(collapse_whitespace)
                    .filter(|t| !t.is_empty())
            })
            .unwrap_or_else(|| url.clone());

        found.push((ids, LessonRecord { title, url }));
    }

    found.sort_by(|(a_ids, a), (b_ids, b)| a_ids.cmp(b_ids).then_with(|| a.url.cmp(&b.url)));
    found.into_iter().map(|(_, record)| record).collect()
}

/// Collect all visible text content from an element, trimmed and
/// whitespace-collapsed.
fn element_text(el: &scraper::ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_url() -> Url {
        Url::parse("https://host/enrollments/1/courses/2").unwrap()
    }

    #[test]
    fn test_extracts_matching_anchors() {
        let html = r#"
        <html><body>
            <a class="lesson-title" href="/enrollments/1/courses/2/course_contents/11">Aula 2</a>
            <a class="lesson-title" href="/enrollments/1/courses/2/course_contents/10">
                Aula   1
            </a>
            <a href="/enrollments/1/courses/2">Voltar</a>
            <a href="https://other.example/help">Ajuda</a>
        </body></html>
        "#;

        let lessons = extract_lessons(html, &course_url());
        assert_eq!(
            lessons,
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
        );
    }

    #[test]
    fn test_dedup_keeps_first_title() {
        let html = r##"
            <a href="/enrollments/1/courses/2/course_contents/10">Aula 1</a>
            <a href="/enrollments/1/courses/2/course_contents/10#top"><img src="x.png"></a>
            <a href="https://host/enrollments/1/courses/2/course_contents/10">Duplicada</a>
        "##;
        let lessons = extract_lessons(html, &course_url());
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].title, "Aula 1");
    }

    #[test]
    fn test_numeric_sort_not_lexicographic() {
        let html = r#"
            <a href="/enrollments/1/courses/2/course_contents/100">C</a>
            <a href="/enrollments/1/courses/2/course_contents/9">A</a>
            <a href="/enrollments/1/courses/2/course_contents/11">B</a>
        "#;
        let titles: Vec<String> = extract_lessons(html, &course_url())
            .into_iter()
            .map(|l| l.title)
            .collect();
        assert_eq!(titles, ["A", "B", "C"]);
    }

    #[test]
    fn test_title_fallbacks() {
        let html = r#"
            <a href="/enrollments/1/courses/2/course_contents/1" title="Introdução"><i class="icon"></i></a>
            <a href="/enrollments/1/courses/2/course_contents/2"></a>
        "#;
        let lessons = extract_lessons(html, &course_url());
        assert_eq!(lessons[0].title, "Introdução");
        assert_eq!(
            lessons[1].title,
            "https://host/enrollments/1/courses/2/course_contents/2"
        );
    }

    #[test]
    fn test_relative_href_resolution() {
        let page = Url::parse("https://host/enrollments/1/courses/2/").unwrap();
        let html = r#"<a href="course_contents/5">Aula 5</a>"#;
        let lessons = extract_lessons(html, &page);
        assert_eq!(
            lessons[0].url,
            "https://host/enrollments/1/courses/2/course_contents/5"
        );
    }

    #[test]
    fn test_ignores_lookalikes() {
        let html = r#"
            <a href="/enrollments/x/courses/2/course_contents/1">bad id</a>
            <a href="/enrollments/1/courses/2/course_contents/1/edit">edit</a>
            <a href="javascript:void(0)">js</a>
        "#;
        assert!(extract_lessons(html, &course_url()).is_empty());
    }

    #[test]
    fn test_query_string_kept_in_url() {
        let html = r#"<a href="/enrollments/1/courses/2/course_contents/3?tab=video">Aula 3</a>"#;
        let lessons = extract_lessons(html, &course_url());
        assert_eq!(
            lessons[0].url,
            "https://host/enrollments/1/courses/2/course_contents/3?tab=video"
        );
    }
}
