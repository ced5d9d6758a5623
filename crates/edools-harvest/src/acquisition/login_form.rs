//! Anti-forgery token extraction from the sign-in page.
//!
//! Rails-based platforms publish the token twice: in
//! `<meta name="csrf-token">` and in a hidden `authenticity_token` field
//! of the form. The meta tag is checked first.

use scraper::{Html, Selector};

/// Name of the hidden form field carrying the token.
pub const TOKEN_FIELD: &str = "authenticity_token";

/// Find the anti-forgery token in a sign-in page.
pub fn extract_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let meta_sel =
        Selector::parse(r#"meta[name="csrf-token"]"#).expect("meta selector is valid");
    let field_sel = Selector::parse(r#"input[name="authenticity_token"]"#)
        .expect("token field selector is valid");

    let from_meta = document
        .select(&meta_sel)
        .filter_map(|el| el.value().attr("content"));
    let from_field = document
        .select(&field_sel)
        .filter_map(|el| el.value().attr("value"));

    from_meta
        .chain(from_field)
        .map(str::trim)
        .find(|token| !token.is_empty())
        .map(str::to_string)
}
