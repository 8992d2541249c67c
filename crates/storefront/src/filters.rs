//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Site name shown in every page title.
pub const SITE_NAME: &str = "Smile Cart";

/// Formats a page title with the site name. An empty title gives the bare
/// site name.
///
/// Usage in templates: `{{ title|page_title }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn page_title(title: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_title(&title.to_string()))
}

fn format_title(title: &str) -> String {
    if title.trim().is_empty() {
        SITE_NAME.to_string()
    } else {
        format!("{title} | {SITE_NAME}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_title() {
        assert_eq!(format_title("Checkout"), "Checkout | Smile Cart");
        assert_eq!(format_title(""), "Smile Cart");
    }
}
