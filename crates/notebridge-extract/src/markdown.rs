//! HTML to markdown conversion.

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());

/// Convert a cleaned content block to markdown.
///
/// Links in `html` are expected to be absolute already.
pub fn to_markdown(html: &str) -> String {
    let markdown = html2md::parse_html(html);
    let trimmed: Vec<&str> = markdown.lines().map(str::trim_end).collect();
    BLANK_RUNS
        .replace_all(&trimmed.join("\n"), "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_and_links() {
        let markdown = to_markdown(
            r#"<p>Read <a href="https://example.com/docs">the docs</a> first.</p><p>Then build.</p>"#,
        );
        assert!(markdown.contains("[the docs](https://example.com/docs)"));
        assert!(markdown.contains("Then build."));
    }

    #[test]
    fn test_emphasis() {
        let markdown = to_markdown("<p>This is <strong>important</strong></p>");
        assert!(markdown.contains("**important**"));
    }

    #[test]
    fn test_collapses_blank_lines() {
        let markdown = to_markdown("<p>One</p><br><br><br><p>Two</p>");
        assert!(!markdown.contains("\n\n\n"));
        assert!(markdown.starts_with("One"));
        assert!(markdown.ends_with("Two"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(to_markdown(""), "");
    }
}
