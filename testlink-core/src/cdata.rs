//! CDATA helpers shared by the parser and the exporter.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static CDATA_WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*<!\[CDATA\[(.*)\]\]>\s*$").expect("CDATA_WRAPPER is a valid regex pattern")
});

static NEEDS_CDATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[<>&"]"#).expect("NEEDS_CDATA is a valid regex pattern")
});

/// Strips a surrounding `<![CDATA[...]]>` wrapper, otherwise trims the text.
///
/// ```
/// use testlink_core::cdata::unwrap_cdata;
/// assert_eq!(unwrap_cdata("<![CDATA[<p>Hi</p>]]>"), "<p>Hi</p>");
/// assert_eq!(unwrap_cdata("  plain  "), "plain");
/// ```
#[must_use]
pub fn unwrap_cdata(text: &str) -> String {
    CDATA_WRAPPER.captures(text).map_or_else(
        || text.trim().to_string(),
        |caps| caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
    )
}

/// Returns true if the value contains markup or characters that must be
/// escaped, meaning the exporter emits it as CDATA
#[must_use]
pub fn needs_cdata(text: &str) -> bool {
    NEEDS_CDATA.is_match(text)
}

/// Wraps text in a CDATA section. An embedded `]]>` is split across two
/// sections so the output stays well-formed.
#[must_use]
pub fn wrap_cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// Renders a text value: CDATA when [`needs_cdata`] says so, otherwise
/// escaped plain text
#[must_use]
pub fn render_text(text: &str) -> Cow<'_, str> {
    if needs_cdata(text) {
        Cow::Owned(wrap_cdata(text))
    } else {
        quick_xml::escape::escape(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_handles_multiline_cdata() {
        assert_eq!(
            unwrap_cdata("\n  <![CDATA[<p>line 1</p>\n<p>line 2</p>]]>\n"),
            "<p>line 1</p>\n<p>line 2</p>"
        );
    }

    #[test]
    fn unwrap_passes_plain_text_trimmed() {
        assert_eq!(unwrap_cdata("\t hello world \n"), "hello world");
        assert_eq!(unwrap_cdata(""), "");
    }

    #[test]
    fn needs_cdata_detects_markup_and_entities() {
        assert!(needs_cdata("<p>x</p>"));
        assert!(needs_cdata("Tom & Jerry"));
        assert!(needs_cdata(r#"say "hi""#));
        assert!(needs_cdata("a > b"));
        assert!(!needs_cdata("plain words 123"));
    }

    #[test]
    fn wrap_splits_terminator() {
        let wrapped = wrap_cdata("a]]>b");
        assert_eq!(wrapped, "<![CDATA[a]]]]><![CDATA[>b]]>");
    }

    #[test]
    fn render_text_chooses_encoding() {
        assert_eq!(render_text("simple"), "simple");
        assert_eq!(render_text("<b>x</b>"), "<![CDATA[<b>x</b>]]>");
    }
}
