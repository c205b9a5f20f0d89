//! Property tests for CDATA handling and text round trips through the writer

use proptest::prelude::*;
use testlink_core::cdata::{needs_cdata, render_text, unwrap_cdata, wrap_cdata};
use testlink_core::export::{ExportDocument, validate_export};
use testlink_core::import::parse_content;
use testlink_core::models::ParsedTestCase;

/// Free text including markup characters and `]]>` fragments, without `!`
/// so a literal CDATA opener cannot appear inside the value.
fn free_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 <>&\"'/.,;:?()=\\[\\]-]{0,60}"
}

proptest! {
    /// Property: unwrapping a wrapped value returns the trimmed value
    #[test]
    fn wrap_then_unwrap_is_trim(text in "[a-zA-Z0-9 <>&\"'/.,;:?()=-]{0,60}") {
        prop_assert_eq!(unwrap_cdata(&wrap_cdata(&text)), text.trim());
    }

    /// Property: plain values pass through unwrap trimmed
    #[test]
    fn unwrap_plain_trims(text in "[a-zA-Z0-9 .,-]{0,40}") {
        prop_assert_eq!(unwrap_cdata(&text), text.trim());
    }

    /// Property: rendering only switches to CDATA when it has to
    #[test]
    fn render_uses_cdata_only_when_needed(text in free_text()) {
        let rendered = render_text(&text);
        prop_assert_eq!(rendered.starts_with("<![CDATA["), needs_cdata(&text));
        if !needs_cdata(&text) {
            prop_assert!(!rendered.contains('<'));
        }
    }

    /// Property: text written by the exporter parses back unchanged (trimmed)
    #[test]
    fn written_text_parses_back(summary in free_text(), name in free_text()) {
        let case = ParsedTestCase::new("42", name.clone()).with_summary(summary.clone());
        let xml = testlink_core::export::write_xml(&ExportDocument::TestCases(vec![case]));

        prop_assert!(validate_export(&xml).is_valid());
        let tree = parse_content(&xml).unwrap();
        let cases = tree.all_test_cases();
        prop_assert_eq!(cases.len(), 1);
        prop_assert_eq!(cases[0].summary.as_str(), summary.trim());
        prop_assert_eq!(cases[0].name.as_str(), name.trim());
        prop_assert_eq!(cases[0].internal_id.as_str(), "42");
    }
}
