//! Self-check of generated XML before it is handed out.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use serde::Serialize;

static UTF8_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*<\?xml\s[^>]*encoding\s*=\s*["']utf-8["'][^>]*\?>"#).expect("UTF8_DECLARATION is a valid regex pattern")
});

/// Problems found in an exported document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExportValidation {
    /// Hard failures; the export is rejected while non-empty
    pub errors: Vec<String>,
    /// Soft findings reported alongside a successful export
    pub warnings: Vec<String>,
}

impl ExportValidation {
    /// True when there are no errors
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks the UTF-8 declaration, the root element, `internalid` on every
/// test case (errors) and CDATA on non-empty summaries (warning).
#[must_use]
pub fn validate_export(xml: &str) -> ExportValidation {
    let mut result = ExportValidation::default();

    if !UTF8_DECLARATION.is_match(xml) {
        result
            .errors
            .push("Missing XML declaration with UTF-8 encoding".to_string());
    }

    let mut reader = Reader::from_str(xml);
    let mut root_seen = false;
    let mut case_index = 0usize;
    let mut in_summary = false;
    let mut summary_has_cdata = false;
    let mut summary_has_text = false;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                result.errors.push(format!(
                    "Malformed XML at byte {}: {e}",
                    reader.buffer_position()
                ));
                break;
            }
        };

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.name();
                let name = name.as_ref();
                if !root_seen {
                    root_seen = true;
                    if name != b"testsuite" && name != b"testcases" {
                        result.errors.push(format!(
                            "Root element must be testsuite or testcases, found {}",
                            String::from_utf8_lossy(name)
                        ));
                    }
                }
                if name == b"testcase" {
                    case_index += 1;
                    if !has_attribute(e, b"internalid") {
                        result.errors.push(format!(
                            "Test case {case_index} is missing the internalid attribute"
                        ));
                    }
                } else if name == b"summary" && !is_empty {
                    in_summary = true;
                    summary_has_cdata = false;
                    summary_has_text = false;
                }
            }
            Event::CData(_) if in_summary => summary_has_cdata = true,
            Event::Text(ref t) if in_summary => {
                if !String::from_utf8_lossy(t).trim().is_empty() {
                    summary_has_text = true;
                }
            }
            Event::GeneralRef(_) if in_summary => summary_has_text = true,
            Event::End(ref e) if e.name().as_ref() == b"summary" => {
                if in_summary && summary_has_text && !summary_has_cdata {
                    result.warnings.push(format!(
                        "Test case {case_index} summary is not wrapped in CDATA"
                    ));
                }
                in_summary = false;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        result
            .errors
            .push("Root element must be testsuite or testcases".to_string());
    }

    result
}

fn has_attribute(element: &BytesStart<'_>, key: &[u8]) -> bool {
    element
        .attributes()
        .flatten()
        .any(|attr| attr.key.as_ref() == key && !attr.value.is_empty())
}
