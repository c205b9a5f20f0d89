//! TestLink XML parser.
//!
//! Turns a TestLink export (`<testsuite>` or `<testcases>` root) into a
//! [`ParsedSuiteNode`] tree. The reader pass builds a small element tree with
//! an explicit stack; a second pass maps elements onto the model.
//!
//! TestLink writes several fields either as attributes or as nested
//! (usually CDATA) elements depending on version. When both are present the
//! non-empty attribute wins.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::cdata::unwrap_cdata;
use crate::error::ParseError;
use crate::models::{
    CustomField, ExecutionType, Importance, Keyword, ParsedStep, ParsedSuiteNode, ParsedTestCase,
    ProvidedFields, Requirement,
};

/// Name given to the synthetic root suite of a `<testcases>` document
pub const TESTCASES_ROOT_NAME: &str = "Imported Test Cases";

/// Parses a TestLink XML file.
///
/// # Errors
///
/// Returns `ParseError::Read` if the file cannot be read, otherwise the same
/// errors as [`parse_content`].
pub fn parse_file(path: &Path) -> Result<ParsedSuiteNode, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|e| ParseError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_content(&content)
}

/// Parses TestLink XML text.
///
/// # Errors
///
/// Returns `ParseError::Malformed` for XML the reader rejects and
/// `ParseError::MissingRoot` when no `testsuite`/`testcases` element exists.
pub fn parse_content(xml: &str) -> Result<ParsedSuiteNode, ParseError> {
    let document = read_elements(xml)?.ok_or(ParseError::MissingRoot)?;
    let root = find_root(&document).ok_or(ParseError::MissingRoot)?;

    if root.name == "testcases" {
        let mut suite = ParsedSuiteNode::new(TESTCASES_ROOT_NAME);
        suite.test_cases = root
            .children_named("testcase")
            .map(parse_test_case)
            .collect();
        return Ok(suite);
    }

    Ok(parse_suite(root))
}

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    /// Set when any of `text` came from a CDATA section
    has_cdata: bool,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(e: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let attributes = e
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                let raw = String::from_utf8_lossy(&attr.value).to_string();
                let value = quick_xml::escape::unescape(&raw)
                    .map(|v| v.into_owned())
                    .unwrap_or(raw);
                (key, value)
            })
            .collect();
        Self {
            name,
            attributes,
            ..Self::default()
        }
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text content. A CDATA wrapper is stripped only from plain
    /// text; content read from a CDATA section is already unwrapped.
    fn value(&self) -> String {
        if self.has_cdata {
            self.text.trim().to_string()
        } else {
            unwrap_cdata(&self.text)
        }
    }

    /// Text of the named child element, empty when absent
    fn child_text(&self, name: &str) -> String {
        self.child(name).map(Self::value).unwrap_or_default()
    }

    /// A field that may be an attribute or a child element.
    /// A non-empty attribute takes precedence.
    fn field(&self, name: &str) -> Option<String> {
        if let Some(value) = self.attr(name).map(str::trim)
            && !value.is_empty()
        {
            return Some(value.to_string());
        }
        let text = self.child_text(name);
        (!text.is_empty()).then_some(text)
    }
}

/// Reads the document into an element tree, returning the outermost element.
fn read_elements(xml: &str) -> Result<Option<XmlElement>, ParseError> {
    let xml = xml.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| ParseError::Malformed {
            position: reader.buffer_position() as u64,
            reason: e.to_string(),
        })?;

        match event {
            Event::Start(e) => stack.push(XmlElement::from_start(&e)),
            Event::Empty(e) => {
                let element = XmlElement::from_start(&e);
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(&e);
                    match quick_xml::escape::unescape(&raw) {
                        Ok(text) => current.text.push_str(&text),
                        Err(_) => current.text.push_str(&raw),
                    }
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                    current.has_cdata = true;
                }
            }
            Event::GeneralRef(e) => {
                if let Some(current) = stack.last_mut() {
                    let name = String::from_utf8_lossy(&e).to_string();
                    current.text.push_str(&resolve_reference(&name));
                }
            }
            Event::Eof => break,
            _ => {} // Decl, PI, Comment, DocType
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Malformed {
            position: reader.buffer_position() as u64,
            reason: format!("unclosed element <{}>", stack[stack.len() - 1].name),
        });
    }

    Ok(root)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    }
}

/// Resolves `&name;` references split out by the reader
fn resolve_reference(name: &str) -> String {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = code
            .strip_prefix('x')
            .or_else(|| code.strip_prefix('X'))
            .map_or_else(|| code.parse::<u32>().ok(), |hex| u32::from_str_radix(hex, 16).ok());
        return parsed
            .and_then(char::from_u32)
            .map_or_else(|| format!("&{name};"), String::from);
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map_or_else(|| format!("&{name};"), str::to_string)
}

/// Finds the first `testsuite`/`testcases` element in document order
fn find_root(document: &XmlElement) -> Option<&XmlElement> {
    let mut stack = vec![document];
    while let Some(element) = stack.pop() {
        if element.name == "testsuite" || element.name == "testcases" {
            return Some(element);
        }
        stack.extend(element.children.iter().rev());
    }
    None
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

fn parse_suite(element: &XmlElement) -> ParsedSuiteNode {
    let mut suite = ParsedSuiteNode {
        id: element.field("id"),
        name: element.field("name").unwrap_or_default(),
        node_order: element.field("node_order").and_then(|v| v.parse().ok()),
        details: element.child_text("details"),
        ..ParsedSuiteNode::default()
    };

    // Child suites first, then this suite's own cases.
    suite.children = element.children_named("testsuite").map(parse_suite).collect();
    suite.test_cases = element
        .children_named("testcase")
        .map(parse_test_case)
        .collect();
    suite
}

fn parse_test_case(element: &XmlElement) -> ParsedTestCase {
    let execution_type = element.field("execution_type");
    let importance = element.field("importance");
    let is_open = element.field("is_open");
    let active = element.field("active");
    let provided = ProvidedFields {
        execution_type: execution_type.is_some(),
        importance: importance.is_some(),
        is_open: is_open.is_some(),
        active: active.is_some(),
    };

    let mut case = ParsedTestCase {
        internal_id: element.field("internalid").unwrap_or_default(),
        external_id: element.field("externalid"),
        name: element.field("name").unwrap_or_default(),
        node_order: element.field("node_order").and_then(|v| v.parse().ok()),
        version: element.field("version").and_then(|v| v.parse().ok()),
        summary: element.child_text("summary"),
        preconditions: element.child_text("preconditions"),
        execution_type: execution_type
            .map(|v| ExecutionType::from_xml(&v))
            .unwrap_or_default(),
        importance: importance
            .map(|v| Importance::from_xml(&v))
            .unwrap_or_default(),
        status: element.field("status").and_then(|v| v.parse().ok()),
        is_open: is_open.is_none_or(|v| parse_flag(&v)),
        active: active.is_none_or(|v| parse_flag(&v)),
        provided,
        ..ParsedTestCase::default()
    };

    case.steps = parse_steps(element);
    case.custom_fields = parse_custom_fields(element);
    case.keywords = parse_keywords(element);
    case.requirements = parse_requirements(element);
    case
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim(), "0" | "false" | "no")
}

/// Normalizes nested `<step>` lists and the legacy flat `<steps>` text into
/// the same shape, numbered from 1.
fn parse_steps(case: &XmlElement) -> Vec<ParsedStep> {
    let steps_element = case.child("steps");

    if let Some(steps) = steps_element
        && steps.child("step").is_some()
    {
        let mut numbered: Vec<(Option<u32>, ParsedStep)> = steps
            .children_named("step")
            .map(|step| {
                let source_number = step.field("step_number").and_then(|v| v.parse().ok());
                let parsed = ParsedStep {
                    step_number: 0,
                    actions: step.child_text("actions"),
                    expected_results: step.child_text("expectedresults"),
                    execution_type: step
                        .field("execution_type")
                        .map(|v| ExecutionType::from_xml(&v))
                        .unwrap_or_default(),
                };
                (source_number, parsed)
            })
            .collect();

        // Stable sort keeps document order for equal or missing numbers.
        if numbered.iter().all(|(n, _)| n.is_some()) {
            numbered.sort_by_key(|(n, _)| *n);
        }

        return numbered
            .into_iter()
            .enumerate()
            .map(|(index, (_, mut step))| {
                step.step_number = index as u32 + 1;
                step
            })
            .collect();
    }

    let actions = steps_element.map(XmlElement::value).unwrap_or_default();
    let expected = case.child_text("expectedresults");
    if actions.is_empty() && expected.is_empty() {
        return Vec::new();
    }
    vec![ParsedStep::new(1, actions, expected)]
}

fn parse_custom_fields(case: &XmlElement) -> Vec<CustomField> {
    case.child("custom_fields")
        .map(|fields| {
            fields
                .children_named("custom_field")
                .map(|field| CustomField {
                    name: field.field("name").unwrap_or_default(),
                    value: field.child_text("value"),
                })
                .filter(|field| !field.name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_keywords(case: &XmlElement) -> Vec<Keyword> {
    case.child("keywords")
        .map(|keywords| {
            keywords
                .children_named("keyword")
                .map(|keyword| Keyword {
                    name: keyword.field("name").unwrap_or_default(),
                    notes: keyword.child_text("notes"),
                })
                .filter(|keyword| !keyword.name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_requirements(case: &XmlElement) -> Vec<Requirement> {
    case.child("requirements")
        .map(|requirements| {
            requirements
                .children_named("requirement")
                .map(|requirement| Requirement {
                    doc_id: requirement.field("doc_id").unwrap_or_default(),
                    title: requirement.child_text("title"),
                    spec_title: requirement.child_text("req_spec_title"),
                })
                .filter(|requirement| !requirement.doc_id.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
