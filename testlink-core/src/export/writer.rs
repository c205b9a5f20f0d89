//! Serializes an [`ExportDocument`] to TestLink XML.
//!
//! Element order is fixed so the same rows always produce the same bytes.
//! Inside a suite, child suites come before the suite's own cases.

use std::fmt::Write as _;

use quick_xml::escape::escape;

use super::builder::ExportDocument;
use crate::cdata::render_text;
use crate::models::{ParsedStep, ParsedSuiteNode, ParsedTestCase};

const INDENT: &str = "  ";

/// Renders the document, starting with a UTF-8 XML declaration.
#[must_use]
pub fn write_xml(document: &ExportDocument) -> String {
    let mut output = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    match document {
        ExportDocument::Suite(root) => write_suite_tree(&mut output, root),
        ExportDocument::TestCases(cases) => {
            output.push_str("<testcases>\n");
            for case in cases {
                write_case(&mut output, case, 1);
            }
            output.push_str("</testcases>\n");
        }
    }
    output
}

enum Frame<'a> {
    Open(&'a ParsedSuiteNode, usize),
    Close(&'a ParsedSuiteNode, usize),
}

fn write_suite_tree(output: &mut String, root: &ParsedSuiteNode) {
    let mut stack = vec![Frame::Open(root, 0)];
    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Open(suite, depth) => {
                let pad = INDENT.repeat(depth);
                let id = suite.id.as_deref().unwrap_or_default();
                let _ = writeln!(
                    output,
                    "{pad}<testsuite id=\"{}\" name=\"{}\">",
                    escape(id),
                    escape(suite.name.as_str())
                );
                if let Some(order) = suite.node_order {
                    write_field(output, depth + 1, "node_order", &order.to_string());
                }
                write_field(output, depth + 1, "details", &suite.details);

                stack.push(Frame::Close(suite, depth));
                for child in suite.children.iter().rev() {
                    stack.push(Frame::Open(child, depth + 1));
                }
            }
            Frame::Close(suite, depth) => {
                for case in &suite.test_cases {
                    write_case(output, case, depth + 1);
                }
                let _ = writeln!(output, "{}</testsuite>", INDENT.repeat(depth));
            }
        }
    }
}

fn write_case(output: &mut String, case: &ParsedTestCase, depth: usize) {
    let pad = INDENT.repeat(depth);
    let inner = depth + 1;
    let _ = writeln!(
        output,
        "{pad}<testcase internalid=\"{}\" name=\"{}\">",
        escape(case.internal_id.as_str()),
        escape(case.name.as_str())
    );

    if let Some(order) = case.node_order {
        write_field(output, inner, "node_order", &order.to_string());
    }
    if let Some(external_id) = &case.external_id {
        write_field(output, inner, "externalid", external_id);
    }
    if let Some(version) = case.version {
        write_field(output, inner, "version", &version.to_string());
    }
    write_field(output, inner, "summary", &case.summary);
    write_field(output, inner, "preconditions", &case.preconditions);
    write_field(
        output,
        inner,
        "execution_type",
        &case.execution_type.code().to_string(),
    );
    write_field(output, inner, "importance", &case.importance.level().to_string());
    if let Some(status) = case.status {
        write_field(output, inner, "status", &status.to_string());
    }
    write_field(output, inner, "is_open", flag(case.is_open));
    write_field(output, inner, "active", flag(case.active));

    write_steps(output, &case.steps, inner);

    if !case.keywords.is_empty() {
        let pad = INDENT.repeat(inner);
        let _ = writeln!(output, "{pad}<keywords>");
        for keyword in &case.keywords {
            let _ = writeln!(
                output,
                "{pad}{INDENT}<keyword name=\"{}\">",
                escape(keyword.name.as_str())
            );
            write_field(output, inner + 2, "notes", &keyword.notes);
            let _ = writeln!(output, "{pad}{INDENT}</keyword>");
        }
        let _ = writeln!(output, "{pad}</keywords>");
    }

    if !case.requirements.is_empty() {
        let pad = INDENT.repeat(inner);
        let _ = writeln!(output, "{pad}<requirements>");
        for requirement in &case.requirements {
            let _ = writeln!(output, "{pad}{INDENT}<requirement>");
            write_field(output, inner + 2, "req_spec_title", &requirement.spec_title);
            write_field(output, inner + 2, "doc_id", &requirement.doc_id);
            write_field(output, inner + 2, "title", &requirement.title);
            let _ = writeln!(output, "{pad}{INDENT}</requirement>");
        }
        let _ = writeln!(output, "{pad}</requirements>");
    }

    if !case.custom_fields.is_empty() {
        let pad = INDENT.repeat(inner);
        let _ = writeln!(output, "{pad}<custom_fields>");
        for field in &case.custom_fields {
            let _ = writeln!(output, "{pad}{INDENT}<custom_field>");
            write_field(output, inner + 2, "name", &field.name);
            write_field(output, inner + 2, "value", &field.value);
            let _ = writeln!(output, "{pad}{INDENT}</custom_field>");
        }
        let _ = writeln!(output, "{pad}</custom_fields>");
    }

    let _ = writeln!(output, "{pad}</testcase>");
}

fn write_steps(output: &mut String, steps: &[ParsedStep], depth: usize) {
    if steps.is_empty() {
        return;
    }
    let pad = INDENT.repeat(depth);
    let _ = writeln!(output, "{pad}<steps>");
    for step in steps {
        let _ = writeln!(output, "{pad}{INDENT}<step>");
        write_field(output, depth + 2, "step_number", &step.step_number.to_string());
        write_field(output, depth + 2, "actions", &step.actions);
        write_field(output, depth + 2, "expectedresults", &step.expected_results);
        write_field(
            output,
            depth + 2,
            "execution_type",
            &step.execution_type.code().to_string(),
        );
        let _ = writeln!(output, "{pad}{INDENT}</step>");
    }
    let _ = writeln!(output, "{pad}</steps>");
}

fn write_field(output: &mut String, depth: usize, tag: &str, value: &str) {
    let _ = writeln!(
        output,
        "{}<{tag}>{}</{tag}>",
        INDENT.repeat(depth),
        render_text(value)
    );
}

const fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
