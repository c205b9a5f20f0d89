//! Export tests: stored rows back to XML, and XML back into a second project

use testlink_core::export::{ExportOptions, ExportScope, export_xml, validate_export};
use testlink_core::import::{MergeStrategy, TestLinkImporter, compute_statistics, parse_content};
use testlink_core::models::ParsedTestCase;
use testlink_core::store::repository;

use super::{SHOP_XML, setup};

fn find<'a>(cases: &[&'a ParsedTestCase], internal_id: &str) -> &'a ParsedTestCase {
    cases
        .iter()
        .copied()
        .find(|c| c.internal_id == internal_id)
        .unwrap()
}

#[test]
fn round_trip_preserves_cases() {
    let (mut db, project_id) = setup();
    TestLinkImporter::new(db.connection_mut())
        .import_content(project_id, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap();

    let output = export_xml(
        db.connection(),
        &ExportScope::Project(project_id),
        &ExportOptions::default(),
    )
    .unwrap();
    // "Item appears in cart" carries no markup, so it is written as plain text.
    assert_eq!(
        output.warnings,
        vec!["Test case 2 summary is not wrapped in CDATA".to_string()]
    );
    assert_eq!(output.suite_count, 3);
    assert_eq!(output.case_count, 2);

    let original = parse_content(SHOP_XML).unwrap();
    let exported = parse_content(&output.xml).unwrap();
    assert_eq!(exported.name, "Shop");
    assert_eq!(compute_statistics(&exported), compute_statistics(&original));

    let before = original.all_test_cases();
    let after = exported.all_test_cases();
    for id in ["1001", "1002"] {
        let a = find(&before, id);
        let b = find(&after, id);
        assert_eq!(a.name, b.name);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.steps.len(), b.steps.len());
        assert_eq!(a.keywords.len(), b.keywords.len());
        assert_eq!(a.custom_fields.len(), b.custom_fields.len());
        assert_eq!(a.requirements.len(), b.requirements.len());
    }

    let card = find(&after, "1001");
    assert_eq!(card.external_id.as_deref(), Some("SHOP-1"));
    assert_eq!(card.steps[1].expected_results, "Receipt shown");
    assert_eq!(card.keywords[0].notes, "run on every build");
    assert_eq!(card.requirements[0].doc_id, "REQ-PAY-1");
}

#[test]
fn exported_document_imports_into_another_project() {
    let (mut db, project_id) = setup();
    TestLinkImporter::new(db.connection_mut())
        .import_content(project_id, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap();
    let xml = export_xml(
        db.connection(),
        &ExportScope::Project(project_id),
        &ExportOptions::default(),
    )
    .unwrap()
    .xml;

    let other = db.create_project("Shop copy", None).unwrap();
    let summary = TestLinkImporter::new(db.connection_mut())
        .import_content(other.id, &xml, MergeStrategy::SkipDuplicates)
        .unwrap();
    assert_eq!(summary.imported_suites, 3);
    assert_eq!(summary.imported_cases, 2);

    let counts = repository::table_counts(db.connection()).unwrap();
    assert_eq!(counts.cases, 4);
    assert_eq!(counts.steps, 6);
}

#[test]
fn suite_scope_exports_subtree() {
    let (mut db, project_id) = setup();
    TestLinkImporter::new(db.connection_mut())
        .import_content(project_id, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap();
    let conn = db.connection();
    let checkout = repository::list_child_suites(conn, project_id, None).unwrap()[0].id;
    let checkout = repository::list_child_suites(conn, project_id, Some(checkout)).unwrap()[0].id;

    let output = export_xml(conn, &ExportScope::Suite(checkout), &ExportOptions::default()).unwrap();
    let tree = parse_content(&output.xml).unwrap();
    assert_eq!(tree.name, "Checkout");
    assert_eq!(compute_statistics(&tree).max_depth, 2);
    assert_eq!(output.case_count, 2);
}

#[test]
fn case_scope_uses_testcases_root_and_honors_options() {
    let (mut db, project_id) = setup();
    TestLinkImporter::new(db.connection_mut())
        .import_content(project_id, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap();

    let options = ExportOptions {
        include_keywords: false,
        include_requirements: false,
        include_custom_fields: false,
    };
    let output = export_xml(db.connection(), &ExportScope::TestCases(vec![1, 2]), &options).unwrap();

    assert!(output.xml.contains("<testcases>"));
    assert!(!output.xml.contains("<keywords>"));
    assert!(!output.xml.contains("<requirements>"));
    assert!(!output.xml.contains("<custom_fields>"));
    assert!(validate_export(&output.xml).is_valid());
    assert_eq!(output.suite_count, 0);
    assert_eq!(output.case_count, 2);
}
