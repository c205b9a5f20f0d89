//! End-to-end import tests covering every strategy and the transactional commit

use testlink_core::import::{CaseAction, MergeStrategy, TestLinkImporter};
use testlink_core::import_log::{ImportStatus, get_import_log, list_import_logs};
use testlink_core::models::{ExecutionType, Importance, TESTLINK_IMPORT_SOURCE};
use testlink_core::store::repository;

use super::{SHOP_XML, setup};

fn count(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn fresh_import_stores_full_tree() {
    let (mut db, project_id) = setup();
    let summary = TestLinkImporter::new(db.connection_mut())
        .import_content(project_id, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap();

    assert_eq!(summary.imported_suites, 3);
    assert_eq!(summary.imported_cases, 2);
    assert_eq!(summary.statistics.max_depth, 3);
    assert!(summary.statistics.has_nested_suites);

    let conn = db.connection();
    let counts = repository::table_counts(conn).unwrap();
    assert_eq!(counts.suites, 3);
    assert_eq!(counts.cases, 2);
    assert_eq!(counts.steps, 3);
    assert_eq!(counts.keywords, 2);
    assert_eq!(counts.requirements, 1);
    assert_eq!(counts.custom_fields, 1);

    let card = repository::find_case_by_internal_id(conn, project_id, TESTLINK_IMPORT_SOURCE, "1001")
        .unwrap()
        .unwrap();
    assert_eq!(card.title, "Pay by card");
    assert_eq!(card.external_id.as_deref(), Some("SHOP-1"));
    assert_eq!(card.version, Some(2));
    assert_eq!(card.summary, "<p>Card payment succeeds</p>");
    assert_eq!(card.execution_type, ExecutionType::Automated);
    assert_eq!(card.importance, Importance::High);

    let suite = repository::get_suite(conn, card.test_suite_id).unwrap().unwrap();
    assert_eq!(suite.name, "Payment");

    let steps = repository::load_steps(conn, card.id).unwrap();
    assert_eq!(
        steps.iter().map(|s| s.step_number).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(steps[0].actions, "<p>Enter card number</p>");
}

#[test]
fn skip_duplicates_is_idempotent() {
    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    importer
        .import_content(project_id, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap();
    let second = importer
        .import_content(project_id, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap();

    assert_eq!(second.imported_cases, 0);
    assert_eq!(second.skipped_cases, 2);
    assert!(second.case_outcomes.iter().all(|o| o.action == CaseAction::Skipped));

    // Suites are inserted on every run; case-level rows are not.
    let counts = repository::table_counts(db.connection()).unwrap();
    assert_eq!(counts.cases, 2);
    assert_eq!(counts.steps, 3);
    assert_eq!(counts.keywords, 2);
    assert_eq!(counts.requirements, 1);
    assert_eq!(counts.custom_fields, 1);
}

#[test]
fn update_existing_is_idempotent() {
    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    importer
        .import_content(project_id, SHOP_XML, MergeStrategy::UpdateExisting)
        .unwrap();
    let second = importer
        .import_content(project_id, SHOP_XML, MergeStrategy::UpdateExisting)
        .unwrap();
    assert_eq!(second.updated_cases, 2);
    assert_eq!(second.imported_cases, 0);

    let conn = db.connection();
    let counts = repository::table_counts(conn).unwrap();
    assert_eq!(counts.cases, 2);
    assert_eq!(counts.steps, 3);
    assert_eq!(counts.keywords, 2);

    let card = repository::find_case_by_internal_id(conn, project_id, TESTLINK_IMPORT_SOURCE, "1001")
        .unwrap()
        .unwrap();
    assert_eq!(card.summary, "<p>Card payment succeeds</p>");
    assert_eq!(repository::load_steps(conn, card.id).unwrap().len(), 2);
}

#[test]
fn update_existing_counts_new_and_existing_cases() {
    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    importer
        .import_content(
            project_id,
            r#"<testsuite name="S"><testcase internalid="A" name="first"/></testsuite>"#,
            MergeStrategy::SkipDuplicates,
        )
        .unwrap();

    let summary = importer
        .import_content(
            project_id,
            r#"<testsuite name="S">
                 <testcase internalid="A" name="first renamed"/>
                 <testcase internalid="B" name="second"/>
               </testsuite>"#,
            MergeStrategy::UpdateExisting,
        )
        .unwrap();

    assert_eq!(summary.imported_cases, 1);
    assert_eq!(summary.updated_cases, 1);
    assert_eq!(summary.skipped_cases, 0);

    let renamed = repository::find_case_by_internal_id(
        db.connection(),
        project_id,
        TESTLINK_IMPORT_SOURCE,
        "A",
    )
    .unwrap()
    .unwrap();
    assert_eq!(renamed.title, "first renamed");
}

#[test]
fn merge_data_keeps_existing_summary_when_incoming_is_empty() {
    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    importer
        .import_content(
            project_id,
            r#"<testsuite name="S"><testcase internalid="M1" name="old">
                 <summary><![CDATA[Original summary]]></summary>
                 <preconditions><![CDATA[Logged in]]></preconditions>
               </testcase></testsuite>"#,
            MergeStrategy::SkipDuplicates,
        )
        .unwrap();

    let summary = importer
        .import_content(
            project_id,
            r#"<testsuite name="S"><testcase internalid="M1" name="new">
                 <summary></summary>
                 <preconditions><![CDATA[Logged out]]></preconditions>
               </testcase></testsuite>"#,
            MergeStrategy::MergeData,
        )
        .unwrap();
    assert_eq!(summary.updated_cases, 1);

    let merged = repository::find_case_by_internal_id(
        db.connection(),
        project_id,
        TESTLINK_IMPORT_SOURCE,
        "M1",
    )
    .unwrap()
    .unwrap();
    assert_eq!(merged.title, "new");
    assert_eq!(merged.summary, "Original summary");
    assert_eq!(merged.preconditions, "Logged out");
}

#[test]
fn merge_data_keeps_fields_the_source_omits() {
    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    importer
        .import_content(project_id, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap();

    importer
        .import_content(
            project_id,
            r#"<testsuite name="Payment"><testcase internalid="1001" name="Pay by card">
                 <summary><![CDATA[Card payment, new wording]]></summary>
                 <active>0</active>
               </testcase></testsuite>"#,
            MergeStrategy::MergeData,
        )
        .unwrap();

    let card = repository::find_case_by_internal_id(
        db.connection(),
        project_id,
        TESTLINK_IMPORT_SOURCE,
        "1001",
    )
    .unwrap()
    .unwrap();
    assert_eq!(card.summary, "Card payment, new wording");
    assert_eq!(card.importance, Importance::High);
    assert_eq!(card.execution_type, ExecutionType::Automated);
    assert!(card.is_open);
    assert!(!card.active);
}

#[test]
fn create_new_always_inserts_copies() {
    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    importer
        .import_content(project_id, SHOP_XML, MergeStrategy::CreateNew)
        .unwrap();
    let second = importer
        .import_content(project_id, SHOP_XML, MergeStrategy::CreateNew)
        .unwrap();

    assert_eq!(second.imported_cases, 2);
    for outcome in &second.case_outcomes {
        assert_eq!(outcome.action, CaseAction::Created);
        let (base, suffix) = outcome.internal_id.split_once('-').unwrap();
        assert!(base == "1001" || base == "1002");
        assert_eq!(suffix.len(), 8);
    }
    assert_eq!(repository::table_counts(db.connection()).unwrap().cases, 4);
}

#[test]
fn failed_commit_rolls_back_every_row() {
    let (mut db, project_id) = setup();
    db.connection().execute_batch("DROP TABLE test_steps").unwrap();

    let result = TestLinkImporter::new(db.connection_mut()).import_content(
        project_id,
        SHOP_XML,
        MergeStrategy::SkipDuplicates,
    );
    assert!(result.is_err());

    let conn = db.connection();
    assert_eq!(count(conn, "test_suites"), 0);
    assert_eq!(count(conn, "test_cases"), 0);

    let logs = list_import_logs(conn, project_id).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, ImportStatus::Failed);
    assert!(!logs[0].errors.is_empty());
    assert!(logs[0].completed_at.is_some());
}

#[test]
fn validation_failure_marks_log_failed_without_writes() {
    let (mut db, project_id) = setup();
    let err = TestLinkImporter::new(db.connection_mut())
        .import_content(
            project_id,
            r#"<testsuite name="Root">
                 <testsuite name=""><testcase internalid="1" name=""/></testsuite>
               </testsuite>"#,
            MergeStrategy::SkipDuplicates,
        )
        .unwrap_err();

    let messages = err.messages();
    assert_eq!(
        messages,
        vec![
            "Test suite 1: Name is required".to_string(),
            "Test suite 1: Test case 1: Name is required".to_string(),
        ]
    );

    let conn = db.connection();
    assert_eq!(count(conn, "test_suites"), 0);
    let log = &list_import_logs(conn, project_id).unwrap()[0];
    assert_eq!(log.status, ImportStatus::Failed);
    assert_eq!(log.errors, messages);
    // Statistics are recorded before validation runs.
    assert_eq!(log.total_suites, 2);
    assert_eq!(log.total_cases, 1);
}

#[test]
fn preview_reports_duplicates_and_suggests_strategy() {
    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    let before = importer.preview_content(project_id, SHOP_XML).unwrap();
    assert_eq!(before.duplicates.summary.duplicate_test_cases, 0);
    assert_eq!(before.recommendation.suggested_strategy, MergeStrategy::CreateNew);

    importer
        .import_content(project_id, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap();
    let after = importer.preview_content(project_id, SHOP_XML).unwrap();
    assert_eq!(after.duplicates.summary.duplicate_test_cases, 2);
    assert_eq!(after.duplicates.summary.duplicate_test_suites, 3);
    // Every incoming case exists already.
    assert_eq!(
        after.recommendation.suggested_strategy,
        MergeStrategy::UpdateExisting
    );
    let card = after
        .duplicates
        .test_cases
        .iter()
        .find(|d| d.internal_id == "1001")
        .unwrap();
    assert_eq!(card.suite_path, "Shop > Checkout > Payment");
}

#[test]
fn import_file_records_file_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.xml");
    std::fs::write(&path, SHOP_XML).unwrap();

    let (mut db, project_id) = setup();
    let summary = TestLinkImporter::new(db.connection_mut())
        .import_file(&testlink_core::import::ImportRequest::new(
            project_id,
            &path,
            MergeStrategy::SkipDuplicates,
        ))
        .unwrap();

    let log = get_import_log(db.connection(), summary.import_log_id)
        .unwrap()
        .unwrap();
    assert_eq!(log.file_name, "shop.xml");
    assert_eq!(log.file_size, SHOP_XML.len() as i64);
    assert_eq!(log.file_path.as_deref(), Some(path.as_path()));
    assert_eq!(log.strategy, Some(MergeStrategy::SkipDuplicates));
    assert_eq!(log.status, ImportStatus::Completed);
}

#[test]
fn testcases_root_is_wrapped_in_synthetic_suite() {
    let (mut db, project_id) = setup();
    let summary = TestLinkImporter::new(db.connection_mut())
        .import_content(
            project_id,
            r#"<testcases>
                 <testcase internalid="L1" name="loose one"/>
                 <testcase internalid="L2" name="loose two"/>
               </testcases>"#,
            MergeStrategy::SkipDuplicates,
        )
        .unwrap();
    assert_eq!(summary.imported_suites, 1);
    assert_eq!(summary.imported_cases, 2);
    assert_eq!(summary.statistics.max_depth, 1);
}
