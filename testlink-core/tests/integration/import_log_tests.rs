//! Import log lifecycle: retry window, retry linkage and file cleanup

use chrono::{Duration, Utc};
use testlink_core::error::ImportError;
use testlink_core::import::{ImportOptions, ImportRequest, MergeStrategy, TestLinkImporter};
use testlink_core::import_log::{
    ImportStatus, cleanup_expired_files, get_import_log, is_retry_allowed, list_import_logs,
};
use testlink_core::store::repository;

use super::{SHOP_XML, setup};

const BROKEN_XML: &str = r#"<testsuite name="Shop"><testcase name="no id"/></testsuite>"#;

#[test]
fn failed_import_can_be_retried_after_fixing_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.xml");
    std::fs::write(&path, BROKEN_XML).unwrap();

    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    let err = importer
        .import_file(&ImportRequest::new(project_id, &path, MergeStrategy::UpdateExisting))
        .unwrap_err();
    assert!(matches!(err, ImportError::Validation(_)));

    std::fs::write(&path, SHOP_XML).unwrap();
    let summary = importer.retry_import(1, None).unwrap();
    assert_eq!(summary.imported_cases, 2);
    assert_eq!(summary.strategy, MergeStrategy::UpdateExisting);

    let conn = db.connection();
    let logs = list_import_logs(conn, project_id).unwrap();
    assert_eq!(logs.len(), 2);
    // Newest first.
    assert_eq!(logs[0].status, ImportStatus::Completed);
    assert_eq!(logs[0].retry_of, Some(logs[1].id));
    assert_eq!(logs[1].status, ImportStatus::Failed);
    assert!(!is_retry_allowed(conn, logs[0].id).unwrap());
    // The successful retry closes the original attempt.
    assert!(!is_retry_allowed(conn, logs[1].id).unwrap());
}

#[test]
fn successful_retry_cannot_be_repeated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.xml");
    std::fs::write(&path, BROKEN_XML).unwrap();

    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    let _ = importer.import_file(&ImportRequest::new(project_id, &path, MergeStrategy::CreateNew));

    std::fs::write(&path, SHOP_XML).unwrap();
    let first = importer.retry_import(1, None).unwrap();
    assert_eq!(first.imported_cases, 2);

    let err = importer.retry_import(1, None).unwrap_err();
    match err {
        ImportError::RetryNotAllowed { log_id, reason } => {
            assert_eq!(log_id, 1);
            assert_eq!(
                reason,
                format!("already retried by import {} (completed)", first.import_log_id)
            );
        }
        other => panic!("unexpected error: {other}"),
    }

    let conn = db.connection();
    assert_eq!(repository::table_counts(conn).unwrap().cases, 2);
    assert_eq!(list_import_logs(conn, project_id).unwrap().len(), 2);
}

#[test]
fn failed_retry_keeps_its_file_past_the_original_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.xml");
    std::fs::write(&path, BROKEN_XML).unwrap();

    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    let _ = importer.import_file(&ImportRequest::new(project_id, &path, MergeStrategy::SkipDuplicates));
    let err = importer.retry_import(1, None).unwrap_err();
    assert!(matches!(err, ImportError::Validation(_)));

    let now = Utc::now();
    db.connection()
        .execute(
            "UPDATE import_logs SET retry_until = ?1 WHERE id = 1",
            [now - Duration::hours(1)],
        )
        .unwrap();

    let report = cleanup_expired_files(db.connection(), now).unwrap();
    assert!(report.cleaned.is_empty());
    assert!(path.exists());
    assert!(is_retry_allowed(db.connection(), 2).unwrap());

    std::fs::write(&path, SHOP_XML).unwrap();
    let summary = TestLinkImporter::new(db.connection_mut())
        .retry_import(2, None)
        .unwrap();
    assert_eq!(summary.imported_cases, 2);
    assert_eq!(
        list_import_logs(db.connection(), project_id).unwrap()[0].retry_of,
        Some(2)
    );
}

#[test]
fn retry_can_override_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.xml");
    std::fs::write(&path, BROKEN_XML).unwrap();

    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());
    let _ = importer.import_file(&ImportRequest::new(project_id, &path, MergeStrategy::SkipDuplicates));

    std::fs::write(&path, SHOP_XML).unwrap();
    let summary = importer
        .retry_import(1, Some(MergeStrategy::CreateNew))
        .unwrap();
    assert_eq!(summary.strategy, MergeStrategy::CreateNew);
}

#[test]
fn retry_is_refused_after_window_expires() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.xml");
    std::fs::write(&path, BROKEN_XML).unwrap();

    let (mut db, project_id) = setup();
    let options = ImportOptions {
        retry_window: Duration::zero(),
        ..ImportOptions::default()
    };
    let mut importer = TestLinkImporter::with_options(db.connection_mut(), options);
    let _ = importer.import_file(&ImportRequest::new(project_id, &path, MergeStrategy::SkipDuplicates));

    let err = importer.retry_import(1, None).unwrap_err();
    match err {
        ImportError::RetryNotAllowed { log_id, reason } => {
            assert_eq!(log_id, 1);
            assert!(reason.contains("retry window expired"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!is_retry_allowed(db.connection(), 1).unwrap());
}

#[test]
fn retry_rules_for_other_logs() {
    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());

    assert!(matches!(
        importer.retry_import(99, None),
        Err(ImportError::LogNotFound(99))
    ));

    // Inline imports keep no file to retry from.
    let _ = importer.import_content(project_id, BROKEN_XML, MergeStrategy::SkipDuplicates);
    let err = importer.retry_import(1, None).unwrap_err();
    assert!(err.to_string().contains("no source file was retained"));

    let summary = importer
        .import_content(project_id, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap();
    let err = importer.retry_import(summary.import_log_id, None).unwrap_err();
    assert!(err.to_string().contains("import status is completed"));
}

#[test]
fn missing_file_and_project_create_no_log() {
    let (mut db, project_id) = setup();
    let mut importer = TestLinkImporter::new(db.connection_mut());

    let err = importer
        .import_file(&ImportRequest::new(
            project_id,
            "/nonexistent/upload.xml",
            MergeStrategy::SkipDuplicates,
        ))
        .unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound(_)));

    let err = importer
        .import_content(project_id + 1, SHOP_XML, MergeStrategy::SkipDuplicates)
        .unwrap_err();
    assert!(matches!(err, ImportError::ProjectNotFound(_)));

    assert!(list_import_logs(db.connection(), project_id).unwrap().is_empty());
}

#[test]
fn cleanup_removes_files_of_expired_imports() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.xml");
    std::fs::write(&path, SHOP_XML).unwrap();

    let (mut db, project_id) = setup();
    let summary = TestLinkImporter::new(db.connection_mut())
        .import_file(&ImportRequest::new(project_id, &path, MergeStrategy::SkipDuplicates))
        .unwrap();

    let conn = db.connection();
    let now = Utc::now();
    let early = cleanup_expired_files(conn, now).unwrap();
    assert!(early.cleaned.is_empty());
    assert!(path.exists());

    let later = cleanup_expired_files(conn, now + Duration::hours(49)).unwrap();
    assert_eq!(later.cleaned, vec![summary.import_log_id]);
    assert!(!path.exists());
    assert!(
        get_import_log(conn, summary.import_log_id)
            .unwrap()
            .unwrap()
            .cleanup_scheduled
    );
}
