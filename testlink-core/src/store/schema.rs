//! Minimal schema bootstrap for the tables the core reads and writes.

/// Statements creating every table and index. Idempotent.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS test_suites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    parent_suite_id INTEGER REFERENCES test_suites(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    node_order INTEGER NOT NULL DEFAULT 0,
    external_id TEXT,
    import_source TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_test_suites_name
    ON test_suites(project_id, name, import_source);
CREATE INDEX IF NOT EXISTS idx_test_suites_parent
    ON test_suites(project_id, parent_suite_id);

CREATE TABLE IF NOT EXISTS test_cases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    test_suite_id INTEGER NOT NULL REFERENCES test_suites(id) ON DELETE CASCADE,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    internal_id TEXT,
    external_id TEXT,
    title TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    preconditions TEXT NOT NULL DEFAULT '',
    execution_type INTEGER NOT NULL DEFAULT 1,
    importance INTEGER NOT NULL DEFAULT 2,
    status INTEGER,
    version INTEGER,
    is_open INTEGER NOT NULL DEFAULT 1,
    active INTEGER NOT NULL DEFAULT 1,
    node_order INTEGER NOT NULL DEFAULT 0,
    import_source TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_test_cases_dedup
    ON test_cases(project_id, import_source, internal_id)
    WHERE internal_id IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_test_cases_suite
    ON test_cases(test_suite_id);

CREATE TABLE IF NOT EXISTS test_steps (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    test_case_id INTEGER NOT NULL REFERENCES test_cases(id) ON DELETE CASCADE,
    step_number INTEGER NOT NULL,
    actions TEXT NOT NULL DEFAULT '',
    expected_results TEXT NOT NULL DEFAULT '',
    execution_type INTEGER NOT NULL DEFAULT 1,
    UNIQUE (test_case_id, step_number)
);

CREATE TABLE IF NOT EXISTS custom_fields (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    test_case_id INTEGER NOT NULL REFERENCES test_cases(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    value TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS test_case_keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    test_case_id INTEGER NOT NULL REFERENCES test_cases(id) ON DELETE CASCADE,
    keyword TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS test_case_requirements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    test_case_id INTEGER NOT NULL REFERENCES test_cases(id) ON DELETE CASCADE,
    doc_id TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    spec_title TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS import_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    document_id INTEGER,
    file_name TEXT NOT NULL,
    file_size INTEGER NOT NULL DEFAULT 0,
    file_path TEXT,
    status TEXT NOT NULL CHECK (status IN ('processing', 'completed', 'failed')),
    strategy TEXT,
    retry_until TEXT NOT NULL,
    retry_of INTEGER REFERENCES import_logs(id),
    total_suites INTEGER NOT NULL DEFAULT 0,
    total_cases INTEGER NOT NULL DEFAULT 0,
    max_depth INTEGER NOT NULL DEFAULT 0,
    imported_suites INTEGER NOT NULL DEFAULT 0,
    imported_cases INTEGER NOT NULL DEFAULT 0,
    updated_cases INTEGER NOT NULL DEFAULT 0,
    skipped_cases INTEGER NOT NULL DEFAULT 0,
    errors TEXT NOT NULL DEFAULT '[]',
    cleanup_scheduled INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_import_logs_project
    ON import_logs(project_id, created_at);
";
