//! Relational store used by the importer and exporter.
//!
//! The core talks to SQLite through `rusqlite`. [`Database`] owns the
//! connection and the schema bootstrap; the free functions in
//! [`repository`] take a plain `&rusqlite::Connection`, so the same code runs
//! inside an import transaction (a `Transaction` derefs to `Connection`) or
//! against the bare connection for previews and exports.

pub mod repository;
mod schema;

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::PersistenceResult;
use crate::models::Project;

pub use repository::{CaseRow, NewSuite, TableCounts};
pub use schema::SCHEMA_SQL;

/// Handle on the SQLite database holding projects, suites, cases and logs.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) a database file and bootstraps the schema
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema fails.
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            // Best effort; `Connection::open` reports the real failure.
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database with the schema applied
    ///
    /// # Errors
    ///
    /// Returns an error if the schema fails to apply.
    pub fn open_in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wraps an existing connection and bootstraps the schema
    ///
    /// # Errors
    ///
    /// Returns an error if the schema fails to apply.
    pub fn from_connection(conn: Connection) -> PersistenceResult<Self> {
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Creates missing tables and indexes
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub fn init_schema(&self) -> PersistenceResult<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Shared access to the underlying connection
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Exclusive access, needed to open a transaction
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Inserts a project and returns it
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> PersistenceResult<Project> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO projects (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![name, description, created_at],
        )?;
        Ok(Project {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at,
        })
    }

    /// Looks up a project by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_project(&self, id: i64) -> PersistenceResult<Option<Project>> {
        get_project(&self.conn, id)
    }

    /// Lists every project ordered by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_projects(&self) -> PersistenceResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, created_at FROM projects ORDER BY id")?;
        let rows = stmt.query_map([], project_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Looks up a project by id on any connection or transaction
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_project(conn: &Connection, id: i64) -> PersistenceResult<Option<Project>> {
    Ok(conn
        .query_row(
            "SELECT id, name, description, created_at FROM projects WHERE id = ?1",
            [id],
            project_from_row,
        )
        .optional()?)
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
    })
}
