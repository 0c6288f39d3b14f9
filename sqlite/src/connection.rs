//! Ownership of the single SQLite connection.
//!
//! [`ConnectionHandle`] opens (or creates) the backing file or an in-memory
//! database and runs [`CompiledStatement`]s against it. Every mutating
//! statement runs inside its own transaction and is committed before the
//! call returns.

use std::fs;
use std::path::Path;

use contacts_core::Value;
use rusqlite::{Connection, params_from_iter};
use tracing::{debug, info};

use crate::convert::{BoundValue, read_value};
use crate::error::{Result, StoreError};
use crate::query::CompiledStatement;

/// Location string that selects an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// The store's connection to SQLite.
///
/// Acquired once and released exactly once, either explicitly through
/// [`close`](Self::close) or when dropped.
#[derive(Debug)]
pub struct ConnectionHandle {
    conn: Connection,
    location: String,
}

impl ConnectionHandle {
    /// Opens the database at `path`, creating the file and any missing
    /// parent directories. The path `:memory:` opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the directory cannot be created
    /// or SQLite cannot open the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new(IN_MEMORY) {
            return Self::open_in_memory();
        }

        let location = path.display().to_string();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Connection {
                    path: location.clone(),
                    message: format!("cannot create directory '{}': {e}", parent.display()),
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|e| StoreError::Connection {
            path: location.clone(),
            message: e.to_string(),
        })?;
        info!(path = %location, "opened record store");
        Ok(Self { conn, location })
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Connection {
            path: IN_MEMORY.to_string(),
            message: e.to_string(),
        })?;
        debug!("opened in-memory record store");
        Ok(Self {
            conn,
            location: IN_MEMORY.to_string(),
        })
    }

    /// Returns the path the handle was opened with, or `:memory:`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the underlying connection for read-only introspection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Executes a mutating statement and commits it.
    ///
    /// Returns the number of rows changed.
    pub fn execute(&mut self, stmt: &CompiledStatement) -> Result<usize> {
        debug!(sql = stmt.sql(), params = stmt.params().len(), "execute");
        let tx = self.conn.transaction()?;
        let changed = tx.execute(stmt.sql(), params_from_iter(stmt.params().iter().map(BoundValue)))?;
        tx.commit()?;
        Ok(changed)
    }

    /// Executes an `INSERT`, commits it, and returns the new row's id.
    pub fn insert(&mut self, stmt: &CompiledStatement) -> Result<i64> {
        debug!(sql = stmt.sql(), params = stmt.params().len(), "insert");
        let tx = self.conn.transaction()?;
        tx.execute(stmt.sql(), params_from_iter(stmt.params().iter().map(BoundValue)))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    /// Runs a read and returns its rows, each cell `None` for SQL `NULL`.
    pub fn query(&self, stmt: &CompiledStatement) -> Result<Vec<Vec<Option<Value>>>> {
        debug!(sql = stmt.sql(), params = stmt.params().len(), "query");
        let mut prepared = self.conn.prepare(stmt.sql())?;
        let names: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = prepared.query(params_from_iter(stmt.params().iter().map(BoundValue)))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                cells.push(read_value(name, row.get_ref(i)?)?);
            }
            out.push(cells);
        }
        Ok(out)
    }

    /// Runs a single-value integer read such as `SELECT COUNT(*)`.
    pub fn query_count(&self, stmt: &CompiledStatement) -> Result<i64> {
        debug!(sql = stmt.sql(), params = stmt.params().len(), "query_count");
        let count = self.conn.query_row(
            stmt.sql(),
            params_from_iter(stmt.params().iter().map(BoundValue)),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Engine`] if SQLite refuses to close, e.g. with
    /// unfinalized statements outstanding.
    pub fn close(self) -> Result<()> {
        let location = self.location;
        self.conn.close().map_err(|(_, e)| StoreError::Engine(e))?;
        info!(path = %location, "closed record store");
        Ok(())
    }
}
