//! Record CRUD façade.
//!
//! [`RecordStore`] owns the [`ConnectionHandle`] and runs every operation
//! the same way: resolve the live schema through [`SchemaRegistry`],
//! compile with the [`query`](crate::query) functions (which validate before
//! anything is sent), execute, and shape rows into [`Record`]s.
//!
//! A table is either absent or present. `create_table` and `drop_table`
//! move between the two; every record operation requires a present table
//! and fails with [`StoreError::TableNotFound`] otherwise.
//!
//! # Example
//!
//! ```
//! use contacts_core::{Column, Filter, FilterOp, FindRequest, RecordData, Value};
//! use contacts_sqlite::RecordStore;
//!
//! let mut store = RecordStore::open_in_memory().unwrap();
//! store
//!     .create_table("People", &[Column::text("name"), Column::integer("age")])
//!     .unwrap();
//!
//! let data = RecordData::from([
//!     ("name".to_string(), Value::from("Ann")),
//!     ("age".to_string(), Value::from(30)),
//! ]);
//! let id = store.insert("People", &data).unwrap();
//!
//! let found = store
//!     .find(
//!         "People",
//!         &FindRequest::new().filter(Filter::new("age", FilterOp::Equals, 30)),
//!     )
//!     .unwrap();
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].id(), Some(id));
//! ```

use std::path::Path;

use contacts_core::{
    Column, Filter, FilterOp, FindRequest, ID_COLUMN, Record, RecordData, TableSchema,
    validate_table_name,
};
use tracing::info;

use crate::connection::ConnectionHandle;
use crate::error::{Result, StoreError};
use crate::query::{
    compile_clear, compile_delete, compile_exists, compile_insert, compile_select, compile_update,
};
use crate::schema::{SchemaRegistry, generate_create_table_sql, generate_drop_table_sql};

/// Schema-aware record store over one SQLite database.
///
/// Single-writer and synchronous: each call runs to completion, including
/// its commit, before returning.
#[derive(Debug)]
pub struct RecordStore {
    conn: ConnectionHandle,
}

impl RecordStore {
    /// Wraps an open connection.
    pub fn new(conn: ConnectionHandle) -> Self {
        Self { conn }
    }

    /// Opens (or creates) the database at `path`. See [`ConnectionHandle::open`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        ConnectionHandle::open(path).map(Self::new)
    }

    /// Opens a fresh in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        ConnectionHandle::open_in_memory().map(Self::new)
    }

    /// Returns the connection handle.
    pub fn connection(&self) -> &ConnectionHandle {
        &self.conn
    }

    fn registry(&self) -> SchemaRegistry<'_> {
        SchemaRegistry::new(self.conn.connection())
    }

    /// Resolves the live schema of a table that must exist.
    fn existing_schema(&self, table: &str) -> Result<TableSchema> {
        validate_table_name(table)?;
        let registry = self.registry();
        if !registry.table_exists(table)? {
            return Err(StoreError::TableNotFound(table.to_string()));
        }
        registry.columns(table)
    }

    /// Creates a table with the given columns plus the identity column.
    ///
    /// # Errors
    ///
    /// - [`StoreError::TableAlreadyExists`] if the name is taken.
    /// - [`StoreError::Identity`] if a column is named `id`.
    /// - [`StoreError::InvalidArgument`] for invalid or duplicate names.
    pub fn create_table(&mut self, table: &str, columns: &[Column]) -> Result<()> {
        let stmt = generate_create_table_sql(table, columns)?;
        if self.registry().table_exists(table)? {
            return Err(StoreError::TableAlreadyExists(table.to_string()));
        }
        self.conn.execute(&stmt)?;
        info!(table, columns = columns.len(), "created table");
        Ok(())
    }

    /// Drops a table and every record in it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TableNotFound`] if the table does not exist.
    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        let stmt = generate_drop_table_sql(table)?;
        if !self.registry().table_exists(table)? {
            return Err(StoreError::TableNotFound(table.to_string()));
        }
        self.conn.execute(&stmt)?;
        info!(table, "dropped table");
        Ok(())
    }

    /// Checks whether a table exists.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        self.registry().table_exists(table)
    }

    /// Lists user tables by name.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.registry().list_tables()
    }

    /// Returns the live schema of a table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TableNotFound`] if the table does not exist.
    pub fn table_schema(&self, table: &str) -> Result<TableSchema> {
        self.existing_schema(table)
    }

    /// Inserts a record and returns its newly assigned id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::TableNotFound`] if the table does not exist.
    /// - [`StoreError::Identity`] if `data` names `id`.
    /// - [`StoreError::InvalidArgument`] for an unknown column.
    /// - [`StoreError::TypeMismatch`] for a value of the wrong type.
    pub fn insert(&mut self, table: &str, data: &RecordData) -> Result<i64> {
        let schema = self.existing_schema(table)?;
        let stmt = compile_insert(&schema, data)?;
        self.conn.insert(&stmt)
    }

    /// Finds records matching a request, ordered by id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::TableNotFound`] if the table does not exist.
    /// - [`StoreError::InvalidFilter`] for a filter on an unknown column or
    ///   with an operator that does not fit the column.
    /// - [`StoreError::TypeMismatch`] for a filter value of the wrong type.
    /// - [`StoreError::InvalidArgument`] for a bad projection.
    pub fn find(&self, table: &str, request: &FindRequest) -> Result<Vec<Record>> {
        let schema = self.existing_schema(table)?;
        let select = compile_select(&schema, request)?;
        let rows = self.conn.query(&select.statement)?;

        Ok(rows
            .into_iter()
            .map(|cells| {
                let mut record = Record::new();
                for (name, value) in select.columns.iter().zip(cells) {
                    record.push(name.as_str(), value);
                }
                record
            })
            .collect())
    }

    /// Loads one record by id with every column.
    pub fn get(&self, table: &str, id: i64) -> Result<Option<Record>> {
        let request = FindRequest::new().filter(Filter::new(ID_COLUMN, FilterOp::Equals, id));
        Ok(self.find(table, &request)?.into_iter().next())
    }

    /// Updates the named columns of one record, leaving the rest untouched.
    ///
    /// Returns `false` without writing if no record has that id.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert), plus [`StoreError::InvalidArgument`]
    /// for an empty payload.
    pub fn update(&mut self, table: &str, id: i64, data: &RecordData) -> Result<bool> {
        let schema = self.existing_schema(table)?;
        let stmt = compile_update(&schema, id, data)?;
        if self.conn.query_count(&compile_exists(&schema.name, id))? == 0 {
            return Ok(false);
        }
        Ok(self.conn.execute(&stmt)? > 0)
    }

    /// Deletes records by id and returns how many were removed.
    ///
    /// Ids with no record are skipped silently, so deleting the same id
    /// twice succeeds both times.
    ///
    /// # Errors
    ///
    /// - [`StoreError::TableNotFound`] if the table does not exist.
    /// - [`StoreError::InvalidArgument`] if `ids` is empty.
    pub fn delete(&mut self, table: &str, ids: &[i64]) -> Result<usize> {
        let schema = self.existing_schema(table)?;
        let stmt = compile_delete(&schema.name, ids)?;
        self.conn.execute(&stmt)
    }

    /// Deletes every record in a table and returns how many were removed.
    ///
    /// Ids are not reused afterwards.
    pub fn clear(&mut self, table: &str) -> Result<usize> {
        let schema = self.existing_schema(table)?;
        self.conn.execute(&compile_clear(&schema.name))
    }

    /// Releases the connection.
    pub fn close(self) -> Result<()> {
        self.conn.close()
    }
}
