//! Table DDL generation and live schema introspection.
//!
//! Every user table carries the identity column first:
//!
//! ```sql
//! CREATE TABLE "People" (
//!     "id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
//!     "name" TEXT,
//!     "age" INTEGER
//! )
//! ```
//!
//! `AUTOINCREMENT` guarantees that ids are never reused, even after the
//! newest record is deleted or the table is cleared.
//!
//! [`SchemaRegistry`] reads the physical schema back from the store on every
//! call. There is no cache to invalidate: the only schema changes are
//! create and drop, and those go through the same connection.

use contacts_core::{Column, DeclaredType, ID_COLUMN, TableSchema, validate_table_definition};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Result, StoreError};
use crate::query::CompiledStatement;

/// Double-quotes an identifier.
///
/// Callers pass only names that passed
/// [`validate_identifier`](contacts_core::validate_identifier) or came from
/// the live schema, so no escaping is needed.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{name}\"")
}

/// Generates the `CREATE TABLE` statement for a table definition.
///
/// # Errors
///
/// Returns [`StoreError::Identity`] if a column is named `id`, and
/// [`StoreError::InvalidArgument`] for invalid or duplicate names.
pub fn generate_create_table_sql(table: &str, columns: &[Column]) -> Result<CompiledStatement> {
    if let Some(err) = validate_table_definition(table, columns).into_iter().next() {
        return Err(err.into());
    }

    let mut defs = Vec::with_capacity(columns.len() + 1);
    defs.push(format!(
        "{} INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT",
        quote_ident(ID_COLUMN)
    ));
    defs.extend(
        columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.declared_type.as_sql())),
    );

    Ok(CompiledStatement::new(
        format!("CREATE TABLE {} ({})", quote_ident(table), defs.join(", ")),
        Vec::new(),
    ))
}

/// Generates the `DROP TABLE` statement for a table.
///
/// # Errors
///
/// Returns [`StoreError::InvalidArgument`] if the name is not a valid table name.
pub fn generate_drop_table_sql(table: &str) -> Result<CompiledStatement> {
    contacts_core::validate_table_name(table)?;
    Ok(CompiledStatement::new(
        format!("DROP TABLE {}", quote_ident(table)),
        Vec::new(),
    ))
}

/// Read-only view of the store's live table metadata.
///
/// Borrows the connection; construct one per operation.
pub struct SchemaRegistry<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaRegistry<'a> {
    /// Creates a registry over the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Resolves a table name to its stored spelling.
    ///
    /// Table names compare case-insensitively, as SQLite resolves them.
    fn canonical_name(&self, table: &str) -> Result<Option<String>> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name = ?1 COLLATE NOCASE LIMIT 1",
                params![table],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(name)
    }

    /// Checks whether a table exists.
    ///
    /// Never fails for a missing table, only for a failing connection.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.canonical_name(table)?.is_some())
    }

    /// Lists user tables by name, excluding SQLite's internal tables.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Returns the live schema of a table, identity column first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Schema`] if the table does not exist, lacks an
    /// `INTEGER` identity column, or declares a column type other than
    /// `TEXT` or `INTEGER`.
    pub fn columns(&self, table: &str) -> Result<TableSchema> {
        let Some(table) = self.canonical_name(table)? else {
            return Err(StoreError::Schema(format!("table '{table}' does not exist")));
        };

        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let rows = stmt
            .query_map(params![&table], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut columns = Vec::with_capacity(rows.len());
        let mut has_identity = false;
        for (name, declared) in rows {
            let declared_type: DeclaredType = declared.parse().map_err(|_| {
                StoreError::Schema(format!(
                    "column '{table}.{name}' has unsupported declared type '{declared}'"
                ))
            })?;
            if name == ID_COLUMN {
                if declared_type != DeclaredType::Integer {
                    return Err(StoreError::Schema(format!(
                        "identity column of table '{table}' is {declared_type}, expected INTEGER"
                    )));
                }
                has_identity = true;
            }
            columns.push(Column::new(name, declared_type));
        }

        if !has_identity {
            return Err(StoreError::Schema(format!(
                "table '{table}' has no '{ID_COLUMN}' column"
            )));
        }

        Ok(TableSchema::new(table, columns))
    }
}
