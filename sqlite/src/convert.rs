//! Value coercion between [`Value`] and SQLite.
//!
//! Writing: [`check_value`] is the single point where a supplied value is
//! checked against its column's declared type. Values that pass are bound
//! as statement parameters through [`BoundValue`]; they never appear in SQL
//! text.
//!
//! Reading: [`read_value`] maps a cell back into a [`Value`], with SQL
//! `NULL` becoming `None`.

use contacts_core::{Column, Value};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};

use crate::error::{Result, StoreError};

/// Checks that `value` may be stored in (or compared against) `column`.
///
/// # Errors
///
/// Returns [`StoreError::TypeMismatch`] naming the table, the column, both
/// types, and the offending value.
pub fn check_value(table: &str, column: &Column, value: &Value) -> Result<()> {
    let found = value.declared_type();
    if found != column.declared_type {
        return Err(StoreError::TypeMismatch {
            table: table.to_string(),
            column: column.name.clone(),
            expected: column.declared_type,
            found,
            value: match value {
                Value::Text(s) => format!("{s:?}"),
                Value::Integer(n) => n.to_string(),
            },
        });
    }
    Ok(())
}

/// Borrowing [`ToSql`] adapter for a [`Value`].
pub(crate) struct BoundValue<'a>(pub(crate) &'a Value);

impl ToSql for BoundValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Integer(n) => ToSqlOutput::from(*n),
        })
    }
}

/// Converts a cell read from the store.
///
/// # Errors
///
/// Returns [`StoreError::Schema`] for `REAL` or `BLOB` cells and for text
/// that is not valid UTF-8; neither can be written through this crate.
pub(crate) fn read_value(column: &str, cell: ValueRef<'_>) -> Result<Option<Value>> {
    match cell {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(n) => Ok(Some(Value::Integer(n))),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Some(Value::Text(s.to_string())))
            .map_err(|_| StoreError::Schema(format!("column '{column}' holds invalid UTF-8 text"))),
        ValueRef::Real(_) => Err(StoreError::Schema(format!(
            "column '{column}' holds a REAL value, which is neither TEXT nor INTEGER"
        ))),
        ValueRef::Blob(_) => Err(StoreError::Schema(format!(
            "column '{column}' holds a BLOB value, which is neither TEXT nor INTEGER"
        ))),
    }
}
