//! Identifier and table definition validation.
//!
//! Table and column names are spliced into SQL text as identifiers (values
//! are always bound), so every name must match `^[A-Za-z0-9_]+$` before it
//! gets anywhere near a statement.
//!
//! # Examples
//!
//! ```
//! use contacts_core::*;
//!
//! let columns = vec![Column::text("name"), Column::integer("age")];
//! assert!(validate_table_definition("People", &columns).is_empty());
//!
//! // The identity column is implicit and cannot be declared.
//! let columns = vec![Column::integer("id")];
//! let errors = validate_table_definition("People", &columns);
//! assert!(errors.iter().any(|e| matches!(e, ValidationError::ReservedColumn(_))));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Column, ID_COLUMN};

/// Prefix of engine-internal table names.
const RESERVED_TABLE_PREFIX: &str = "sqlite_";

/// Identifier and table definition errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Identifier is empty.
    #[error("identifier cannot be empty")]
    EmptyIdentifier,
    /// Identifier contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid identifier '{0}': must contain only ASCII letters, digits and underscores")]
    InvalidIdentifier(String),
    /// Table name collides with the engine's internal namespace.
    #[error("table name '{0}' is reserved")]
    ReservedTableName(String),
    /// Column name collides with the identity column.
    #[error("column '{0}' is reserved for the identity column")]
    ReservedColumn(String),
    /// Two columns in the same definition share a name.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
}

/// Checks that a name matches `^[A-Za-z0-9_]+$`.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyIdentifier);
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Checks a table name: a valid identifier outside the `sqlite_` namespace.
pub fn validate_table_name(name: &str) -> Result<(), ValidationError> {
    validate_identifier(name)?;
    if name.to_ascii_lowercase().starts_with(RESERVED_TABLE_PREFIX) {
        return Err(ValidationError::ReservedTableName(name.to_string()));
    }
    Ok(())
}

/// Validates a table definition before creation.
///
/// Checks the table name, every column name, duplicate columns, and that
/// no column shadows the identity column. A definition with no user columns
/// is valid; such a table only carries `id`.
pub fn validate_table_definition(table: &str, columns: &[Column]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(err) = validate_table_name(table) {
        errors.push(err);
        return errors;
    }

    // SQLite identifiers are case-insensitive, so "Name" and "name" collide.
    let mut seen: HashSet<String> = HashSet::new();
    for column in columns {
        if let Err(err) = validate_identifier(&column.name) {
            errors.push(err);
            continue;
        }
        if column.name.eq_ignore_ascii_case(ID_COLUMN) {
            errors.push(ValidationError::ReservedColumn(column.name.clone()));
            continue;
        }
        if !seen.insert(column.name.to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateColumn(column.name.clone()));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("People").is_ok());
        assert!(validate_identifier("phone_number").is_ok());
        assert!(validate_identifier("T2").is_ok());
        assert!(validate_identifier("_").is_ok());
    }

    #[test]
    fn test_invalid_identifiers() {
        assert_eq!(validate_identifier(""), Err(ValidationError::EmptyIdentifier));
        assert!(validate_identifier("drop;--").is_err());
        assert!(validate_identifier("hello world").is_err());
        assert!(validate_identifier("a-b").is_err());
        assert!(validate_identifier("\"quoted\"").is_err());
        assert!(validate_identifier("naïve").is_err());
    }

    #[test]
    fn test_reserved_table_prefix() {
        assert!(matches!(
            validate_table_name("sqlite_sequence"),
            Err(ValidationError::ReservedTableName(_))
        ));
        assert!(matches!(
            validate_table_name("SQLITE_master"),
            Err(ValidationError::ReservedTableName(_))
        ));
        assert!(validate_table_name("sqlitefans").is_ok());
    }

    #[test]
    fn test_duplicate_columns_case_insensitive() {
        let columns = vec![Column::text("name"), Column::integer("Name")];
        let errors = validate_table_definition("People", &columns);
        assert_eq!(errors, vec![ValidationError::DuplicateColumn("Name".into())]);
    }

    #[test]
    fn test_identity_column_cannot_be_declared() {
        for name in ["id", "ID", "Id"] {
            let errors = validate_table_definition("People", &[Column::text(name)]);
            assert_eq!(errors, vec![ValidationError::ReservedColumn(name.into())]);
        }
    }

    #[test]
    fn test_bad_table_name_short_circuits() {
        let errors = validate_table_definition("bad name", &[Column::text("also bad")]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_empty_column_list_is_valid() {
        assert!(validate_table_definition("Empty", &[]).is_empty());
    }
}
