//! Error types for record store operations.
//!
//! Every failure names the offending table, column, or value. Validation
//! failures are raised before any statement reaches the engine; only
//! [`StoreError::Engine`] and [`StoreError::Connection`] originate in SQLite.

use contacts_core::{DeclaredType, ParseError, ValidationError};
use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced table does not exist during introspection, or its physical
    /// schema cannot be represented.
    #[error("schema error: {0}")]
    Schema(String),

    /// Record operation attempted on a table that does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// `create_table` on a name that is already taken.
    #[error("table already exists: {0}")]
    TableAlreadyExists(String),

    /// A value's type disagrees with its column's declared type.
    #[error(
        "type mismatch for {table}.{column}: column is {expected}, got {found} value {value}"
    )]
    TypeMismatch {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Declared type of the column.
        expected: DeclaredType,
        /// Type of the supplied value.
        found: DeclaredType,
        /// The supplied value, rendered for display.
        value: String,
    },

    /// Attempt to set or mutate the identity column.
    #[error("identity error: {0}")]
    Identity(String),

    /// Filter references an unknown column or uses an operator outside the
    /// column's operator family.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Structurally invalid request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The database could not be opened.
    #[error("cannot open database '{path}': {message}")]
    Connection {
        /// Location that failed to open.
        path: String,
        /// Underlying failure.
        message: String,
    },

    /// SQLite failed to execute a statement that passed validation.
    #[error("engine execution error: {0}")]
    Engine(#[from] rusqlite::Error),
}

/// Classification of a [`StoreError`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Schema,
    TableNotFound,
    TableAlreadyExists,
    TypeMismatch,
    Identity,
    InvalidFilter,
    InvalidArgument,
    Connection,
    EngineExecution,
}

impl StoreError {
    /// Returns the error's kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Schema(_) => ErrorKind::Schema,
            StoreError::TableNotFound(_) => ErrorKind::TableNotFound,
            StoreError::TableAlreadyExists(_) => ErrorKind::TableAlreadyExists,
            StoreError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            StoreError::Identity(_) => ErrorKind::Identity,
            StoreError::InvalidFilter(_) => ErrorKind::InvalidFilter,
            StoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StoreError::Connection { .. } => ErrorKind::Connection,
            StoreError::Engine(_) => ErrorKind::EngineExecution,
        }
    }
}

impl From<ParseError> for StoreError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnknownOperator(_) => StoreError::InvalidFilter(err.to_string()),
            _ => StoreError::InvalidArgument(err.to_string()),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::ReservedColumn(_) => StoreError::Identity(err.to_string()),
            _ => StoreError::InvalidArgument(err.to_string()),
        }
    }
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
