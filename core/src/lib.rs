//! Core record, filter, and table schema types.
//!
//! This crate defines the data model shared by the storage backend and the
//! command-line front end:
//!
//! - [`DeclaredType`]: the fixed `TEXT`/`INTEGER` classification of a column.
//! - [`Value`]: a tagged record value, either [`Value::Text`] or
//!   [`Value::Integer`].
//! - [`Filter`]: a `(column, operator, value)` triple; [`FindRequest`]
//!   combines a flat list of them with a single [`Combinator`] and a
//!   projection.
//! - [`TableSchema`]: the ordered column list of a table, always led by
//!   the identity column `id`.
//! - [`Record`]: one row read back from a table, in projection order.
//!
//! Validation ([`validate_table_definition`], [`validate_identifier`]) catches
//! unsafe or ambiguous identifiers before they reach any SQL text.
//!
//! The [`parse`] module implements the compact text grammar used on the
//! command line (`name=>"Ann"|age=>30`, `age~equals~30`).
//!
//! # Example
//!
//! ```
//! use contacts_core::*;
//!
//! let request = FindRequest::new()
//!     .filter(Filter::new("age", FilterOp::GreaterThan, 18))
//!     .filter(Filter::new("name", FilterOp::Contains, "Ann"))
//!     .combinator(Combinator::Or)
//!     .project(["id", "name"]);
//!
//! assert_eq!(request.filters.len(), 2);
//! assert_eq!(FilterOp::Contains.family(), DeclaredType::Text);
//! assert!(validate_identifier("People").is_ok());
//! assert!(validate_identifier("People; DROP").is_err());
//! ```

pub mod parse;
mod types;
mod validate;

pub use parse::ParseError;
pub use types::*;
pub use validate::{
    ValidationError, validate_identifier, validate_table_definition, validate_table_name,
};
