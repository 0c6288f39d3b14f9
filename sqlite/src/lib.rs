//! Schema-aware SQLite record store.
//!
//! This crate stores flat records in user-defined tables whose columns are
//! declared `TEXT` or `INTEGER`, and reads them back through a small filter
//! language. Every request is validated against the table's live schema
//! and compiled into a parameterized statement before it reaches SQLite.
//!
//! # Architecture
//!
//! The crate is organized into five modules:
//!
//! - **`connection`**: [`ConnectionHandle`], the single owned connection
//! - **`schema`**: table DDL and [`SchemaRegistry`] introspection
//! - **`convert`**: [`check_value`], the type check every value passes
//!   through, and value binding/reading
//! - **`query`**: the typed query compiler (pure functions)
//! - **`store`**: [`RecordStore`], the CRUD façade
//!
//! # Quick start
//!
//! ```no_run
//! use contacts_core::{Column, Combinator, Filter, FilterOp, FindRequest, RecordData, Value};
//! use contacts_sqlite::RecordStore;
//!
//! let mut store = RecordStore::open("contacts.db").unwrap();
//! store
//!     .create_table("People", &[Column::text("name"), Column::integer("age")])
//!     .unwrap();
//!
//! let mut data = RecordData::new();
//! data.insert("name".into(), Value::from("Ann"));
//! data.insert("age".into(), Value::from(30));
//! let id = store.insert("People", &data).unwrap();
//!
//! let request = FindRequest::new()
//!     .filter(Filter::new("age", FilterOp::LessThan, 40))
//!     .filter(Filter::new("name", FilterOp::Contains, "An"))
//!     .combinator(Combinator::And)
//!     .project(["id", "name"]);
//! for record in store.find("People", &request).unwrap() {
//!     println!("{:?}", record);
//! }
//!
//! store.delete("People", &[id]).unwrap();
//! store.close().unwrap();
//! ```
//!
//! # Safety of generated SQL
//!
//! Values are always bound as parameters. Table and column names are the
//! only text spliced into statements; they must match `^[A-Za-z0-9_]+$`
//! and are double-quoted.

mod connection;
mod convert;
mod error;
pub mod query;
mod schema;
mod store;

pub use connection::{ConnectionHandle, IN_MEMORY};
pub use convert::check_value;
pub use error::{ErrorKind, Result, StoreError};
pub use query::{CompiledSelect, CompiledStatement, Predicate};
pub use schema::{SchemaRegistry, generate_create_table_sql, generate_drop_table_sql};
pub use store::RecordStore;
