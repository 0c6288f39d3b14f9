//! Typed query compiler.
//!
//! Pure functions from a live [`TableSchema`] and a request to a
//! [`CompiledStatement`]: SQL text with numbered placeholders plus the
//! values to bind to them. Identifiers in the SQL text come only from the
//! schema (or from names already validated against it) and are always
//! double-quoted; caller-supplied values are only ever bound.
//!
//! Unknown columns are rejected everywhere: in filters with
//! [`StoreError::InvalidFilter`], in projections and write payloads with
//! [`StoreError::InvalidArgument`].
//!
//! Output is deterministic. Projections follow caller order (or schema
//! order when empty), filters follow caller order, and write payloads are
//! laid out in schema order, so the same inputs always compile to the same
//! bytes.
//!
//! # Example
//!
//! ```
//! use contacts_core::{Column, Filter, FilterOp, FindRequest, TableSchema};
//! use contacts_sqlite::query::compile_select;
//!
//! let schema = TableSchema::new("People", vec![Column::text("name"), Column::integer("age")]);
//! let request = FindRequest::new()
//!     .filter(Filter::new("age", FilterOp::Equals, 30))
//!     .project(["id", "name"]);
//!
//! let select = compile_select(&schema, &request).unwrap();
//! assert_eq!(
//!     select.statement.sql(),
//!     r#"SELECT "id", "name" FROM "People" WHERE "age" = ?1 ORDER BY "id""#
//! );
//! assert_eq!(select.columns, ["id", "name"]);
//! ```

use contacts_core::{Column, FilterOp, FindRequest, ID_COLUMN, RecordData, TableSchema, Value};

use crate::convert::check_value;
use crate::error::{Result, StoreError};
use crate::schema::quote_ident;

/// SQL text and the values bound to its `?N` placeholders, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStatement {
    sql: String,
    params: Vec<Value>,
}

impl CompiledStatement {
    pub(crate) fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }

    /// Statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound values; `params()[i]` binds to `?{i + 1}`.
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// A compiled read and the column names its rows carry, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSelect {
    /// The `SELECT` statement.
    pub statement: CompiledStatement,
    /// Projected columns, matching the result column order.
    pub columns: Vec<String>,
}

/// One compiled filter: a predicate fragment and its single bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Predicate SQL referencing placeholder `?{placeholder}`.
    pub sql: String,
    /// Value bound to that placeholder.
    pub param: Value,
}

/// Compiles one filter against a column.
///
/// The value's type is checked first, then the operator's family: a text
/// value on an `INTEGER` column is a [`StoreError::TypeMismatch`], while
/// `contains` with an integer on an `INTEGER` column is a
/// [`StoreError::InvalidFilter`].
///
/// | Operator | Predicate |
/// |---|---|
/// | `is` / `is_not` | `col = ?` / `NOT (col = ?)` |
/// | `contains` / `does_not_contain` | `col LIKE '%' \|\| ? \|\| '%' ESCAPE '\'` / `NOT (...)` |
/// | `less_than` … `not_equal` | `col < ?`, `<=`, `>`, `>=`, `=`, `!=` |
///
/// Substring matching ignores ASCII case. The needle is bound with `\`, `%`
/// and `_` escaped, so it never acts as a pattern.
pub fn compile_filter(
    table: &str,
    column: &Column,
    op: FilterOp,
    value: &Value,
    placeholder: usize,
) -> Result<Predicate> {
    check_value(table, column, value)?;
    if op.family() != column.declared_type {
        let allowed: Vec<&str> = FilterOp::for_type(column.declared_type)
            .map(FilterOp::as_str)
            .collect();
        return Err(StoreError::InvalidFilter(format!(
            "operator '{op}' does not apply to {}.{} ({}); expected one of: {}",
            table,
            column.name,
            column.declared_type,
            allowed.join(", ")
        )));
    }

    let col = quote_ident(&column.name);
    let p = format!("?{placeholder}");
    let sql = match op {
        FilterOp::Is => format!("{col} = {p}"),
        FilterOp::IsNot => format!("NOT ({col} = {p})"),
        FilterOp::Contains => format!("{col} LIKE '%' || {p} || '%' ESCAPE '\\'"),
        FilterOp::DoesNotContain => format!("NOT ({col} LIKE '%' || {p} || '%' ESCAPE '\\')"),
        FilterOp::LessThan => format!("{col} < {p}"),
        FilterOp::LessThanEqual => format!("{col} <= {p}"),
        FilterOp::GreaterThan => format!("{col} > {p}"),
        FilterOp::GreaterThanEqual => format!("{col} >= {p}"),
        FilterOp::Equals => format!("{col} = {p}"),
        FilterOp::NotEqual => format!("{col} != {p}"),
    };

    let param = match (op, value) {
        (FilterOp::Contains | FilterOp::DoesNotContain, Value::Text(needle)) => {
            Value::Text(escape_like(needle))
        }
        _ => value.clone(),
    };

    Ok(Predicate { sql, param })
}

/// Escapes `LIKE` metacharacters with a backslash.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Compiles a read request.
///
/// An empty projection selects every column in schema order (identity
/// column first); an empty filter list selects every row. Rows are ordered
/// by `id`.
///
/// # Errors
///
/// - [`StoreError::InvalidArgument`] for an unknown or repeated projected column.
/// - [`StoreError::InvalidFilter`] for a filter on an unknown column or with
///   an operator from the wrong family.
/// - [`StoreError::TypeMismatch`] for a filter value of the wrong type.
pub fn compile_select(schema: &TableSchema, request: &FindRequest) -> Result<CompiledSelect> {
    let columns: Vec<String> = if request.projection.is_empty() {
        schema.column_names().map(String::from).collect()
    } else {
        let mut columns: Vec<String> = Vec::with_capacity(request.projection.len());
        for name in &request.projection {
            let Some(column) = schema.column(name) else {
                return Err(StoreError::InvalidArgument(format!(
                    "unknown column '{name}' in projection for table '{}'",
                    schema.name
                )));
            };
            if columns.contains(&column.name) {
                return Err(StoreError::InvalidArgument(format!(
                    "column '{name}' projected twice for table '{}'",
                    schema.name
                )));
            }
            columns.push(column.name.clone());
        }
        columns
    };

    let mut predicates = Vec::with_capacity(request.filters.len());
    let mut params = Vec::with_capacity(request.filters.len());
    for filter in &request.filters {
        let column = schema.column(&filter.column).ok_or_else(|| {
            StoreError::InvalidFilter(format!(
                "unknown column '{}' in filter [{filter}] for table '{}'",
                filter.column, schema.name
            ))
        })?;
        let predicate = compile_filter(
            &schema.name,
            column,
            filter.op,
            &filter.value,
            params.len() + 1,
        )?;
        predicates.push(predicate.sql);
        params.push(predicate.param);
    }

    let projection: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let mut sql = format!(
        "SELECT {} FROM {}",
        projection.join(", "),
        quote_ident(&schema.name)
    );
    if !predicates.is_empty() {
        let joiner = format!(" {} ", request.combinator.as_sql());
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(&joiner));
    }
    sql.push_str(&format!(" ORDER BY {}", quote_ident(ID_COLUMN)));

    Ok(CompiledSelect {
        statement: CompiledStatement::new(sql, params),
        columns,
    })
}

/// Validates a write payload and returns its columns in schema order,
/// paired with their values.
fn resolve_payload<'s, 'd>(
    schema: &'s TableSchema,
    data: &'d RecordData,
) -> Result<Vec<(&'s Column, &'d Value)>> {
    if let Some(key) = data.keys().find(|k| k.eq_ignore_ascii_case(ID_COLUMN)) {
        return Err(StoreError::Identity(format!(
            "'{key}' is assigned by the store and cannot be set on table '{}'",
            schema.name
        )));
    }
    let mut slots: Vec<Option<&'d Value>> = vec![None; schema.columns.len()];
    for (key, value) in data {
        let Some(index) = schema.position(key) else {
            return Err(StoreError::InvalidArgument(format!(
                "unknown column '{key}' for table '{}'",
                schema.name
            )));
        };
        if slots[index].replace(value).is_some() {
            return Err(StoreError::InvalidArgument(format!(
                "column '{}' given more than once for table '{}'",
                schema.columns[index].name, schema.name
            )));
        }
    }

    let mut fields = Vec::with_capacity(data.len());
    for (column, value) in schema.columns.iter().zip(slots) {
        if let Some(value) = value {
            check_value(&schema.name, column, value)?;
            fields.push((column, value));
        }
    }
    Ok(fields)
}

/// Compiles an insert of one record.
///
/// An empty payload inserts a row whose user columns are all `NULL`.
///
/// # Errors
///
/// - [`StoreError::Identity`] if the payload names `id`.
/// - [`StoreError::InvalidArgument`] for an unknown column.
/// - [`StoreError::TypeMismatch`] for a value of the wrong type.
pub fn compile_insert(schema: &TableSchema, data: &RecordData) -> Result<CompiledStatement> {
    let fields = resolve_payload(schema, data)?;
    let table = quote_ident(&schema.name);

    if fields.is_empty() {
        return Ok(CompiledStatement::new(
            format!("INSERT INTO {table} DEFAULT VALUES"),
            Vec::new(),
        ));
    }

    let names: Vec<String> = fields.iter().map(|(c, _)| quote_ident(&c.name)).collect();
    let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{i}")).collect();
    let params = fields.into_iter().map(|(_, v)| v.clone()).collect();

    Ok(CompiledStatement::new(
        format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        ),
        params,
    ))
}

/// Compiles an update of the named columns of one record.
///
/// Columns absent from `data` are left untouched. Whether `id` refers to an
/// existing record is the caller's concern.
///
/// # Errors
///
/// Same as [`compile_insert`], plus [`StoreError::InvalidArgument`] for an
/// empty payload.
pub fn compile_update(schema: &TableSchema, id: i64, data: &RecordData) -> Result<CompiledStatement> {
    let fields = resolve_payload(schema, data)?;
    if fields.is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "update of record {id} in table '{}' has no fields",
            schema.name
        )));
    }

    let assignments: Vec<String> = fields
        .iter()
        .enumerate()
        .map(|(i, (c, _))| format!("{} = ?{}", quote_ident(&c.name), i + 1))
        .collect();
    let mut params: Vec<Value> = fields.into_iter().map(|(_, v)| v.clone()).collect();
    params.push(Value::Integer(id));

    Ok(CompiledStatement::new(
        format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(&schema.name),
            assignments.join(", "),
            quote_ident(ID_COLUMN),
            params.len()
        ),
        params,
    ))
}

/// Compiles a delete by id.
///
/// One id compiles to an equality predicate, several to `IN (...)`.
///
/// # Errors
///
/// Returns [`StoreError::InvalidArgument`] if `ids` is empty.
pub fn compile_delete(table: &str, ids: &[i64]) -> Result<CompiledStatement> {
    let id = quote_ident(ID_COLUMN);
    let predicate = match ids {
        [] => {
            return Err(StoreError::InvalidArgument(format!(
                "delete from table '{table}' needs at least one id"
            )));
        }
        [_] => format!("{id} = ?1"),
        _ => {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
            format!("{id} IN ({})", placeholders.join(", "))
        }
    };

    Ok(CompiledStatement::new(
        format!("DELETE FROM {} WHERE {predicate}", quote_ident(table)),
        ids.iter().copied().map(Value::Integer).collect(),
    ))
}

/// Compiles a delete of every row in a table.
pub fn compile_clear(table: &str) -> CompiledStatement {
    CompiledStatement::new(format!("DELETE FROM {}", quote_ident(table)), Vec::new())
}

/// Compiles an existence check for one record.
pub(crate) fn compile_exists(table: &str, id: i64) -> CompiledStatement {
    CompiledStatement::new(
        format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(ID_COLUMN)
        ),
        vec![Value::Integer(id)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use contacts_core::{Combinator, Filter};

    fn people() -> TableSchema {
        TableSchema::new(
            "People",
            vec![Column::text("name"), Column::integer("age"), Column::text("email")],
        )
    }

    fn data(pairs: &[(&str, Value)]) -> RecordData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_text_operators() {
        let name = Column::text("name");
        let v = Value::from("Ann");
        let cases = [
            (FilterOp::Is, r#""name" = ?1"#),
            (FilterOp::IsNot, r#"NOT ("name" = ?1)"#),
            (FilterOp::Contains, r#""name" LIKE '%' || ?1 || '%' ESCAPE '\'"#),
            (FilterOp::DoesNotContain, r#"NOT ("name" LIKE '%' || ?1 || '%' ESCAPE '\')"#),
        ];
        for (op, expected) in cases {
            let predicate = compile_filter("People", &name, op, &v, 1).unwrap();
            assert_eq!(predicate.sql, expected);
            assert_eq!(predicate.param, v);
        }
    }

    #[test]
    fn test_substring_needle_is_escaped() {
        let name = Column::text("name");
        let predicate =
            compile_filter("People", &name, FilterOp::Contains, &Value::from(r"50%_a\b"), 1)
                .unwrap();
        assert_eq!(predicate.param, Value::from(r"50\%\_a\\b"));

        let predicate =
            compile_filter("People", &name, FilterOp::Is, &Value::from("50%"), 1).unwrap();
        assert_eq!(predicate.param, Value::from("50%"));
    }

    #[test]
    fn test_integer_operators() {
        let age = Column::integer("age");
        let v = Value::from(30);
        let cases = [
            (FilterOp::LessThan, r#""age" < ?3"#),
            (FilterOp::LessThanEqual, r#""age" <= ?3"#),
            (FilterOp::GreaterThan, r#""age" > ?3"#),
            (FilterOp::GreaterThanEqual, r#""age" >= ?3"#),
            (FilterOp::Equals, r#""age" = ?3"#),
            (FilterOp::NotEqual, r#""age" != ?3"#),
        ];
        for (op, expected) in cases {
            assert_eq!(compile_filter("People", &age, op, &v, 3).unwrap().sql, expected);
        }
    }

    #[test]
    fn test_wrong_family_operator_is_invalid_filter() {
        let err = compile_filter("People", &Column::integer("age"), FilterOp::Contains, &Value::from(3), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFilter);
        assert!(err.to_string().contains("People.age"));

        let err = compile_filter("People", &Column::text("name"), FilterOp::LessThan, &Value::from("a"), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFilter);
    }

    #[test]
    fn test_wrong_value_type_is_type_mismatch() {
        let err = compile_filter("People", &Column::integer("age"), FilterOp::Equals, &Value::from("30"), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);

        // Type is checked before operator family.
        let err = compile_filter("People", &Column::integer("age"), FilterOp::Is, &Value::from("30"), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_select_all_uses_schema_order() {
        let select = compile_select(&people(), &FindRequest::new()).unwrap();
        assert_eq!(
            select.statement.sql(),
            r#"SELECT "id", "name", "age", "email" FROM "People" ORDER BY "id""#
        );
        assert!(select.statement.params().is_empty());
        assert_eq!(select.columns, ["id", "name", "age", "email"]);
    }

    #[test]
    fn test_select_combines_filters_in_order() {
        let request = FindRequest::new()
            .filter(Filter::new("age", FilterOp::GreaterThan, 18))
            .filter(Filter::new("name", FilterOp::Contains, "n"))
            .combinator(Combinator::Or)
            .project(["name"]);
        let select = compile_select(&people(), &request).unwrap();
        assert_eq!(
            select.statement.sql(),
            r#"SELECT "name" FROM "People" WHERE "age" > ?1 OR "name" LIKE '%' || ?2 || '%' ESCAPE '\' ORDER BY "id""#
        );
        assert_eq!(
            select.statement.params(),
            &[Value::from(18), Value::from("n")]
        );
    }

    #[test]
    fn test_select_is_deterministic() {
        let request = FindRequest::new()
            .filter(Filter::new("email", FilterOp::IsNot, "x@y"))
            .filter(Filter::new("age", FilterOp::NotEqual, 3))
            .project(["email", "id"]);
        let first = compile_select(&people(), &request).unwrap();
        for _ in 0..16 {
            assert_eq!(compile_select(&people(), &request).unwrap(), first);
        }
    }

    #[test]
    fn test_select_rejects_unknown_filter_column() {
        let request = FindRequest::new().filter(Filter::new("phone", FilterOp::Is, "1"));
        let err = compile_select(&people(), &request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFilter);
        assert!(err.to_string().contains("phone"));
    }

    #[test]
    fn test_select_rejects_bad_projection() {
        let err = compile_select(&people(), &FindRequest::new().project(["phone"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = compile_select(&people(), &FindRequest::new().project(["id", "id"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_filter_on_identity_column() {
        let request = FindRequest::new().filter(Filter::new("id", FilterOp::Equals, 1));
        let select = compile_select(&people(), &request).unwrap();
        assert!(select.statement.sql().contains(r#"WHERE "id" = ?1"#));
    }

    #[test]
    fn test_column_names_resolve_to_stored_spelling() {
        let request = FindRequest::new()
            .filter(Filter::new("AGE", FilterOp::Equals, 30))
            .project(["Name", "ID"]);
        let select = compile_select(&people(), &request).unwrap();
        assert_eq!(
            select.statement.sql(),
            r#"SELECT "name", "id" FROM "People" WHERE "age" = ?1 ORDER BY "id""#
        );
        assert_eq!(select.columns, ["name", "id"]);

        let err = compile_select(&people(), &FindRequest::new().project(["name", "NAME"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let stmt = compile_insert(&people(), &data(&[("Email", "a@b".into())])).unwrap();
        assert_eq!(stmt.sql(), r#"INSERT INTO "People" ("email") VALUES (?1)"#);

        let err = compile_insert(
            &people(),
            &data(&[("name", "Ann".into()), ("NAME", "Bob".into())]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_insert_lays_out_columns_in_schema_order() {
        let stmt = compile_insert(
            &people(),
            &data(&[("email", "a@b".into()), ("name", "Ann".into()), ("age", 30.into())]),
        )
        .unwrap();
        assert_eq!(
            stmt.sql(),
            r#"INSERT INTO "People" ("name", "age", "email") VALUES (?1, ?2, ?3)"#
        );
        assert_eq!(
            stmt.params(),
            &[Value::from("Ann"), Value::from(30), Value::from("a@b")]
        );
    }

    #[test]
    fn test_insert_empty_payload_uses_defaults() {
        let stmt = compile_insert(&people(), &RecordData::new()).unwrap();
        assert_eq!(stmt.sql(), r#"INSERT INTO "People" DEFAULT VALUES"#);
    }

    #[test]
    fn test_insert_rejects_identity() {
        for key in ["id", "ID"] {
            let err = compile_insert(&people(), &data(&[(key, 5.into()), ("name", "Ann".into())]))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Identity);
        }
    }

    #[test]
    fn test_insert_rejects_unknown_and_mistyped_fields() {
        let err = compile_insert(&people(), &data(&[("phone", "1".into())])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = compile_insert(&people(), &data(&[("age", "thirty".into())])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_update_sets_only_named_columns() {
        let stmt = compile_update(&people(), 7, &data(&[("age", 31.into())])).unwrap();
        assert_eq!(stmt.sql(), r#"UPDATE "People" SET "age" = ?1 WHERE "id" = ?2"#);
        assert_eq!(stmt.params(), &[Value::from(31), Value::from(7)]);
    }

    #[test]
    fn test_update_rejects_identity_and_empty_payload() {
        let err = compile_update(&people(), 1, &data(&[("id", 2.into())])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Identity);

        let err = compile_update(&people(), 1, &RecordData::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_delete_single_and_many() {
        let one = compile_delete("People", &[4]).unwrap();
        assert_eq!(one.sql(), r#"DELETE FROM "People" WHERE "id" = ?1"#);
        assert_eq!(one.params(), &[Value::from(4)]);

        let many = compile_delete("People", &[4, 9, 2]).unwrap();
        assert_eq!(many.sql(), r#"DELETE FROM "People" WHERE "id" IN (?1, ?2, ?3)"#);
        assert_eq!(many.params().len(), 3);
    }

    #[test]
    fn test_delete_requires_ids() {
        let err = compile_delete("People", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_clear() {
        assert_eq!(compile_clear("People").sql(), r#"DELETE FROM "People""#);
    }
}
