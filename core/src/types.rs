//! Record, filter, and table schema type definitions.
//!
//! Every value that flows between the caller and the store is tagged with
//! its kind ([`Value`]) and checked against the column's [`DeclaredType`];
//! nothing is inferred from a sample value.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::parse::ParseError;

/// Name of the identity column present on every table.
///
/// The column is an auto-incrementing integer assigned by the store on
/// insert and never settable or mutable by callers.
pub const ID_COLUMN: &str = "id";

/// Declared type of a column, fixed at table creation.
///
/// Parsing is case-insensitive; the canonical spelling is uppercase.
///
/// # Examples
///
/// ```
/// use contacts_core::DeclaredType;
///
/// let ty: DeclaredType = "text".parse().unwrap();
/// assert_eq!(ty, DeclaredType::Text);
/// assert_eq!(ty.as_sql(), "TEXT");
/// assert!("REAL".parse::<DeclaredType>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeclaredType {
    /// Free text.
    Text,
    /// Signed 64-bit integer.
    Integer,
}

impl DeclaredType {
    /// Returns the SQL spelling of the type (`TEXT` or `INTEGER`).
    pub fn as_sql(self) -> &'static str {
        match self {
            DeclaredType::Text => "TEXT",
            DeclaredType::Integer => "INTEGER",
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for DeclaredType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Ok(DeclaredType::Text),
            "INTEGER" => Ok(DeclaredType::Integer),
            _ => Err(ParseError::UnsupportedType(s.trim().to_string())),
        }
    }
}

/// A tagged record or filter value.
///
/// # Examples
///
/// ```
/// use contacts_core::{DeclaredType, Value};
///
/// assert_eq!(Value::from("Ann").declared_type(), DeclaredType::Text);
/// assert_eq!(Value::from(30).declared_type(), DeclaredType::Integer);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
}

impl Value {
    /// Returns the declared type this value is compatible with.
    pub fn declared_type(&self) -> DeclaredType {
        match self {
            Value::Text(_) => DeclaredType::Text,
            Value::Integer(_) => DeclaredType::Integer,
        }
    }

    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Integer(_) => None,
        }
    }

    /// Returns the integer content, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

/// Filter operator.
///
/// Operators come in two families: text operators apply only to `TEXT`
/// columns and comparison operators apply only to `INTEGER` columns.
///
/// # Examples
///
/// ```
/// use contacts_core::{DeclaredType, FilterOp};
///
/// let op: FilterOp = "does_not_contain".parse().unwrap();
/// assert_eq!(op, FilterOp::DoesNotContain);
/// assert_eq!(op.family(), DeclaredType::Text);
/// assert_eq!(FilterOp::LessThanEqual.family(), DeclaredType::Integer);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Text equality.
    Is,
    /// Negated text equality.
    IsNot,
    /// Substring match.
    Contains,
    /// Negated substring match.
    DoesNotContain,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqual,
    /// Integer equality.
    Equals,
    /// Negated integer equality.
    NotEqual,
}

impl FilterOp {
    /// Every operator, text family first.
    pub const ALL: [FilterOp; 10] = [
        FilterOp::Is,
        FilterOp::IsNot,
        FilterOp::Contains,
        FilterOp::DoesNotContain,
        FilterOp::LessThan,
        FilterOp::LessThanEqual,
        FilterOp::GreaterThan,
        FilterOp::GreaterThanEqual,
        FilterOp::Equals,
        FilterOp::NotEqual,
    ];

    /// Returns the operator's token, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Is => "is",
            FilterOp::IsNot => "is_not",
            FilterOp::Contains => "contains",
            FilterOp::DoesNotContain => "does_not_contain",
            FilterOp::LessThan => "less_than",
            FilterOp::LessThanEqual => "less_than_equal",
            FilterOp::GreaterThan => "greater_than",
            FilterOp::GreaterThanEqual => "greater_than_equal",
            FilterOp::Equals => "equals",
            FilterOp::NotEqual => "not_equal",
        }
    }

    /// Returns the column type this operator applies to.
    pub fn family(self) -> DeclaredType {
        match self {
            FilterOp::Is | FilterOp::IsNot | FilterOp::Contains | FilterOp::DoesNotContain => {
                DeclaredType::Text
            }
            FilterOp::LessThan
            | FilterOp::LessThanEqual
            | FilterOp::GreaterThan
            | FilterOp::GreaterThanEqual
            | FilterOp::Equals
            | FilterOp::NotEqual => DeclaredType::Integer,
        }
    }

    /// Returns all operators applicable to the given column type.
    pub fn for_type(ty: DeclaredType) -> impl Iterator<Item = FilterOp> {
        Self::ALL.into_iter().filter(move |op| op.family() == ty)
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == token)
            .ok_or_else(|| ParseError::UnknownOperator(token.to_string()))
    }
}

/// A single `(column, operator, value)` filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Column the filter applies to.
    pub column: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Value compared against.
    pub value: Value,
}

impl Filter {
    /// Creates a filter.
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Text(s) => write!(f, "{} {} {s:?}", self.column, self.op),
            Value::Integer(n) => write!(f, "{} {} {n}", self.column, self.op),
        }
    }
}

/// Logical operator joining every filter of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    /// All filters must match (the default).
    #[default]
    And,
    /// At least one filter must match.
    Or,
}

impl Combinator {
    /// Returns the SQL keyword.
    pub fn as_sql(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Combinator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Combinator::And),
            "OR" => Ok(Combinator::Or),
            _ => Err(ParseError::UnknownCombinator(s.trim().to_string())),
        }
    }
}

/// A read request: flat filter list, one combinator, and a projection.
///
/// An empty filter list selects every row; an empty projection returns all
/// columns in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindRequest {
    /// Filters, applied in order.
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Operator joining the filters.
    #[serde(default)]
    pub combinator: Combinator,
    /// Columns to return.
    #[serde(default)]
    pub projection: Vec<String>,
}

impl FindRequest {
    /// Creates a request selecting every row and column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sets the combinator.
    pub fn combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// Sets the projection.
    pub fn project<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Field values supplied to insert or update, keyed by column name.
pub type RecordData = BTreeMap<String, Value>;

/// A column and its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub declared_type: DeclaredType,
}

impl Column {
    /// Creates a column.
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
        }
    }

    /// Creates a `TEXT` column.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Text)
    }

    /// Creates an `INTEGER` column.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Integer)
    }

    /// Returns `true` for the identity column.
    pub fn is_identity(&self) -> bool {
        self.name == ID_COLUMN
    }
}

/// Live schema of one table: its columns in declaration order.
///
/// A schema read from the store always starts with the identity column.
///
/// # Examples
///
/// ```
/// use contacts_core::{Column, DeclaredType, TableSchema};
///
/// let schema = TableSchema::new("People", vec![Column::text("name"), Column::integer("age")]);
/// assert_eq!(schema.column_names().collect::<Vec<_>>(), ["id", "name", "age"]);
/// assert_eq!(schema.declared_type("age"), Some(DeclaredType::Integer));
/// assert_eq!(schema.declared_type("email"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Columns in declaration order, identity column first.
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// Creates a schema from user columns, prepending the identity column.
    pub fn new(name: impl Into<String>, user_columns: Vec<Column>) -> Self {
        let mut columns = Vec::with_capacity(user_columns.len() + 1);
        columns.push(Column::integer(ID_COLUMN));
        columns.extend(user_columns.into_iter().filter(|c| !c.is_identity()));
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Looks up a column by name, ignoring ASCII case as SQLite does.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    /// Returns the schema index of a column, ignoring ASCII case.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Returns the declared type of a column.
    pub fn declared_type(&self, name: &str) -> Option<DeclaredType> {
        self.column(name).map(|c| c.declared_type)
    }

    /// Returns all column names in schema order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the columns callers may write.
    pub fn user_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_identity())
    }
}

/// One row read from a table.
///
/// Fields keep projection order. Columns holding SQL `NULL` (never written)
/// are present with no value.
///
/// # Examples
///
/// ```
/// use contacts_core::{Record, Value};
///
/// let record = Record::new().with("id", 1).with("name", "Ann");
/// assert_eq!(record.id(), Some(1));
/// assert_eq!(record.get("name"), Some(&Value::from("Ann")));
/// assert_eq!(record.get("age"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Option<Value>)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn push(&mut self, column: impl Into<String>, value: Option<Value>) {
        self.fields.push((column.into(), value));
    }

    /// Appends a non-null field, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, Some(value.into()));
        self
    }

    /// Appends a null field, builder style.
    pub fn with_null(mut self, column: impl Into<String>) -> Self {
        self.push(column, None);
        self
    }

    /// Returns the value of a column, or `None` if absent or null.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Returns `true` if the record carries the column (even as null).
    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == column)
    }

    /// Returns the identity value, if projected.
    pub fn id(&self) -> Option<i64> {
        self.get(ID_COLUMN).and_then(Value::as_integer)
    }

    /// Returns the column names in projection order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(column, value)` pairs in projection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_is_case_insensitive() {
        assert_eq!("Integer".parse::<DeclaredType>().unwrap(), DeclaredType::Integer);
        assert_eq!(" text ".parse::<DeclaredType>().unwrap(), DeclaredType::Text);
        assert!(matches!(
            "BLOB".parse::<DeclaredType>(),
            Err(ParseError::UnsupportedType(t)) if t == "BLOB"
        ));
    }

    #[test]
    fn test_operator_tokens_round_trip() {
        for op in FilterOp::ALL {
            assert_eq!(op.as_str().parse::<FilterOp>().unwrap(), op);
        }
        assert!("like".parse::<FilterOp>().is_err());
    }

    #[test]
    fn test_operator_families_partition() {
        let text: Vec<_> = FilterOp::for_type(DeclaredType::Text).collect();
        let integer: Vec<_> = FilterOp::for_type(DeclaredType::Integer).collect();
        assert_eq!(text.len(), 4);
        assert_eq!(integer.len(), 6);
        assert!(!text.contains(&FilterOp::Equals));
        assert!(!integer.contains(&FilterOp::Is));
    }

    #[test]
    fn test_combinator_parse() {
        assert_eq!("or".parse::<Combinator>().unwrap(), Combinator::Or);
        assert_eq!("AND".parse::<Combinator>().unwrap(), Combinator::And);
        assert!("XOR".parse::<Combinator>().is_err());
        assert_eq!(Combinator::default(), Combinator::And);
    }

    #[test]
    fn test_schema_always_leads_with_id() {
        let schema = TableSchema::new(
            "t",
            vec![Column::integer(ID_COLUMN), Column::text("name")],
        );
        assert_eq!(schema.column_names().collect::<Vec<_>>(), ["id", "name"]);
        assert_eq!(schema.user_columns().count(), 1);
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let schema = TableSchema::new("t", vec![Column::text("name")]);
        assert_eq!(schema.column("NAME").map(|c| c.name.as_str()), Some("name"));
        assert_eq!(schema.position("Id"), Some(0));
        assert_eq!(schema.column("names"), None);
    }

    #[test]
    fn test_record_serializes_in_projection_order() {
        let record = Record::new().with("name", "Ann").with("id", 1).with_null("age");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"Ann","id":1,"age":null}"#);
    }

    #[test]
    fn test_find_request_deserializes_with_defaults() {
        let request: FindRequest = serde_json::from_str(
            r#"{"filters":[{"column":"age","op":"less_than","value":32}]}"#,
        )
        .unwrap();
        assert_eq!(request.combinator, Combinator::And);
        assert!(request.projection.is_empty());
        assert_eq!(request.filters[0], Filter::new("age", FilterOp::LessThan, 32));
    }
}
