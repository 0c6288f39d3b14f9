//! Text grammar for command-line input.
//!
//! The command-line front end accepts records, filters, and column
//! definitions as compact `|`-separated strings:
//!
//! | Input | Grammar | Example |
//! |---|---|---|
//! | column definitions | `name=>type\|...` | `name=>text\|age=>integer` |
//! | record data | `field=>literal\|...` | `name=>"Ann"\|age=>30` |
//! | filters | `column~operator~literal\|...` | `age~less_than~32` |
//! | field list | `field\|...` | `id\|name` |
//!
//! A literal is either a double-quoted, non-empty string (text) or an
//! optionally signed run of ASCII digits (integer). Anything else is
//! rejected rather than guessed at.
//!
//! # Examples
//!
//! ```
//! use contacts_core::parse::{parse_filters, parse_record_data};
//! use contacts_core::{Filter, FilterOp, Value};
//!
//! let data = parse_record_data(r#"name=>"Ann"|age=>30"#).unwrap();
//! assert_eq!(data["name"], Value::from("Ann"));
//! assert_eq!(data["age"], Value::from(30));
//!
//! let filters = parse_filters("age~less_than~32").unwrap();
//! assert_eq!(filters, vec![Filter::new("age", FilterOp::LessThan, 32)]);
//! ```

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{Column, Filter, RecordData, Value};

static TEXT_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"(.+)"$"#).expect("static regex must compile"));
static INTEGER_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("static regex must compile"));

/// Errors raised while parsing tokens or command-line input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Column type token is neither `TEXT` nor `INTEGER`.
    #[error("unsupported column type '{0}': expected TEXT or INTEGER")]
    UnsupportedType(String),
    /// Operator token is not a known filter operator.
    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),
    /// Combinator token is neither `AND` nor `OR`.
    #[error("unknown combinator '{0}': expected AND or OR")]
    UnknownCombinator(String),
    /// Value is neither a quoted string nor an integer.
    #[error("invalid literal '{0}': quote text as \"...\" or give a plain integer")]
    InvalidLiteral(String),
    /// An entry does not follow the expected `a=>b` or `a~op~b` shape.
    #[error("malformed entry '{0}'")]
    MalformedEntry(String),
    /// The same field appears twice in one input.
    #[error("duplicate field '{0}'")]
    DuplicateField(String),
}

impl Value {
    /// Parses a command-line literal.
    ///
    /// # Examples
    ///
    /// ```
    /// use contacts_core::Value;
    ///
    /// assert_eq!(Value::parse_literal("\"Ann\"").unwrap(), Value::from("Ann"));
    /// assert_eq!(Value::parse_literal("-7").unwrap(), Value::from(-7));
    /// assert!(Value::parse_literal("Ann").is_err());
    /// assert!(Value::parse_literal("\"\"").is_err());
    /// ```
    pub fn parse_literal(raw: &str) -> Result<Value, ParseError> {
        let raw = raw.trim();
        if let Some(caps) = TEXT_LITERAL.captures(raw) {
            return Ok(Value::Text(caps[1].to_string()));
        }
        if INTEGER_LITERAL.is_match(raw) {
            return raw
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| ParseError::InvalidLiteral(raw.to_string()));
        }
        Err(ParseError::InvalidLiteral(raw.to_string()))
    }
}

/// Splits `|`-separated input, dropping empty segments.
fn entries(input: &str) -> impl Iterator<Item = &str> {
    input.split('|').map(str::trim).filter(|s| !s.is_empty())
}

/// Splits a `key=>value` entry.
fn split_pair(entry: &str) -> Result<(&str, &str), ParseError> {
    let mut parts = entry.split("=>");
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::MalformedEntry(entry.to_string())),
    }
}

/// Parses column definitions (`name=>type|...`).
pub fn parse_column_defs(input: &str) -> Result<Vec<Column>, ParseError> {
    entries(input)
        .map(|entry| {
            let (name, ty) = split_pair(entry)?;
            Ok(Column::new(name, ty.parse()?))
        })
        .collect()
}

/// Parses record data (`field=>literal|...`).
pub fn parse_record_data(input: &str) -> Result<RecordData, ParseError> {
    let mut data = RecordData::new();
    for entry in entries(input) {
        let (key, raw) = split_pair(entry)?;
        let value = Value::parse_literal(raw)?;
        if data.insert(key.to_string(), value).is_some() {
            return Err(ParseError::DuplicateField(key.to_string()));
        }
    }
    Ok(data)
}

/// Parses filters (`column~operator~literal|...`), keeping input order.
pub fn parse_filters(input: &str) -> Result<Vec<Filter>, ParseError> {
    entries(input)
        .map(|entry| {
            let parts: Vec<&str> = entry.split('~').collect();
            let [column, op, raw] = parts.as_slice() else {
                return Err(ParseError::MalformedEntry(entry.to_string()));
            };
            if column.trim().is_empty() {
                return Err(ParseError::MalformedEntry(entry.to_string()));
            }
            Ok(Filter::new(
                column.trim(),
                op.parse()?,
                Value::parse_literal(raw)?,
            ))
        })
        .collect()
}

/// Parses a field list (`field|...`). Empty input means "all fields".
pub fn parse_field_list(input: &str) -> Vec<String> {
    entries(input).map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeclaredType, FilterOp};

    #[test]
    fn test_text_literal_keeps_inner_quotes_and_separators() {
        assert_eq!(
            Value::parse_literal(r#""1130, 240 St""#).unwrap(),
            Value::from("1130, 240 St")
        );
        assert_eq!(
            Value::parse_literal(r#""say "hi"""#).unwrap(),
            Value::from(r#"say "hi""#)
        );
    }

    #[test]
    fn test_quoted_digits_stay_text() {
        assert_eq!(
            Value::parse_literal(r#""236""#).unwrap(),
            Value::from("236")
        );
    }

    #[test]
    fn test_integer_overflow_is_rejected() {
        assert!(matches!(
            Value::parse_literal("99999999999999999999"),
            Err(ParseError::InvalidLiteral(_))
        ));
    }

    #[test]
    fn test_parse_column_defs() {
        let columns = parse_column_defs("name=>text | age=>INTEGER").unwrap();
        assert_eq!(columns, vec![Column::text("name"), Column::integer("age")]);
        assert_eq!(columns[1].declared_type, DeclaredType::Integer);
    }

    #[test]
    fn test_parse_column_defs_rejects_unknown_type() {
        assert_eq!(
            parse_column_defs("score=>real"),
            Err(ParseError::UnsupportedType("real".into()))
        );
    }

    #[test]
    fn test_parse_column_defs_rejects_malformed() {
        assert!(matches!(
            parse_column_defs("name:text"),
            Err(ParseError::MalformedEntry(_))
        ));
        assert!(matches!(
            parse_column_defs("a=>text=>integer"),
            Err(ParseError::MalformedEntry(_))
        ));
    }

    #[test]
    fn test_parse_record_data_rejects_duplicates() {
        assert_eq!(
            parse_record_data(r#"name=>"a"|name=>"b""#),
            Err(ParseError::DuplicateField("name".into()))
        );
    }

    #[test]
    fn test_parse_record_data_rejects_unquoted_text() {
        assert!(matches!(
            parse_record_data("name=>Ann"),
            Err(ParseError::InvalidLiteral(_))
        ));
    }

    #[test]
    fn test_parse_filters_preserves_order() {
        let filters = parse_filters(r#"name~contains~"An"|age~greater_than_equal~18"#).unwrap();
        assert_eq!(
            filters,
            vec![
                Filter::new("name", FilterOp::Contains, "An"),
                Filter::new("age", FilterOp::GreaterThanEqual, 18),
            ]
        );
    }

    #[test]
    fn test_parse_filters_rejects_wrong_arity() {
        assert!(matches!(
            parse_filters("age~equals"),
            Err(ParseError::MalformedEntry(_))
        ));
        assert!(matches!(
            parse_filters("age~equals~1~2"),
            Err(ParseError::MalformedEntry(_))
        ));
    }

    #[test]
    fn test_parse_filters_rejects_unknown_operator() {
        assert_eq!(
            parse_filters("age~between~3"),
            Err(ParseError::UnknownOperator("between".into()))
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert!(parse_filters("").unwrap().is_empty());
        assert!(parse_record_data("").unwrap().is_empty());
        assert!(parse_field_list("  ").is_empty());
        assert_eq!(parse_field_list("id|name"), vec!["id", "name"]);
    }
}
