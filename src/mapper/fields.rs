//! Typed field accessors used by the mappers

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use super::{DecodeError, Document, FieldProblem};

pub(crate) fn required_str(
    doc: &Document,
    kind: &'static str,
    key: &str,
) -> Result<String, DecodeError> {
    match doc.get(key) {
        None | Some(Value::Null) => Err(DecodeError::new(kind, key, FieldProblem::Missing)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::new(kind, key, FieldProblem::WrongType { expected: "string" })),
    }
}

pub(crate) fn required_id(
    doc: &Document,
    kind: &'static str,
    key: &str,
) -> Result<String, DecodeError> {
    let id = required_str(doc, kind, key)?;
    if id.trim().is_empty() {
        return Err(DecodeError::new(
            kind,
            key,
            FieldProblem::Invalid("empty identifier".to_string()),
        ));
    }
    Ok(id)
}

/// Absent and null read as `None`; any string, even an empty one, is kept
pub(crate) fn optional_str(
    doc: &Document,
    kind: &'static str,
    key: &str,
) -> Result<Option<String>, DecodeError> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DecodeError::new(kind, key, FieldProblem::WrongType { expected: "string" })),
    }
}

pub(crate) fn required_time(
    doc: &Document,
    kind: &'static str,
    key: &str,
) -> Result<DateTime<Utc>, DecodeError> {
    match optional_time(doc, kind, key)? {
        Some(time) => Ok(time),
        None => Err(DecodeError::new(kind, key, FieldProblem::Missing)),
    }
}

pub(crate) fn optional_time(
    doc: &Document,
    kind: &'static str,
    key: &str,
) -> Result<Option<DateTime<Utc>>, DecodeError> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| DecodeError::new(kind, key, FieldProblem::Invalid(e.to_string()))),
        Some(_) => Err(DecodeError::new(
            kind,
            key,
            FieldProblem::WrongType { expected: "RFC 3339 timestamp" },
        )),
    }
}

/// Accepts a decimal string or a JSON number
pub(crate) fn required_decimal(
    doc: &Document,
    kind: &'static str,
    key: &str,
) -> Result<Decimal, DecodeError> {
    let raw = match doc.get(key) {
        None | Some(Value::Null) => return Err(DecodeError::new(kind, key, FieldProblem::Missing)),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            return Err(DecodeError::new(kind, key, FieldProblem::WrongType { expected: "decimal" }))
        }
    };
    Decimal::from_str(&raw)
        .map_err(|e| DecodeError::new(kind, key, FieldProblem::Invalid(e.to_string())))
}

pub(crate) fn optional_u64(
    doc: &Document,
    kind: &'static str,
    key: &str,
) -> Result<Option<u64>, DecodeError> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| {
                let problem = FieldProblem::WrongType { expected: "unsigned integer" };
                DecodeError::new(kind, key, problem)
            }),
    }
}

pub(crate) fn put_str(doc: &mut Document, key: &str, value: &str) {
    doc.insert(key.to_string(), Value::String(value.to_string()));
}

/// `None` is written as an explicit null so a merge clears the field
pub(crate) fn put_opt_str(doc: &mut Document, key: &str, value: Option<&String>) {
    match value {
        Some(value) => put_str(doc, key, value),
        None => {
            doc.insert(key.to_string(), Value::Null);
        }
    }
}

pub(crate) fn put_time(doc: &mut Document, key: &str, value: &DateTime<Utc>) {
    doc.insert(
        key.to_string(),
        Value::String(value.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    );
}

pub(crate) fn put_opt_time(doc: &mut Document, key: &str, value: Option<&DateTime<Utc>>) {
    match value {
        Some(value) => put_time(doc, key, value),
        None => {
            doc.insert(key.to_string(), Value::Null);
        }
    }
}

pub(crate) fn put_decimal(doc: &mut Document, key: &str, value: &Decimal) {
    doc.insert(key.to_string(), Value::String(value.to_string()));
}
