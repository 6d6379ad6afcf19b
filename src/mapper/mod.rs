//! Conversion between typed records and stored documents
//!
//! A document is a flat JSON object. Leaf entries (expenses, flights, stays,
//! activities) implement [`DocumentMapper`]; trips and profiles have their own
//! functions because a trip embeds arrays of leaf entries.
//!
//! Decoding never fills in a missing required field. An entry that does not
//! decode is dropped and reported through [`Decoded`].

mod entities;
mod fields;
mod trip;

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::Error;

pub use entities::{decode_profile, encode_profile, PROFILE_IMAGE_URL};
pub use trip::{
    decode_trip, decode_trips, encode_trip, trip_scalar_fields, ACCOMMODATIONS, ACTIVITIES,
    EXPENSES, FLIGHTS, SCHEMA_VERSION,
};

/// Field map of one stored document or embedded entry
pub type Document = Map<String, Value>;

/// What was wrong with a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    WrongType { expected: &'static str },
    Invalid(String),
    UnsupportedVersion(u64),
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing => write!(f, "missing"),
            FieldProblem::WrongType { expected } => write!(f, "expected {}", expected),
            FieldProblem::Invalid(reason) => write!(f, "invalid: {}", reason),
            FieldProblem::UnsupportedVersion(v) => {
                write!(f, "schema version {} is newer than {}", v, SCHEMA_VERSION)
            }
        }
    }
}

/// A record that could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}.{field}: {problem}")]
pub struct DecodeError {
    pub kind: &'static str,
    pub field: String,
    pub problem: FieldProblem,
}

impl DecodeError {
    pub(crate) fn new(kind: &'static str, field: &str, problem: FieldProblem) -> Self {
        Self {
            kind,
            field: field.to_string(),
            problem,
        }
    }
}

/// A record dropped from a decoded result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    /// Position of the record in the array or list it came from
    pub index: usize,
    /// The record's id, when it had a readable one
    pub id: Option<String>,
    /// Trip holding the record, for entries embedded in a trip
    pub trip_id: Option<String>,
    pub error: DecodeError,
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(trip_id) = &self.trip_id {
            write!(f, "trip {} ", trip_id)?;
        }
        match &self.id {
            Some(id) => write!(f, "#{} ({}): {}", self.index, id, self.error),
            None => write!(f, "#{}: {}", self.index, self.error),
        }
    }
}

/// Outcome of decoding stored data
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// Everything decoded
    Complete(T),
    /// Some records were dropped
    Partial {
        value: T,
        warnings: Vec<DecodeWarning>,
    },
    /// Nothing usable was decoded
    Failed(Vec<DecodeWarning>),
}

impl<T> Decoded<T> {
    pub(crate) fn from_parts(value: T, warnings: Vec<DecodeWarning>) -> Self {
        if warnings.is_empty() {
            Decoded::Complete(value)
        } else {
            Decoded::Partial { value, warnings }
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Decoded::Complete(value) | Decoded::Partial { value, .. } => Some(value),
            Decoded::Failed(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Decoded::Complete(value) | Decoded::Partial { value, .. } => Some(value),
            Decoded::Failed(_) => None,
        }
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        match self {
            Decoded::Complete(_) => &[],
            Decoded::Partial { warnings, .. } | Decoded::Failed(warnings) => warnings,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Decoded::Complete(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Decoded::Failed(_))
    }

    /// Keep partial data, turn a failure into an error
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Decoded::Complete(value) | Decoded::Partial { value, .. } => Ok(value),
            Decoded::Failed(mut warnings) => Err(match warnings.drain(..).next() {
                Some(warning) => Error::Decode(warning.error),
                None => Error::Decode(DecodeError::new(
                    "document",
                    "",
                    FieldProblem::Invalid("no data".to_string()),
                )),
            }),
        }
    }

    /// Mark every warning as coming from inside `trip_id`
    pub(crate) fn in_trip(mut self, trip_id: &str) -> Self {
        match &mut self {
            Decoded::Complete(_) => {}
            Decoded::Partial { warnings, .. } | Decoded::Failed(warnings) => {
                for warning in warnings {
                    warning.trip_id = Some(trip_id.to_string());
                }
            }
        }
        self
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Decoded<U> {
        match self {
            Decoded::Complete(value) => Decoded::Complete(f(value)),
            Decoded::Partial { value, warnings } => Decoded::Partial {
                value: f(value),
                warnings,
            },
            Decoded::Failed(warnings) => Decoded::Failed(warnings),
        }
    }
}

/// Stateless encoder/decoder for one kind of embedded entry
pub trait DocumentMapper: Sized {
    /// Record kind used in decode errors
    const KIND: &'static str;

    fn to_document(&self) -> Document;

    fn from_document(doc: &Document) -> Result<Self, DecodeError>;
}

/// Decode an embedded array, dropping entries that do not decode.
///
/// An empty array is complete. A non-empty array where every entry fails is
/// `Failed`.
pub fn decode_entries<T: DocumentMapper>(values: &[Value]) -> Decoded<Vec<T>> {
    let mut items = Vec::with_capacity(values.len());
    let mut warnings = Vec::new();

    for (index, value) in values.iter().enumerate() {
        let decoded = match value.as_object() {
            Some(doc) => T::from_document(doc),
            None => Err(DecodeError::new(
                T::KIND,
                "(entry)",
                FieldProblem::WrongType { expected: "object" },
            )),
        };
        match decoded {
            Ok(item) => items.push(item),
            Err(error) => {
                let id = value
                    .get("id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                tracing::warn!(kind = T::KIND, index, ?id, %error, "dropping undecodable entry");
                warnings.push(DecodeWarning {
                    index,
                    id,
                    trip_id: None,
                    error,
                });
            }
        }
    }

    if !values.is_empty() && items.is_empty() {
        Decoded::Failed(warnings)
    } else {
        Decoded::from_parts(items, warnings)
    }
}

/// Encode entries for an embedded array
pub fn encode_entries<T: DocumentMapper>(items: &[T]) -> Value {
    Value::Array(
        items
            .iter()
            .map(|item| Value::Object(item.to_document()))
            .collect(),
    )
}
