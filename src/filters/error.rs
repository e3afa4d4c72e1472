use thiserror::Error;

use super::field::FieldKind;

/// Which part of a token failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Name,
    Condition,
    Value,
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Segment::Name => "name",
            Segment::Condition => "condition",
            Segment::Value => "value",
        })
    }
}

/// The token itself is malformed.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected 3 segments separated by ':', found {found}")]
    Segments { found: usize },

    #[error("malformed percent-encoding in {segment} segment: {input:?}")]
    PercentEncoding { segment: Segment, input: String },

    #[error("invalid JSON in value segment: {0}")]
    Json(#[from] serde_json::Error),
}

/// The token is well-formed but describes a filter the schema does not allow.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeMismatch {
    #[error("unknown field `{field}` for {model}")]
    UnknownField { model: &'static str, field: String },

    #[error("condition `{condition}` is not legal for {kind} field `{field}`")]
    IllegalCondition {
        field: String,
        kind: FieldKind,
        condition: String,
    },

    #[error("value {value} does not fit `{field} {condition}`: expected {expected}")]
    ValueShape {
        field: String,
        condition: String,
        expected: &'static str,
        value: String,
    },

    #[error("`{value}` is not a variant of enum field `{field}`")]
    UnknownVariant { field: String, value: String },
}

/// Any failure of [`decode`](super::codec::decode).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),
}

/// A token that was dropped or refused while reading a query string.
#[derive(Debug, Error)]
#[error("rejected filter {token:?}: {error}")]
pub struct RejectedFilter {
    pub token: String,
    #[source]
    pub error: CodecError,
}
