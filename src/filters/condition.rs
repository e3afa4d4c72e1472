//! Condition vocabularies, one per field category.
//!
//! Every condition variant owns its operand, so the shape of a filter's value
//! follows from the condition chosen. `from_parts` is the checked path used
//! by the decoder: it refuses keywords outside the category and values of the
//! wrong shape.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::error::TypeMismatch;
use super::field::FieldKind;

/// Behaviour shared by every category's condition enum.
pub trait Condition: Sized {
    const KIND: FieldKind;

    /// The DSL keyword, as written on the wire.
    fn keyword(&self) -> &'static str;

    /// The operand as a JSON value.
    fn value(&self) -> Value;

    /// Build a condition from a decoded keyword and operand.
    fn from_parts(field: &str, keyword: &str, value: Value) -> Result<Self, TypeMismatch>;
}

fn illegal<C: Condition>(field: &str, keyword: &str) -> TypeMismatch {
    TypeMismatch::IllegalCondition {
        field: field.to_string(),
        kind: C::KIND,
        condition: keyword.to_string(),
    }
}

fn shape(field: &str, keyword: &str, expected: &'static str, value: &Value) -> TypeMismatch {
    TypeMismatch::ValueShape {
        field: field.to_string(),
        condition: keyword.to_string(),
        expected,
        value: value.to_string(),
    }
}

fn number(field: &str, keyword: &str, value: Value) -> Result<Number, TypeMismatch> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(shape(field, keyword, "a number", &other)),
    }
}

fn numbers(field: &str, keyword: &str, value: Value) -> Result<Vec<Number>, TypeMismatch> {
    let err = || shape(field, keyword, "an array of numbers", &value);
    let Value::Array(items) = &value else {
        return Err(err());
    };
    items
        .iter()
        .map(|v| match v {
            Value::Number(n) => Ok(n.clone()),
            _ => Err(err()),
        })
        .collect()
}

fn string(field: &str, keyword: &str, value: Value) -> Result<String, TypeMismatch> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(shape(field, keyword, "a string", &other)),
    }
}

fn strings(field: &str, keyword: &str, value: Value) -> Result<Vec<String>, TypeMismatch> {
    let err = || shape(field, keyword, "an array of strings", &value);
    let Value::Array(items) = &value else {
        return Err(err());
    };
    items
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(err))
        .collect()
}

fn strings_value(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

// ---------------------------------------------------------------------------
// numeric

#[derive(Debug, Clone, PartialEq)]
pub enum NumericCondition {
    Is(Number),
    Gt(Number),
    Gte(Number),
    Lt(Number),
    Lte(Number),
    In(Vec<Number>),
}

impl Condition for NumericCondition {
    const KIND: FieldKind = FieldKind::Numeric;

    fn keyword(&self) -> &'static str {
        match self {
            NumericCondition::Is(_) => "is",
            NumericCondition::Gt(_) => "gt",
            NumericCondition::Gte(_) => "gte",
            NumericCondition::Lt(_) => "lt",
            NumericCondition::Lte(_) => "lte",
            NumericCondition::In(_) => "in",
        }
    }

    fn value(&self) -> Value {
        match self {
            NumericCondition::Is(n)
            | NumericCondition::Gt(n)
            | NumericCondition::Gte(n)
            | NumericCondition::Lt(n)
            | NumericCondition::Lte(n) => Value::Number(n.clone()),
            NumericCondition::In(ns) => {
                Value::Array(ns.iter().cloned().map(Value::Number).collect())
            }
        }
    }

    fn from_parts(field: &str, keyword: &str, value: Value) -> Result<Self, TypeMismatch> {
        Ok(match keyword {
            "is" => NumericCondition::Is(number(field, keyword, value)?),
            "gt" => NumericCondition::Gt(number(field, keyword, value)?),
            "gte" => NumericCondition::Gte(number(field, keyword, value)?),
            "lt" => NumericCondition::Lt(number(field, keyword, value)?),
            "lte" => NumericCondition::Lte(number(field, keyword, value)?),
            "in" => NumericCondition::In(numbers(field, keyword, value)?),
            _ => return Err(illegal::<Self>(field, keyword)),
        })
    }
}

// ---------------------------------------------------------------------------
// text

#[derive(Debug, Clone, PartialEq)]
pub enum TextCondition {
    Is(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    In(Vec<String>),
}

impl Condition for TextCondition {
    const KIND: FieldKind = FieldKind::Text;

    fn keyword(&self) -> &'static str {
        match self {
            TextCondition::Is(_) => "is",
            TextCondition::Contains(_) => "contains",
            TextCondition::StartsWith(_) => "startsWith",
            TextCondition::EndsWith(_) => "endsWith",
            TextCondition::In(_) => "in",
        }
    }

    fn value(&self) -> Value {
        match self {
            TextCondition::Is(s)
            | TextCondition::Contains(s)
            | TextCondition::StartsWith(s)
            | TextCondition::EndsWith(s) => Value::String(s.clone()),
            TextCondition::In(items) => strings_value(items),
        }
    }

    fn from_parts(field: &str, keyword: &str, value: Value) -> Result<Self, TypeMismatch> {
        Ok(match keyword {
            "is" => TextCondition::Is(string(field, keyword, value)?),
            "contains" => TextCondition::Contains(string(field, keyword, value)?),
            "startsWith" => TextCondition::StartsWith(string(field, keyword, value)?),
            "endsWith" => TextCondition::EndsWith(string(field, keyword, value)?),
            "in" => TextCondition::In(strings(field, keyword, value)?),
            _ => return Err(illegal::<Self>(field, keyword)),
        })
    }
}

// ---------------------------------------------------------------------------
// enum

/// Variant membership is checked against the field by
/// [`FilterKind::from_parts`](super::FilterKind::from_parts).
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCondition {
    Is(String),
    In(Vec<String>),
}

impl EnumCondition {
    /// Every variant named by the operand.
    pub fn variants(&self) -> Vec<&str> {
        match self {
            EnumCondition::Is(v) => vec![v.as_str()],
            EnumCondition::In(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

impl Condition for EnumCondition {
    const KIND: FieldKind = FieldKind::Enum;

    fn keyword(&self) -> &'static str {
        match self {
            EnumCondition::Is(_) => "is",
            EnumCondition::In(_) => "in",
        }
    }

    fn value(&self) -> Value {
        match self {
            EnumCondition::Is(v) => Value::String(v.clone()),
            EnumCondition::In(vs) => strings_value(vs),
        }
    }

    fn from_parts(field: &str, keyword: &str, value: Value) -> Result<Self, TypeMismatch> {
        Ok(match keyword {
            "is" => EnumCondition::Is(string(field, keyword, value)?),
            "in" => EnumCondition::In(strings(field, keyword, value)?),
            _ => return Err(illegal::<Self>(field, keyword)),
        })
    }
}

// ---------------------------------------------------------------------------
// date

#[derive(Debug, Clone, PartialEq)]
pub enum DateCondition {
    Is(DateTime<Utc>),
    Gt(DateTime<Utc>),
    Gte(DateTime<Utc>),
    Lt(DateTime<Utc>),
    Lte(DateTime<Utc>),
}

impl DateCondition {
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            DateCondition::Is(d)
            | DateCondition::Gt(d)
            | DateCondition::Gte(d)
            | DateCondition::Lt(d)
            | DateCondition::Lte(d) => *d,
        }
    }
}

/// RFC 3339 in UTC with `Z`, as stored by the catalog.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl Condition for DateCondition {
    const KIND: FieldKind = FieldKind::Date;

    fn keyword(&self) -> &'static str {
        match self {
            DateCondition::Is(_) => "is",
            DateCondition::Gt(_) => "gt",
            DateCondition::Gte(_) => "gte",
            DateCondition::Lt(_) => "lt",
            DateCondition::Lte(_) => "lte",
        }
    }

    fn value(&self) -> Value {
        Value::String(format_instant(&self.instant()))
    }

    fn from_parts(field: &str, keyword: &str, value: Value) -> Result<Self, TypeMismatch> {
        let build: fn(DateTime<Utc>) -> DateCondition = match keyword {
            "is" => DateCondition::Is,
            "gt" => DateCondition::Gt,
            "gte" => DateCondition::Gte,
            "lt" => DateCondition::Lt,
            "lte" => DateCondition::Lte,
            _ => return Err(illegal::<Self>(field, keyword)),
        };
        let instant = value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
            .ok_or_else(|| shape(field, keyword, "an RFC 3339 timestamp", &value))?;
        Ok(build(instant))
    }
}

// ---------------------------------------------------------------------------
// relations

/// A lightweight reference to a related record. `name` is carried for
/// display only; matching is by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RecordRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }

    pub fn id(id: i64) -> Self {
        Self { id, name: None }
    }

    fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("id".to_string(), Value::from(self.id));
        if let Some(ref name) = self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        Value::Object(map)
    }
}

/// Operand of relation conditions: one record, or any of several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationMatch {
    Record(RecordRef),
    AnyOf(Vec<RecordRef>),
}

impl RelationMatch {
    pub fn records(&self) -> &[RecordRef] {
        match self {
            RelationMatch::Record(r) => std::slice::from_ref(r),
            RelationMatch::AnyOf(rs) => rs,
        }
    }

    pub fn ids(&self) -> Vec<i64> {
        self.records().iter().map(|r| r.id).collect()
    }

    pub fn to_value(&self) -> Value {
        match self {
            RelationMatch::Record(r) => r.to_value(),
            RelationMatch::AnyOf(rs) => {
                serde_json::json!({ "OR": rs.iter().map(RecordRef::to_value).collect::<Vec<_>>() })
            }
        }
    }

    fn from_value(field: &str, keyword: &str, value: Value) -> Result<Self, TypeMismatch> {
        const EXPECTED: &str = "{\"id\": <int>} or {\"OR\": [{\"id\": <int>}, ...]}";
        let err = |v: &Value| shape(field, keyword, EXPECTED, v);
        let Value::Object(ref map) = value else {
            return Err(err(&value));
        };
        if let Some(any) = map.get("OR") {
            if map.len() != 1 {
                return Err(err(&value));
            }
            let refs: Vec<RecordRef> =
                serde_json::from_value(any.clone()).map_err(|_| err(&value))?;
            return Ok(RelationMatch::AnyOf(refs));
        }
        if map.keys().any(|k| k != "id" && k != "name") {
            return Err(err(&value));
        }
        serde_json::from_value(value.clone())
            .map(RelationMatch::Record)
            .map_err(|_| err(&value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToOneCondition {
    Is(RelationMatch),
    IsNot(RelationMatch),
}

impl ToOneCondition {
    pub fn operand(&self) -> &RelationMatch {
        match self {
            ToOneCondition::Is(m) | ToOneCondition::IsNot(m) => m,
        }
    }
}

impl Condition for ToOneCondition {
    const KIND: FieldKind = FieldKind::ToOne;

    fn keyword(&self) -> &'static str {
        match self {
            ToOneCondition::Is(_) => "is",
            ToOneCondition::IsNot(_) => "isNot",
        }
    }

    fn value(&self) -> Value {
        self.operand().to_value()
    }

    fn from_parts(field: &str, keyword: &str, value: Value) -> Result<Self, TypeMismatch> {
        Ok(match keyword {
            "is" => ToOneCondition::Is(RelationMatch::from_value(field, keyword, value)?),
            "isNot" => ToOneCondition::IsNot(RelationMatch::from_value(field, keyword, value)?),
            _ => return Err(illegal::<Self>(field, keyword)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToManyCondition {
    Some(RelationMatch),
    Every(RelationMatch),
    None(RelationMatch),
}

impl ToManyCondition {
    pub fn operand(&self) -> &RelationMatch {
        match self {
            ToManyCondition::Some(m) | ToManyCondition::Every(m) | ToManyCondition::None(m) => m,
        }
    }
}

impl Condition for ToManyCondition {
    const KIND: FieldKind = FieldKind::ToMany;

    fn keyword(&self) -> &'static str {
        match self {
            ToManyCondition::Some(_) => "some",
            ToManyCondition::Every(_) => "every",
            ToManyCondition::None(_) => "none",
        }
    }

    fn value(&self) -> Value {
        self.operand().to_value()
    }

    fn from_parts(field: &str, keyword: &str, value: Value) -> Result<Self, TypeMismatch> {
        Ok(match keyword {
            "some" => ToManyCondition::Some(RelationMatch::from_value(field, keyword, value)?),
            "every" => ToManyCondition::Every(RelationMatch::from_value(field, keyword, value)?),
            "none" => ToManyCondition::None(RelationMatch::from_value(field, keyword, value)?),
            _ => return Err(illegal::<Self>(field, keyword)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_in_requires_array_of_numbers() {
        let err = NumericCondition::from_parts("price", "in", json!([1, "two"])).unwrap_err();
        assert!(matches!(
            err,
            TypeMismatch::ValueShape { ref expected, .. } if *expected == "an array of numbers"
        ));

        let ok = NumericCondition::from_parts("price", "in", json!([1, 2.5])).unwrap();
        assert_eq!(ok.value(), json!([1, 2.5]));
    }

    #[test]
    fn keyword_from_another_category_is_illegal() {
        let err = TextCondition::from_parts("name", "gt", json!("a")).unwrap_err();
        assert_eq!(
            err,
            TypeMismatch::IllegalCondition {
                field: "name".to_string(),
                kind: FieldKind::Text,
                condition: "gt".to_string(),
            }
        );
    }

    #[test]
    fn date_operand_is_normalised_to_utc() {
        let cond =
            DateCondition::from_parts("created_at", "gte", json!("2024-03-01T09:00:00+02:00"))
                .unwrap();
        assert_eq!(cond.value(), json!("2024-03-01T07:00:00Z"));
        assert!(DateCondition::from_parts("created_at", "gte", json!("yesterday")).is_err());
    }

    #[test]
    fn relation_match_accepts_record_or_any_of() {
        let coat = json!({"id": 3, "name": "Coat"});
        let one = ToManyCondition::from_parts("styles", "some", coat).unwrap();
        assert_eq!(one.operand(), &RelationMatch::Record(RecordRef::new(3, "Coat")));

        let either = json!({"OR": [{"id": 1}, {"id": 2}]});
        let any = ToManyCondition::from_parts("styles", "none", either).unwrap();
        assert_eq!(any.operand().ids(), vec![1, 2]);
        assert_eq!(any.value(), json!({"OR": [{"id": 1}, {"id": 2}]}));
    }

    #[test]
    fn relation_match_rejects_foreign_keys() {
        assert!(ToManyCondition::from_parts("styles", "some", json!({"slug": "coat"})).is_err());
        assert!(ToManyCondition::from_parts("styles", "some", json!({"id": "3"})).is_err());
        assert!(ToOneCondition::from_parts("brand", "is", json!({"OR": [], "id": 1})).is_err());
    }

    #[test]
    fn any_of_rejects_foreign_keys_in_each_record() {
        let extra = json!({"OR": [{"id": 1}, {"id": 2, "slug": "x"}]});
        let err = ToManyCondition::from_parts("styles", "some", extra).unwrap_err();
        assert!(matches!(err, TypeMismatch::ValueShape { ref field, .. } if field == "styles"));

        let nested = json!({"OR": [{"OR": [{"id": 1}]}]});
        assert!(ToOneCondition::from_parts("brand", "isNot", nested).is_err());
    }
}
