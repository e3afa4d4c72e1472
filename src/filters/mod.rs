//! Typed filter DSL: model, URL codec, join combinator, predicate compiler
//! and formatting.

pub mod codec;
pub mod compile;
pub mod condition;
pub mod display;
pub mod error;
pub mod field;
pub mod join;
pub mod params;
pub mod query;

use std::fmt;

use serde_json::Value;

pub use codec::{decode, decode_all, encode};
pub use compile::{compile_filter, compile_query, Op, Operand, Where};
pub use condition::{
    Condition, DateCondition, EnumCondition, NumericCondition, RecordRef, RelationMatch,
    TextCondition, ToManyCondition, ToOneCondition,
};
pub use error::{CodecError, DecodeError, RejectedFilter, TypeMismatch};
pub use field::{EnumField, Field, FieldKind, NoField, Schema};
pub use join::Join;
pub use query::Query;

/// Short client-side identifier of a filter within one list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterId(String);

impl FilterId {
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(8);
        FilterId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FilterId {
    fn from(s: &str) -> Self {
        FilterId(s.to_string())
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The legal `(field, condition, value)` triples of schema `S`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind<S: Schema> {
    Numeric(S::Numeric, NumericCondition),
    Text(S::Text, TextCondition),
    Enum(S::Enum, EnumCondition),
    Date(S::Date, DateCondition),
    ToOne(S::ToOne, ToOneCondition),
    ToMany(S::ToMany, ToManyCondition),
}

impl<S: Schema> FilterKind<S> {
    pub fn field_kind(&self) -> FieldKind {
        match self {
            FilterKind::Numeric(..) => FieldKind::Numeric,
            FilterKind::Text(..) => FieldKind::Text,
            FilterKind::Enum(..) => FieldKind::Enum,
            FilterKind::Date(..) => FieldKind::Date,
            FilterKind::ToOne(..) => FieldKind::ToOne,
            FilterKind::ToMany(..) => FieldKind::ToMany,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Numeric(f, _) => f.name(),
            FilterKind::Text(f, _) => f.name(),
            FilterKind::Enum(f, _) => f.name(),
            FilterKind::Date(f, _) => f.name(),
            FilterKind::ToOne(f, _) => f.name(),
            FilterKind::ToMany(f, _) => f.name(),
        }
    }

    pub fn condition(&self) -> &'static str {
        match self {
            FilterKind::Numeric(_, c) => c.keyword(),
            FilterKind::Text(_, c) => c.keyword(),
            FilterKind::Enum(_, c) => c.keyword(),
            FilterKind::Date(_, c) => c.keyword(),
            FilterKind::ToOne(_, c) => c.keyword(),
            FilterKind::ToMany(_, c) => c.keyword(),
        }
    }

    pub fn value(&self) -> Value {
        match self {
            FilterKind::Numeric(_, c) => c.value(),
            FilterKind::Text(_, c) => c.value(),
            FilterKind::Enum(_, c) => c.value(),
            FilterKind::Date(_, c) => c.value(),
            FilterKind::ToOne(_, c) => c.value(),
            FilterKind::ToMany(_, c) => c.value(),
        }
    }

    /// Checked construction from untrusted parts.
    pub fn from_parts(name: &str, condition: &str, value: Value) -> Result<Self, TypeMismatch> {
        if let Some(f) = S::Numeric::from_name(name) {
            let c = NumericCondition::from_parts(name, condition, value)?;
            return Ok(FilterKind::Numeric(f, c));
        }
        if let Some(f) = S::Text::from_name(name) {
            let c = TextCondition::from_parts(name, condition, value)?;
            return Ok(FilterKind::Text(f, c));
        }
        if let Some(f) = S::Enum::from_name(name) {
            let c = EnumCondition::from_parts(name, condition, value)?;
            let known = f.variants();
            if let Some(bad) = c.variants().into_iter().find(|v| !known.contains(v)) {
                return Err(TypeMismatch::UnknownVariant {
                    field: name.to_string(),
                    value: bad.to_string(),
                });
            }
            return Ok(FilterKind::Enum(f, c));
        }
        if let Some(f) = S::Date::from_name(name) {
            let c = DateCondition::from_parts(name, condition, value)?;
            return Ok(FilterKind::Date(f, c));
        }
        if let Some(f) = S::ToOne::from_name(name) {
            let c = ToOneCondition::from_parts(name, condition, value)?;
            return Ok(FilterKind::ToOne(f, c));
        }
        if let Some(f) = S::ToMany::from_name(name) {
            let c = ToManyCondition::from_parts(name, condition, value)?;
            return Ok(FilterKind::ToMany(f, c));
        }
        Err(TypeMismatch::UnknownField {
            model: S::MODEL,
            field: name.to_string(),
        })
    }
}

/// One restriction on a record set.
///
/// Equality ignores `id`.
#[derive(Debug, Clone)]
pub struct Filter<S: Schema> {
    pub id: FilterId,
    pub kind: FilterKind<S>,
}

impl<S: Schema> PartialEq for Filter<S> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl<S: Schema> Filter<S> {
    pub fn new(kind: FilterKind<S>) -> Self {
        Self {
            id: FilterId::generate(),
            kind,
        }
    }

    pub fn with_id(mut self, id: impl Into<FilterId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn numeric(field: S::Numeric, condition: NumericCondition) -> Self {
        Self::new(FilterKind::Numeric(field, condition))
    }

    pub fn text(field: S::Text, condition: TextCondition) -> Self {
        Self::new(FilterKind::Text(field, condition))
    }

    pub fn enumeration(field: S::Enum, condition: EnumCondition) -> Self {
        Self::new(FilterKind::Enum(field, condition))
    }

    pub fn date(field: S::Date, condition: DateCondition) -> Self {
        Self::new(FilterKind::Date(field, condition))
    }

    pub fn to_one(field: S::ToOne, condition: ToOneCondition) -> Self {
        Self::new(FilterKind::ToOne(field, condition))
    }

    pub fn to_many(field: S::ToMany, condition: ToManyCondition) -> Self {
        Self::new(FilterKind::ToMany(field, condition))
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn condition(&self) -> &'static str {
        self.kind.condition()
    }

    pub fn value(&self) -> Value {
        self.kind.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::product::{Product, ProductDate, ProductEnum, ProductNumeric, ProductToMany};
    use serde_json::json;

    #[test]
    fn filter_exposes_name_condition_value() {
        let f = Filter::<Product>::numeric(ProductNumeric::Price, NumericCondition::Gt(100.into()));
        assert_eq!(f.name(), "price");
        assert_eq!(f.condition(), "gt");
        assert_eq!(f.value(), json!(100));
        assert_eq!(f.kind.field_kind(), FieldKind::Numeric);
    }

    #[test]
    fn equality_ignores_id() {
        let cheap =
            || Filter::<Product>::numeric(ProductNumeric::Price, NumericCondition::Lt(5.into()));
        let a = cheap().with_id("a");
        let b = cheap().with_id("b");
        assert_eq!(a, b);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn generated_ids_are_short_and_distinct() {
        let a = FilterId::generate();
        let b = FilterId::generate();
        assert_eq!(a.as_str().len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn from_parts_checks_enum_variants() {
        let ok =
            FilterKind::<Product>::from_parts("level", "in", json!(["RTW", "COUTURE"])).unwrap();
        assert!(matches!(ok, FilterKind::Enum(ProductEnum::Level, EnumCondition::In(_))));

        let err =
            FilterKind::<Product>::from_parts("level", "is", json!("MASS_MARKET")).unwrap_err();
        assert_eq!(
            err,
            TypeMismatch::UnknownVariant {
                field: "level".to_string(),
                value: "MASS_MARKET".to_string(),
            }
        );
    }

    #[test]
    fn from_parts_routes_each_category() {
        assert!(matches!(
            FilterKind::<Product>::from_parts("created_at", "lt", json!("2024-01-01T00:00:00Z")),
            Ok(FilterKind::Date(ProductDate::CreatedAt, _))
        ));
        assert!(matches!(
            FilterKind::<Product>::from_parts("styles", "every", json!({"id": 1})),
            Ok(FilterKind::ToMany(ProductToMany::Styles, _))
        ));
        assert!(matches!(
            FilterKind::<Product>::from_parts("AND", "some", json!([])),
            Err(TypeMismatch::UnknownField { .. })
        ));
    }
}
