//! Filters -> query engine predicates.
//!
//! The DSL keeps its own condition keywords; the engine speaks a slightly
//! different vocabulary (`equals` rather than `is` on scalar fields). The
//! mapping lives in the `compile_*` functions below, one exhaustive match per
//! category.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::condition::{
    format_instant, DateCondition, EnumCondition, NumericCondition, RelationMatch, TextCondition,
    ToManyCondition, ToOneCondition,
};
use super::{Filter, FieldKind, FilterKind, Join, Schema};

/// Engine-side comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Equals,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Contains,
    StartsWith,
    EndsWith,
    Is,
    IsNot,
    Some,
    Every,
    None,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Equals => "equals",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::In => "in",
            Op::Contains => "contains",
            Op::StartsWith => "startsWith",
            Op::EndsWith => "endsWith",
            Op::Is => "is",
            Op::IsNot => "isNot",
            Op::Some => "some",
            Op::Every => "every",
            Op::None => "none",
        }
    }
}

/// Related records selected by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSet {
    Id(i64),
    AnyOf(Vec<i64>),
}

impl From<&RelationMatch> for RecordSet {
    fn from(m: &RelationMatch) -> Self {
        match m {
            RelationMatch::Record(r) => RecordSet::Id(r.id),
            RelationMatch::AnyOf(_) => RecordSet::AnyOf(m.ids()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Value),
    List(Vec<Value>),
    Records(RecordSet),
}

impl Operand {
    pub fn to_json(&self) -> Value {
        match self {
            Operand::Scalar(v) => v.clone(),
            Operand::List(vs) => Value::Array(vs.clone()),
            Operand::Records(RecordSet::Id(id)) => serde_json::json!({ "id": id }),
            Operand::Records(RecordSet::AnyOf(ids)) => serde_json::json!({ "id": { "in": ids } }),
        }
    }
}

/// One compiled single-field condition: `{ field: { op: operand } }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: &'static str,
    pub kind: FieldKind,
    pub op: Op,
    pub operand: Operand,
}

impl Condition {
    pub fn to_json(&self) -> Value {
        let mut inner = Map::new();
        inner.insert(self.op.as_str().to_string(), self.operand.to_json());
        let mut outer = Map::new();
        outer.insert(self.field.to_string(), Value::Object(inner));
        Value::Object(outer)
    }
}

/// A boolean group of compiled conditions: `{ JOIN: [ ... ] }`.
///
/// An empty group places no restriction, whatever the join.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    pub join: Join,
    pub conditions: Vec<Condition>,
}

impl Where {
    pub fn is_unrestricted(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            self.join.keyword().to_string(),
            Value::Array(self.conditions.iter().map(Condition::to_json).collect()),
        );
        Value::Object(map)
    }
}

impl Serialize for Where {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        self.to_json().serialize(serializer)
    }
}

pub fn compile_filter<S: Schema>(filter: &Filter<S>) -> Condition {
    let (op, operand) = match &filter.kind {
        FilterKind::Numeric(_, c) => compile_numeric(c),
        FilterKind::Text(_, c) => compile_text(c),
        FilterKind::Enum(_, c) => compile_enum(c),
        FilterKind::Date(_, c) => compile_date(c),
        FilterKind::ToOne(_, c) => compile_to_one(c),
        FilterKind::ToMany(_, c) => compile_to_many(c),
    };
    Condition {
        field: filter.name(),
        kind: filter.kind.field_kind(),
        op,
        operand,
    }
}

pub fn compile_query<S: Schema>(join: Join, filters: &[Filter<S>]) -> Where {
    Where {
        join,
        conditions: filters.iter().map(compile_filter).collect(),
    }
}

fn compile_numeric(c: &NumericCondition) -> (Op, Operand) {
    let scalar = |n: &serde_json::Number| Operand::Scalar(Value::Number(n.clone()));
    match c {
        NumericCondition::Is(n) => (Op::Equals, scalar(n)),
        NumericCondition::Gt(n) => (Op::Gt, scalar(n)),
        NumericCondition::Gte(n) => (Op::Gte, scalar(n)),
        NumericCondition::Lt(n) => (Op::Lt, scalar(n)),
        NumericCondition::Lte(n) => (Op::Lte, scalar(n)),
        NumericCondition::In(ns) => (
            Op::In,
            Operand::List(ns.iter().cloned().map(Value::Number).collect()),
        ),
    }
}

fn compile_text(c: &TextCondition) -> (Op, Operand) {
    let scalar = |s: &String| Operand::Scalar(Value::String(s.clone()));
    match c {
        TextCondition::Is(s) => (Op::Equals, scalar(s)),
        TextCondition::Contains(s) => (Op::Contains, scalar(s)),
        TextCondition::StartsWith(s) => (Op::StartsWith, scalar(s)),
        TextCondition::EndsWith(s) => (Op::EndsWith, scalar(s)),
        TextCondition::In(items) => (
            Op::In,
            Operand::List(items.iter().cloned().map(Value::String).collect()),
        ),
    }
}

fn compile_enum(c: &EnumCondition) -> (Op, Operand) {
    match c {
        EnumCondition::Is(v) => (Op::Equals, Operand::Scalar(Value::String(v.clone()))),
        EnumCondition::In(vs) => (
            Op::In,
            Operand::List(vs.iter().cloned().map(Value::String).collect()),
        ),
    }
}

fn compile_date(c: &DateCondition) -> (Op, Operand) {
    let op = match c {
        DateCondition::Is(_) => Op::Equals,
        DateCondition::Gt(_) => Op::Gt,
        DateCondition::Gte(_) => Op::Gte,
        DateCondition::Lt(_) => Op::Lt,
        DateCondition::Lte(_) => Op::Lte,
    };
    (op, Operand::Scalar(Value::String(format_instant(&c.instant()))))
}

fn compile_to_one(c: &ToOneCondition) -> (Op, Operand) {
    let op = match c {
        ToOneCondition::Is(_) => Op::Is,
        ToOneCondition::IsNot(_) => Op::IsNot,
    };
    (op, Operand::Records(c.operand().into()))
}

fn compile_to_many(c: &ToManyCondition) -> (Op, Operand) {
    let op = match c {
        ToManyCondition::Some(_) => Op::Some,
        ToManyCondition::Every(_) => Op::Every,
        ToManyCondition::None(_) => Op::None,
    };
    (op, Operand::Records(c.operand().into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::product::{
        Product, ProductEnum, ProductNumeric, ProductText, ProductToMany, ProductToOne,
    };
    use crate::filters::RecordRef;
    use serde_json::json;

    fn price_gt_100() -> Filter<Product> {
        Filter::numeric(ProductNumeric::Price, NumericCondition::Gt(100.into())).with_id("x1")
    }

    #[test]
    fn compiles_single_filter() {
        assert_eq!(compile_filter(&price_gt_100()).to_json(), json!({ "price": { "gt": 100 } }));
    }

    #[test]
    fn compiles_query_under_join_key() {
        let compiled = compile_query(Join::And, &[price_gt_100()]);
        assert_eq!(compiled.to_json(), json!({ "AND": [ { "price": { "gt": 100 } } ] }));
    }

    #[test]
    fn empty_query_is_unrestricted_for_every_join() {
        for join in Join::ALL {
            let compiled = compile_query::<Product>(join, &[]);
            assert!(compiled.is_unrestricted());
            assert_eq!(compiled.to_json()[join.keyword()], json!([]));
        }
    }

    #[test]
    fn scalar_is_maps_to_equals() {
        let f = Filter::<Product>::text(ProductText::Name, TextCondition::Is("Trench".to_string()));
        assert_eq!(compile_filter(&f).to_json(), json!({ "name": { "equals": "Trench" } }));

        let rtw = EnumCondition::In(vec!["RTW".to_string()]);
        let f = Filter::<Product>::enumeration(ProductEnum::Level, rtw);
        assert_eq!(compile_filter(&f).to_json(), json!({ "level": { "in": ["RTW"] } }));
    }

    #[test]
    fn relations_compile_to_id_matches() {
        let one = Filter::<Product>::to_one(
            ProductToOne::Brand,
            ToOneCondition::Is(RelationMatch::Record(RecordRef::new(4, "Isabel Marant"))),
        );
        assert_eq!(compile_filter(&one).to_json(), json!({ "brand": { "is": { "id": 4 } } }));

        let many = Filter::<Product>::to_many(
            ProductToMany::Styles,
            ToManyCondition::Every(RelationMatch::AnyOf(vec![RecordRef::id(1), RecordRef::id(2)])),
        );
        let compiled = compile_filter(&many);
        assert_eq!(compiled.kind, FieldKind::ToMany);
        assert_eq!(
            compiled.to_json(),
            json!({ "styles": { "every": { "id": { "in": [1, 2] } } } })
        );
    }

    #[test]
    fn where_serializes_as_json_tree() {
        let compiled = compile_query(Join::Not, &[price_gt_100()]);
        let text = serde_json::to_string(&compiled).unwrap();
        assert_eq!(text, r#"{"NOT":[{"price":{"gt":100}}]}"#);
    }
}
