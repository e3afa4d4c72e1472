//! Compiled predicates -> SQL.
//!
//! Produces a WHERE fragment over the model table aliased as `t` plus its
//! positional parameters. Placeholders are numbered (`?N`) so fragments can
//! be combined with other clauses by the caller.

use rusqlite::types::{ToSql, Value as SqlValue};
use serde_json::Value;

use crate::catalog::Model;
use crate::filters::compile::{Condition, RecordSet};
use crate::filters::{Field, FieldKind, Join, Op, Operand, Where};

/// A WHERE fragment and the values bound to its placeholders.
pub struct SqlPredicate {
    pub clause: String,
    pub params: Vec<Box<dyn ToSql>>,
}

impl SqlPredicate {
    pub fn param_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

impl std::fmt::Debug for SqlPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlPredicate")
            .field("clause", &self.clause)
            .field("params", &self.params.len())
            .finish()
    }
}

/// Translate `predicate` for model `M`.
///
/// An empty group matches every row whatever the join.
pub fn to_sql<M: Model>(predicate: &Where) -> SqlPredicate {
    let mut builder = Builder { params: Vec::new() };
    let clause = builder.group::<M>(predicate);
    SqlPredicate {
        clause,
        params: builder.params,
    }
}

struct Builder {
    params: Vec<Box<dyn ToSql>>,
}

impl Builder {
    fn bind(&mut self, value: SqlValue) -> String {
        self.params.push(Box::new(value));
        format!("?{}", self.params.len())
    }

    fn bind_all(&mut self, values: impl IntoIterator<Item = SqlValue>) -> Vec<String> {
        values.into_iter().map(|v| self.bind(v)).collect()
    }

    fn group<M: Model>(&mut self, predicate: &Where) -> String {
        if predicate.is_unrestricted() {
            return "1=1".to_string();
        }
        let parts: Vec<String> = predicate
            .conditions
            .iter()
            .map(|c| self.condition::<M>(c))
            .collect();
        match predicate.join {
            Join::And => format!("({})", parts.join(" AND ")),
            Join::Or => format!("({})", parts.join(" OR ")),
            Join::Not => format!("NOT ({})", parts.join(" OR ")),
        }
    }

    fn condition<M: Model>(&mut self, c: &Condition) -> String {
        match (c.kind, &c.operand) {
            (FieldKind::ToOne, Operand::Records(records)) => match M::ToOne::from_name(c.field) {
                Some(field) => self.to_one(M::to_one(field).column, c.op, records),
                None => unknown(c.field),
            },
            (FieldKind::ToMany, Operand::Records(records)) => match M::ToMany::from_name(c.field) {
                Some(field) => {
                    let rel = M::to_many(field);
                    self.to_many(rel.link_table, rel.local_key, rel.foreign_key, c.op, records)
                }
                None => unknown(c.field),
            },
            (FieldKind::Date, Operand::Scalar(value)) => {
                let column = format!("julianday(t.{})", c.field);
                let p = self.bind(sql_value(value));
                compare(&column, c.op, &format!("julianday({p})"))
            }
            (_, Operand::Scalar(value)) => {
                let column = format!("t.{}", c.field);
                match c.op {
                    Op::Contains | Op::StartsWith | Op::EndsWith => {
                        let text = value.as_str().unwrap_or_default();
                        let pattern = match c.op {
                            Op::Contains => format!("%{}%", escape_like(text)),
                            Op::StartsWith => format!("{}%", escape_like(text)),
                            _ => format!("%{}", escape_like(text)),
                        };
                        let p = self.bind(SqlValue::Text(pattern));
                        format!("{column} LIKE {p} ESCAPE '\\'")
                    }
                    op => {
                        let p = self.bind(sql_value(value));
                        compare(&column, op, &p)
                    }
                }
            }
            (_, Operand::List(values)) => {
                let column = format!("t.{}", c.field);
                let placeholders = self.bind_all(values.iter().map(sql_value));
                in_list(&column, &placeholders, false)
            }
            (_, Operand::Records(_)) => unknown(c.field),
        }
    }

    fn to_one(&mut self, column: &str, op: Op, records: &RecordSet) -> String {
        let column = format!("t.{column}");
        let placeholders = self.bind_all(ids(records));
        match op {
            Op::IsNot => format!("({column} IS NULL OR {})", in_list(&column, &placeholders, true)),
            _ => in_list(&column, &placeholders, false),
        }
    }

    fn to_many(
        &mut self,
        link_table: &str,
        local_key: &str,
        foreign_key: &str,
        op: Op,
        records: &RecordSet,
    ) -> String {
        let placeholders = self.bind_all(ids(records));
        let linked = format!("SELECT 1 FROM {link_table} l WHERE l.{local_key} = t.id");
        let column = format!("l.{foreign_key}");
        match op {
            Op::Every => format!(
                "NOT EXISTS ({linked} AND {})",
                in_list(&column, &placeholders, true)
            ),
            Op::None => format!(
                "NOT EXISTS ({linked} AND {})",
                in_list(&column, &placeholders, false)
            ),
            _ => format!("EXISTS ({linked} AND {})", in_list(&column, &placeholders, false)),
        }
    }
}

fn compare(column: &str, op: Op, placeholder: &str) -> String {
    let symbol = match op {
        Op::Gt => ">",
        Op::Gte => ">=",
        Op::Lt => "<",
        Op::Lte => "<=",
        _ => "=",
    };
    format!("{column} {symbol} {placeholder}")
}

/// `column IN (...)`. An empty list matches nothing (or everything when
/// negated).
fn in_list(column: &str, placeholders: &[String], negated: bool) -> String {
    match (placeholders.is_empty(), negated) {
        (true, false) => "0=1".to_string(),
        (true, true) => "1=1".to_string(),
        (false, false) => format!("{column} IN ({})", placeholders.join(", ")),
        (false, true) => format!("{column} NOT IN ({})", placeholders.join(", ")),
    }
}

fn ids(records: &RecordSet) -> Vec<SqlValue> {
    match records {
        RecordSet::Id(id) => vec![SqlValue::Integer(*id)],
        RecordSet::AnyOf(ids) => ids.iter().map(|id| SqlValue::Integer(*id)).collect(),
    }
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

pub(crate) fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

// Unreachable for predicates compiled from the same schema.
fn unknown(field: &str) -> String {
    tracing::warn!("No column mapping for field {field}, matching nothing");
    "0=1".to_string()
}
