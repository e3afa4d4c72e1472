//! Human-readable renderings. None of these are decodable; use the codec for
//! anything that has to be read back.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::{Filter, Query, Schema};

/// `name condition json(value)`, e.g. `price gt 100`.
impl<S: Schema> fmt::Display for Filter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name(), self.condition(), self.value())
    }
}

/// Filters separated by the join keyword, e.g. `price gt 100 OR price lt 200`.
impl<S: Schema> fmt::Display for Query<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, filter) in self.filters().iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.join())?;
            }
            write!(f, "{filter}")?;
        }
        Ok(())
    }
}

/// User-facing strings for one filter, as shown on a filter chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterLabels {
    pub id: String,
    pub name: String,
    pub condition: String,
    pub value: String,
}

impl<S: Schema> Filter<S> {
    pub fn labels(&self) -> FilterLabels {
        let value = self.value();
        let plural = plural_operand(&value);
        FilterLabels {
            id: self.id.to_string(),
            name: self.name().to_string(),
            condition: condition_phrase(self.condition(), plural).to_string(),
            value: value_text(&value),
        }
    }
}

/// Whether the operand names more than one item.
fn plural_operand(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.len() > 1,
        Value::Object(map) => map.get("OR").and_then(Value::as_array).is_some_and(|a| a.len() > 1),
        _ => false,
    }
}

fn condition_phrase(condition: &str, plural: bool) -> &'static str {
    match (condition, plural) {
        ("in", true) => "is any of",
        ("some", true) => "includes any of",
        ("every", true) => "includes all of",
        ("none", true) => "excludes any of",
        ("is" | "in", _) => "is",
        ("isNot", _) => "is not",
        ("lt", _) => "is less than",
        ("lte", _) => "is less than or equal to",
        ("gt", _) => "is greater than",
        ("gte", _) => "is greater than or equal to",
        ("contains", _) => "contains",
        ("startsWith", _) => "starts with",
        ("endsWith", _) => "ends with",
        ("some" | "every", _) => "includes",
        ("none", _) => "does not include",
        _ => "matches",
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Null => "NULL".to_string(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        Value::Object(map) => {
            if let Some(Value::Array(any)) = map.get("OR") {
                return any.iter().map(value_text).collect::<Vec<_>>().join(", ");
            }
            match (map.get("name"), map.get("id")) {
                (Some(Value::String(name)), _) => name.clone(),
                (_, Some(id)) => format!("#{id}"),
                _ => value.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::product::{Product, ProductNumeric, ProductText, ProductToMany};
    use crate::filters::{
        Join, NumericCondition, RecordRef, RelationMatch, TextCondition, ToManyCondition,
    };

    fn price(cond: NumericCondition) -> Filter<Product> {
        Filter::numeric(ProductNumeric::Price, cond)
    }

    #[test]
    fn formats_single_filter() {
        assert_eq!(price(NumericCondition::Gt(100.into())).to_string(), "price gt 100");
        let name =
            Filter::<Product>::text(ProductText::Name, TextCondition::Contains("coat".to_string()));
        assert_eq!(name.to_string(), r#"name contains "coat""#);
    }

    #[test]
    fn formats_query_with_join_keyword() {
        let query = Query::new(
            vec![price(NumericCondition::Gt(100.into())), price(NumericCondition::Lt(200.into()))],
            Join::Or,
        );
        assert_eq!(query.to_string(), "price gt 100 OR price lt 200");
        assert_eq!(Query::<Product>::default().to_string(), "");
    }

    #[test]
    fn labels_use_plural_phrases_for_lists() {
        let f = price(NumericCondition::In(vec![10.into(), 20.into()]));
        let labels = f.labels();
        assert_eq!(labels.condition, "is any of");
        assert_eq!(labels.value, "10, 20");

        let single = price(NumericCondition::In(vec![10.into()])).labels();
        assert_eq!(single.condition, "is");
    }

    #[test]
    fn labels_show_record_names() {
        let f = Filter::<Product>::to_many(
            ProductToMany::Styles,
            ToManyCondition::None(RelationMatch::AnyOf(vec![
                RecordRef::new(1, "Coat"),
                RecordRef::id(2),
            ])),
        );
        let labels = f.labels();
        assert_eq!(labels.name, "styles");
        assert_eq!(labels.condition, "excludes any of");
        assert_eq!(labels.value, "Coat, #2");
    }
}
