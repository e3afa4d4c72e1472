//! One filter <-> one URL-safe token.
//!
//! A token is `pct(name):pct(condition):pct(json(value))`. Each segment is
//! percent-encoded on its own, so the delimiter never appears inside a
//! segment. The filter id is not part of the token; decoding assigns a fresh
//! one.

use std::borrow::Cow;

use serde_json::Value;
use tracing::debug;

use super::error::{CodecError, DecodeError, Segment};
use super::{Filter, FilterId, FilterKind, Schema};

pub const DELIMITER: char = ':';

/// Encode a filter. Never fails.
pub fn encode<S: Schema>(filter: &Filter<S>) -> String {
    let value = filter.value().to_string();
    let delimiter = DELIMITER.to_string();
    [filter.name(), filter.condition(), value.as_str()]
        .iter()
        .map(|part| urlencoding::encode(part))
        .collect::<Vec<Cow<'_, str>>>()
        .join(delimiter.as_str())
}

/// Decode one token, re-checking that the triple is legal for `S`.
pub fn decode<S: Schema>(token: &str) -> Result<Filter<S>, CodecError> {
    let parts: Vec<&str> = token.split(DELIMITER).collect();
    let [name, condition, value] = parts.as_slice() else {
        return Err(DecodeError::Segments { found: parts.len() }.into());
    };

    let name = percent_decode(Segment::Name, name)?;
    let condition = percent_decode(Segment::Condition, condition)?;
    let value = percent_decode(Segment::Value, value)?;
    let value: Value = serde_json::from_str(&value).map_err(DecodeError::Json)?;

    let kind = FilterKind::<S>::from_parts(&name, &condition, value)?;
    debug!(model = S::MODEL, name = %name, condition = %condition, "decoded filter");
    Ok(Filter {
        id: FilterId::generate(),
        kind,
    })
}

/// Decode tokens in order, stopping at the first failure.
pub fn decode_all<S, I, T>(tokens: I) -> Result<Vec<Filter<S>>, CodecError>
where
    S: Schema,
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    tokens.into_iter().map(|t| decode(t.as_ref())).collect()
}

/// Strict percent-decoding: every `%` must start a two-digit hex escape and
/// the decoded bytes must be UTF-8.
fn percent_decode(segment: Segment, input: &str) -> Result<String, DecodeError> {
    let malformed = || DecodeError::PercentEncoding {
        segment,
        input: input.to_string(),
    };

    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3).ok_or_else(malformed)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return Err(malformed());
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(input)
        .map(Cow::into_owned)
        .map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::product::{
        Product, ProductDate, ProductEnum, ProductNumeric, ProductText, ProductToMany,
        ProductToOne,
    };
    use crate::filters::error::TypeMismatch;
    use crate::filters::{
        DateCondition, EnumCondition, NumericCondition, RecordRef, RelationMatch, TextCondition,
        ToManyCondition, ToOneCondition,
    };
    use chrono::{DateTime, Utc};

    fn price_gt_100() -> Filter<Product> {
        Filter::numeric(ProductNumeric::Price, NumericCondition::Gt(100.into())).with_id("x1")
    }

    #[test]
    fn encodes_plain_filter_readably() {
        assert_eq!(encode(&price_gt_100()), "price:gt:100");
    }

    #[test]
    fn round_trips_price_gt_100() {
        let token = encode(&price_gt_100());
        let decoded: Filter<Product> = decode(&token).unwrap();
        assert_eq!(decoded, price_gt_100());
        assert_eq!(decoded.name(), "price");
        assert_eq!(decoded.condition(), "gt");
        assert_eq!(decoded.value(), serde_json::json!(100));
    }

    #[test]
    fn delimiter_and_percent_in_value_round_trip() {
        let filter =
            Filter::<Product>::text(ProductText::Name, TextCondition::Is("a:b%c".to_string()));
        let token = encode(&filter);
        assert_eq!(token.matches(DELIMITER).count(), 2);
        assert_eq!(decode::<Product>(&token).unwrap(), filter);
    }

    #[test]
    fn relation_with_unicode_name_round_trips() {
        let filter = Filter::<Product>::to_many(
            ProductToMany::Collections,
            ToManyCondition::Some(RelationMatch::Record(RecordRef::new(7, "Été: 100% lin"))),
        );
        let decoded: Filter<Product> = decode(&encode(&filter)).unwrap();
        assert_eq!(decoded, filter);
    }

    #[test]
    fn enum_in_round_trips() {
        let levels = vec!["RTW".to_string(), "BESPOKE".to_string()];
        let filter = Filter::<Product>::enumeration(ProductEnum::Level, EnumCondition::In(levels));
        assert_eq!(decode::<Product>(&encode(&filter)).unwrap(), filter);
    }

    #[test]
    fn sub_second_date_round_trips() {
        let instant = DateTime::parse_from_rfc3339("2024-03-01T09:30:15.123456+02:00")
            .unwrap()
            .with_timezone(&Utc);
        let filter = Filter::<Product>::date(ProductDate::CreatedAt, DateCondition::Gte(instant));
        let token = encode(&filter);
        assert!(token.contains("07%3A30%3A15.123456Z"), "{token}");
        assert_eq!(decode::<Product>(&token).unwrap(), filter);
    }

    #[test]
    fn to_one_is_not_any_of_round_trips() {
        let brands = vec![RecordRef::new(1, "Isabel Marant"), RecordRef::id(2)];
        let filter = Filter::<Product>::to_one(
            ProductToOne::Brand,
            ToOneCondition::IsNot(RelationMatch::AnyOf(brands)),
        );
        assert_eq!(decode::<Product>(&encode(&filter)).unwrap(), filter);
    }

    #[test]
    fn wrong_segment_count_is_decode_error() {
        for token in ["price:gt", "price:gt:1:extra", ""] {
            let err = decode::<Product>(token).unwrap_err();
            assert!(matches!(err, CodecError::Decode(DecodeError::Segments { .. })), "{token}");
        }
    }

    #[test]
    fn malformed_percent_escape_is_decode_error() {
        for token in ["price:gt:%zz", "price%2:gt:1", "price:gt:1%", "price:gt:%FF"] {
            let err = decode::<Product>(token).unwrap_err();
            assert!(
                matches!(err, CodecError::Decode(DecodeError::PercentEncoding { .. })),
                "{token}: {err}"
            );
        }
    }

    #[test]
    fn invalid_json_is_decode_error() {
        let err = decode::<Product>("price:gt:%7Bnope").unwrap_err();
        assert!(matches!(err, CodecError::Decode(DecodeError::Json(_))));
    }

    #[test]
    fn illegal_condition_is_type_mismatch() {
        let err = decode::<Product>("price:contains:%22cheap%22").unwrap_err();
        assert!(matches!(
            err,
            CodecError::TypeMismatch(TypeMismatch::IllegalCondition { .. })
        ));
    }

    #[test]
    fn wrong_value_shape_is_type_mismatch() {
        let err = decode::<Product>("price:gt:%22100%22").unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch(TypeMismatch::ValueShape { .. })));
    }

    #[test]
    fn decode_all_preserves_order() {
        let tokens = ["price:gt:100", "price:lt:200", "name:contains:%22coat%22"];
        let filters = decode_all::<Product, _, _>(tokens).unwrap();
        let names: Vec<_> = filters.iter().map(|f| (f.name(), f.condition())).collect();
        assert_eq!(names, vec![("price", "gt"), ("price", "lt"), ("name", "contains")]);
    }
}
