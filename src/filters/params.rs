//! Reading and writing whole query strings.
//!
//! Filters travel as repeated occurrences of one key, the join as a single
//! optional key. Other parameters are left alone when a query string is
//! rewritten.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::form_urlencoded;

use super::codec::{decode, encode};
use super::error::RejectedFilter;
use super::{Filter, Join, Query, Schema};

/// Names of the reserved query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamKeys {
    pub filter: String,
    pub join: String,
    pub search: String,
    pub skip: String,
    pub take: String,
}

impl Default for ParamKeys {
    fn default() -> Self {
        Self {
            filter: "f".to_string(),
            join: "j".to_string(),
            search: "search".to_string(),
            skip: "skip".to_string(),
            take: "take".to_string(),
        }
    }
}

/// Offset pagination carried next to the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Page {
    pub skip: usize,
    /// Absent means the caller's default page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<usize>,
}

/// What to do with a filter token that does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodePolicy {
    /// Refuse the whole query string.
    Strict,
    /// Drop the bad token, keep the rest, and report it.
    #[default]
    SkipInvalid,
}

/// A query read from a URL.
#[derive(Debug)]
pub struct DecodedQuery<S: Schema> {
    pub query: Query<S>,
    /// Tokens dropped under [`DecodePolicy::SkipInvalid`], in order.
    pub rejected: Vec<RejectedFilter>,
    pub search: Option<String>,
    pub page: Page,
}

pub fn parse_query_string<S: Schema>(
    query_string: &str,
    keys: &ParamKeys,
    policy: DecodePolicy,
) -> Result<DecodedQuery<S>, RejectedFilter> {
    let query_string = query_string.strip_prefix('?').unwrap_or(query_string);

    let mut filters = Vec::new();
    let mut rejected = Vec::new();
    let mut join = None;
    let mut page = Page::default();
    let (mut skip_seen, mut take_seen) = (false, false);

    for (key, value) in form_urlencoded::parse(query_string.as_bytes()) {
        if key == keys.filter.as_str() {
            match decode::<S>(&value) {
                Ok(filter) => filters.push(filter),
                Err(error) => {
                    let rejection = RejectedFilter {
                        token: value.into_owned(),
                        error,
                    };
                    match policy {
                        DecodePolicy::Strict => return Err(rejection),
                        DecodePolicy::SkipInvalid => {
                            warn!("Skipping filter: {rejection}");
                            rejected.push(rejection);
                        }
                    }
                }
            }
        } else if key == keys.join.as_str() && join.is_none() {
            join = Some(value.into_owned());
        } else if key == keys.skip.as_str() && !skip_seen {
            skip_seen = true;
            page.skip = count(&key, &value).unwrap_or_default();
        } else if key == keys.take.as_str() && !take_seen {
            take_seen = true;
            page.take = count(&key, &value);
        }
    }

    let query = Query::new(filters, Join::from_param(join.as_deref()));
    debug!(model = S::MODEL, filters = query.len(), join = %query.join(), "parsed query string");

    Ok(DecodedQuery {
        query,
        rejected,
        search: search_term(query_string, keys),
        page,
    })
}

fn count(key: &str, value: &str) -> Option<usize> {
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Ignoring {key}={value}: not a non-negative integer");
            None
        }
    }
}

/// The free-text search parameter with all whitespace removed.
pub fn search_term(query_string: &str, keys: &ParamKeys) -> Option<String> {
    let query_string = query_string.strip_prefix('?').unwrap_or(query_string);
    form_urlencoded::parse(query_string.as_bytes())
        .find(|(key, _)| *key == keys.search.as_str())
        .map(|(_, value)| value.split_whitespace().collect::<String>())
        .filter(|term| !term.is_empty())
}

/// Replace the filter and join parameters of `existing`, keeping every
/// other parameter in place.
pub fn rewrite_query_string<S: Schema>(
    existing: &str,
    query: &Query<S>,
    keys: &ParamKeys,
) -> String {
    let existing = existing.strip_prefix('?').unwrap_or(existing);
    let mut out = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(existing.as_bytes()) {
        if key != keys.filter.as_str() && key != keys.join.as_str() {
            out.append_pair(&key, &value);
        }
    }
    for filter in query.filters() {
        out.append_pair(&keys.filter, &encode(filter));
    }
    if query.join() != Join::default() {
        out.append_pair(&keys.join, query.join().keyword());
    }
    out.finish()
}

pub fn to_query_string<S: Schema>(query: &Query<S>, keys: &ParamKeys) -> String {
    rewrite_query_string("", query, keys)
}

/// Link to `path` with `filters` appended. `path` must not carry a query.
pub fn filter_href<S: Schema>(path: &str, filters: &[Filter<S>], keys: &ParamKeys) -> String {
    let query = Query::new(filters.to_vec(), Join::default());
    let qs = to_query_string(&query, keys);
    if qs.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{qs}")
    }
}
