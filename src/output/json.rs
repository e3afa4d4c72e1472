use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::db::models::FindResult;
use crate::filters::display::FilterLabels;
use crate::filters::{Join, RejectedFilter};

/// Pretty-print any serializable value as JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// `vitrine find --json` envelope.
#[derive(Debug, Serialize)]
pub struct FindOutput<'a, R: Serialize> {
    pub model: &'static str,
    /// Canonical query string for the decoded filters.
    pub query: String,
    pub join: Join,
    pub filters: Vec<FilterLabels>,
    #[serde(rename = "where")]
    pub predicate: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub skip: usize,
    pub take: usize,
    #[serde(flatten)]
    pub result: &'a FindResult<R>,
}

#[derive(Debug, Serialize)]
pub struct RejectedToken {
    pub token: String,
    pub error: String,
}

impl From<&RejectedFilter> for RejectedToken {
    fn from(r: &RejectedFilter) -> Self {
        RejectedToken {
            token: r.token.clone(),
            error: r.error.to_string(),
        }
    }
}
