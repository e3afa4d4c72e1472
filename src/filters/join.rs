use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Boolean group operator combining a list of filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Join {
    /// Records matching all filters.
    #[default]
    And,
    /// Records matching any filter.
    Or,
    /// Records matching no filter.
    Not,
}

impl Join {
    /// Cycle order used by [`Join::next`].
    pub const ALL: [Join; 3] = [Join::And, Join::Or, Join::Not];

    pub fn keyword(self) -> &'static str {
        match self {
            Join::And => "AND",
            Join::Or => "OR",
            Join::Not => "NOT",
        }
    }

    /// Read the join query parameter. Anything other than an exact keyword,
    /// including absence, yields the default.
    pub fn from_param(param: Option<&str>) -> Join {
        param.and_then(|p| p.parse().ok()).unwrap_or_default()
    }

    /// AND -> OR -> NOT -> AND.
    pub fn next(self) -> Join {
        match self {
            Join::And => Join::Or,
            Join::Or => Join::Not,
            Join::Not => Join::And,
        }
    }

    /// Phrase shown next to the join toggle.
    pub fn describe(self) -> &'static str {
        match self {
            Join::And => "all filters",
            Join::Or => "any filter",
            Join::Not => "no filters",
        }
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown join `{0}` (expected AND, OR or NOT)")]
pub struct UnknownJoin(pub String);

impl FromStr for Join {
    type Err = UnknownJoin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(Join::And),
            "OR" => Ok(Join::Or),
            "NOT" => Ok(Join::Not),
            other => Err(UnknownJoin(other.to_string())),
        }
    }
}
