use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

// ---------------------------------------------------------------------------
// List params
// ---------------------------------------------------------------------------

/// Request-supplied scalars for a list query.
///
/// `search` and `sort` carry `|`-delimited `field:value` clauses; `page` and
/// `limit` are normalized through [`normalize_page`] / [`normalize_limit`]
/// before use. The wire flag `_qr` asks for the introspection envelope
/// instead of the shaped result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "_qr")]
    pub introspect: bool,
}

// ---------------------------------------------------------------------------
// Sort order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Numeric direction as the target store expects it in a `$sort` stage.
    pub fn as_i64(self) -> i64 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

// ---------------------------------------------------------------------------
// Clause parsing
// ---------------------------------------------------------------------------

/// One `field:pattern` search clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchClause {
    pub field: String,
    pub pattern: String,
}

/// Parse a `|`-delimited search string into clauses.
///
/// Each clause splits on its first `:` into field and pattern, so patterns
/// may themselves contain `:`. A clause without a separator, or with an
/// empty field or pattern, is rejected rather than passed downstream as a
/// degenerate stage.
pub fn parse_search_clauses(raw: &str) -> Result<Vec<SearchClause>> {
    let mut clauses = Vec::new();
    for part in raw.split('|') {
        let (field, pattern) = part
            .split_once(':')
            .ok_or_else(|| Error::InvalidClause(part.to_string()))?;
        if field.is_empty() || pattern.is_empty() {
            return Err(Error::InvalidClause(part.to_string()));
        }
        clauses.push(SearchClause {
            field: field.to_string(),
            pattern: pattern.to_string(),
        });
    }
    Ok(clauses)
}

/// Parse a `|`-delimited sort string into `(field, order)` pairs.
///
/// Directions are strictly `1` (ascending) or `-1` (descending); anything
/// else is an error instead of a silent no-op direction.
pub fn parse_sort_clauses(raw: &str) -> Result<Vec<(String, SortOrder)>> {
    let mut clauses = Vec::new();
    for part in raw.split('|') {
        let (field, direction) = part
            .split_once(':')
            .ok_or_else(|| Error::InvalidClause(part.to_string()))?;
        if field.is_empty() {
            return Err(Error::InvalidClause(part.to_string()));
        }
        let order = match direction {
            "1" => SortOrder::Asc,
            "-1" => SortOrder::Desc,
            other => {
                return Err(Error::InvalidSortDirection {
                    field: field.to_string(),
                    value: other.to_string(),
                })
            }
        };
        clauses.push((field.to_string(), order));
    }
    Ok(clauses)
}

// ---------------------------------------------------------------------------
// Page / limit normalization
// ---------------------------------------------------------------------------

/// Clamp a requested page number to a positive integer (default 1).
pub fn normalize_page(page: Option<i64>) -> i64 {
    match page {
        Some(p) if p >= 1 => p,
        _ => DEFAULT_PAGE,
    }
}

/// Clamp a requested page size to a positive integer (default 10).
pub fn normalize_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(l) if l >= 1 => l,
        _ => DEFAULT_LIMIT,
    }
}
