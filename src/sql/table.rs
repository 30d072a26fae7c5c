//! Primary table extraction.
//!
//! Only the ad-hoc filter applier needs to know which table a query reads
//! from. A regex over the raw text is enough for that: the first `FROM`
//! followed by a token that is not a subquery.

use std::sync::LazyLock;

use regex::Regex;

static FROM_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bFROM\s+(\S+)").expect("valid FROM regex"));

/// Extract the primary table identifier from a SQL statement.
///
/// Returns the first token after `FROM`, skipping subqueries, with trailing
/// punctuation and identifier quotes removed. `db.table` is returned as-is.
pub fn extract_table(sql: &str) -> Option<String> {
    FROM_TABLE
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|token| !token.starts_with('('))
        .map(clean_identifier)
        .filter(|table| !table.is_empty())
}

/// Split `table.column` at the last dot.
///
/// Returns `None` for unqualified names.
pub fn split_qualified(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once('.')
}

fn clean_identifier(token: &str) -> String {
    token
        .trim_end_matches([';', ',', ')'])
        .split('.')
        .map(|part| part.trim_matches(['`', '"']))
        .collect::<Vec<_>>()
        .join(".")
}
