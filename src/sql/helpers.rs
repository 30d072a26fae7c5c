//! Literal formatting shared by the appliers.

/// Always-true condition substituted when a filter macro has nothing to filter on.
pub const TRUE_CONDITION: &str = "1=1";

/// Quote string with single quotes for ClickHouse.
///
/// ClickHouse treats `\` as an escape inside string literals, so backslashes
/// are escaped before single quotes are doubled.
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

/// Format a number the way a JavaScript dashboard would: no trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
