//! Test utilities for expanded SQL validation.
//!
//! Uses sqlparser-rs with the ClickHouse dialect to check that expanded
//! queries are still syntactically valid.

use sqlparser::dialect::ClickHouseDialect;
use sqlparser::parser::Parser;

/// Validates that a SQL string parses as ClickHouse SQL.
pub fn validate_sql(sql: &str) -> Result<(), String> {
    Parser::parse_sql(&ClickHouseDialect {}, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid ClickHouse SQL: {}\nSQL: {}", e, sql))
}

/// Parses ClickHouse SQL and renders it back, showing how the parser grouped it.
pub fn normalize_sql(sql: &str) -> Result<String, String> {
    let statements = Parser::parse_sql(&ClickHouseDialect {}, sql)
        .map_err(|e| format!("Invalid ClickHouse SQL: {}\nSQL: {}", e, sql))?;
    Ok(statements
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("SELECT * FROM events WHERE 1=1").unwrap();
        validate_sql("SELECT * FROM events WHERE ts >= toDateTime(1700000000)").unwrap();
    }

    #[test]
    fn test_normalize_sql() {
        assert_eq!(
            normalize_sql("select * from events where a=1").unwrap(),
            "SELECT * FROM events WHERE a = 1"
        );
    }

    #[test]
    fn test_validate_invalid_sql() {
        let result = validate_sql("SELEC * FORM events");
        assert!(result.is_err());
    }
}
