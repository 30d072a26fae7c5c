//! SQL text helpers used by the macro appliers.
//!
//! The engine never parses SQL. It needs two small pieces of text handling:
//!
//! - [`table`] - locating the primary table of a statement (`FROM <token>`)
//! - [`helpers`] - quoting string literals for ClickHouse

pub mod helpers;
pub mod table;

#[cfg(test)]
pub mod test_utils;

pub use helpers::{quote_string_single, TRUE_CONDITION};
pub use table::{extract_table, split_qualified};
