//! `$__adHocFilter()`.
//!
//! Expands to the conjunction of the dashboard's ad-hoc filters, restricted to
//! columns the query's table actually has. The table's columns come from the
//! context's [`TableKeyResolver`](crate::metadata::TableKeyResolver), which is
//! the only asynchronous step in the whole engine.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::applier::{MacroApplier, MacroMatcher};
use super::args::MacroInvocation;
use crate::context::{AdHocFilter, Context, FilterOperator};
use crate::error::{MacroError, MacroResult};
use crate::sql::{quote_string_single, split_qualified, TRUE_CONDITION};

pub struct AdHocFilterApplier {
    matcher: MacroMatcher,
}

impl AdHocFilterApplier {
    pub fn new() -> Self {
        Self {
            matcher: MacroMatcher::new("$__adHocFilter"),
        }
    }
}

impl Default for AdHocFilterApplier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MacroApplier for AdHocFilterApplier {
    fn matcher(&self) -> &MacroMatcher {
        &self.matcher
    }

    async fn expand(
        &self,
        sql: &str,
        invocation: &MacroInvocation,
        ctx: &Context,
    ) -> MacroResult<String> {
        invocation.require_args(0)?;
        if ctx.filters.is_empty() {
            return Ok(TRUE_CONDITION.to_string());
        }

        let table = (ctx.table_fn)(sql).ok_or(MacroError::NoTable)?;
        let resolver = ctx.table_keys.as_ref().ok_or(MacroError::MissingTableKeys)?;
        let keys = resolver
            .table_keys(&table)
            .await
            .map_err(|source| MacroError::UnresolvableTable {
                table: table.clone(),
                source,
            })?;
        let allowed: HashSet<&str> = keys.iter().map(|k| k.value.as_str()).collect();

        let mut conditions = Vec::new();
        for filter in &ctx.filters {
            let Some(column) = filter_column(filter, &table) else {
                debug!(key = %filter.key, %table, "ad-hoc filter targets another table");
                continue;
            };
            if !allowed.contains(column) {
                warn!(column, %table, "ad-hoc filter column not found in table, skipping");
                continue;
            }
            conditions.push(render_condition(column, filter, ctx)?);
        }

        if conditions.is_empty() {
            Ok(TRUE_CONDITION.to_string())
        } else {
            Ok(conditions.join(" AND "))
        }
    }
}

/// The column a filter applies to on `table`, or `None` if it is qualified with another table.
///
/// A qualified key's table part may name the table exactly as the query does
/// (`db.events`) or without its database (`events`).
fn filter_column<'a>(filter: &'a AdHocFilter, table: &str) -> Option<&'a str> {
    match split_qualified(&filter.key) {
        None => Some(filter.key.as_str()),
        Some((key_table, column)) => {
            let bare_table = split_qualified(table).map_or(table, |(_, name)| name);
            (key_table == table || key_table == bare_table).then_some(column)
        }
    }
}

/// Render one filter as a boolean expression.
fn render_condition(column: &str, filter: &AdHocFilter, ctx: &Context) -> MacroResult<String> {
    let Some(value) = filter.value.as_deref() else {
        return match filter.operator {
            FilterOperator::Eq => Ok(format!("{column} IS NULL")),
            FilterOperator::NotEq => Ok(format!("{column} IS NOT NULL")),
            op => Err(MacroError::InvalidNullOperator {
                column: column.to_string(),
                operator: op.to_string(),
            }),
        };
    };

    let literal = quote_string_single(&ctx.replace(value));
    Ok(match filter.operator {
        FilterOperator::Like => format!("toString({column}) LIKE {literal}"),
        FilterOperator::NotLike => format!("toString({column}) NOT LIKE {literal}"),
        op => format!("{column} {op} {literal}"),
    })
}
