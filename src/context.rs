//! Per-request interpolation context.
//!
//! A [`Context`] bundles everything a macro may need to expand: the dashboard
//! time range, the query interval, template variables, ad-hoc filters and the
//! collaborators used to resolve filterable columns. It is built once per
//! query execution and never mutated by the engine; derivations go through the
//! `with_*` builders on a clone.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::TableKeyResolver;
use crate::sql;

/// Default value Grafana-style dashboards use to mean "all values selected".
pub const ALL_VALUE: &str = "$__all";

/// Generic `$var` substitution supplied by the caller.
pub type ReplaceFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Extracts the primary table identifier from a SQL statement.
pub type TableFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

// ============================================================================
// Time range
// ============================================================================

/// Absolute dashboard time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Build a range from Unix millisecond timestamps.
    pub fn from_millis(from: i64, to: i64) -> Option<Self> {
        Some(Self {
            from: Utc.timestamp_millis_opt(from).single()?,
            to: Utc.timestamp_millis_opt(to).single()?,
        })
    }

    pub fn from_seconds(&self) -> i64 {
        self.from.timestamp()
    }

    pub fn to_seconds(&self) -> i64 {
        self.to.timestamp()
    }

    /// `from` as Unix seconds with the millisecond part kept as a fraction.
    pub fn from_seconds_fractional(&self) -> f64 {
        self.from.timestamp_millis() as f64 / 1000.0
    }

    /// `to` as Unix seconds with the millisecond part kept as a fraction.
    pub fn to_seconds_fractional(&self) -> f64 {
        self.to.timestamp_millis() as f64 / 1000.0
    }

    pub fn from_millis_ts(&self) -> i64 {
        self.from.timestamp_millis()
    }

    pub fn to_millis_ts(&self) -> i64 {
        self.to.timestamp_millis()
    }

    /// `from` formatted as `YYYY-MM-DD`.
    pub fn from_date(&self) -> String {
        self.from.format("%Y-%m-%d").to_string()
    }

    /// `to` formatted as `YYYY-MM-DD`.
    pub fn to_date(&self) -> String {
        self.to.format("%Y-%m-%d").to_string()
    }
}

// ============================================================================
// Template variables
// ============================================================================

/// Current value of a template variable: one value or a multi-select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Single(String),
    Multi(Vec<String>),
}

impl VariableValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(v) => v.is_empty(),
            Self::Multi(values) => values.is_empty() || values.iter().all(String::is_empty),
        }
    }

    /// True if the value is (or contains) the given sentinel.
    pub fn is_all(&self, all_value: &str) -> bool {
        match self {
            Self::Single(v) => v == all_value,
            Self::Multi(values) => values.iter().any(|v| v == all_value),
        }
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for VariableValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

/// The `current` block of a template variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentValue {
    pub value: VariableValue,
}

/// A dashboard-scoped named value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVariable {
    pub name: String,
    pub current: CurrentValue,
}

impl TemplateVariable {
    pub fn new(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self {
            name: name.into(),
            current: CurrentValue {
                value: value.into(),
            },
        }
    }
}

// ============================================================================
// Ad-hoc filters
// ============================================================================

/// Comparison operators accepted in ad-hoc filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "=~")]
    Like,
    #[serde(rename = "!~")]
    NotLike,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Like => "=~",
            Self::NotLike => "!~",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Self::Eq),
            "!=" => Ok(Self::NotEq),
            "<" => Ok(Self::Lt),
            ">" => Ok(Self::Gt),
            "<=" => Ok(Self::LtEq),
            ">=" => Ok(Self::GtEq),
            "=~" => Ok(Self::Like),
            "!~" => Ok(Self::NotLike),
            other => Err(format!("unknown filter operator: {}", other)),
        }
    }
}

/// A dashboard-level key/operator/value triple. `value: None` is SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdHocFilter {
    pub key: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Option<String>,
}

impl AdHocFilter {
    pub fn new(key: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator,
            value: Some(value.into()),
        }
    }

    pub fn null(key: impl Into<String>, operator: FilterOperator) -> Self {
        Self {
            key: key.into(),
            operator,
            value: None,
        }
    }
}

// ============================================================================
// Context
// ============================================================================

/// Everything the appliers can read while expanding one query.
#[derive(Clone)]
pub struct Context {
    pub time_range: Option<TimeRange>,
    pub interval_ms: u64,
    pub template_vars: Vec<TemplateVariable>,
    pub filters: Vec<AdHocFilter>,
    pub table_keys: Option<Arc<dyn TableKeyResolver>>,
    pub table_fn: TableFn,
    pub replace_fn: Option<ReplaceFn>,
    pub all_value: String,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            time_range: None,
            interval_ms: 0,
            template_vars: Vec::new(),
            filters: Vec::new(),
            table_keys: None,
            table_fn: Arc::new(sql::extract_table),
            replace_fn: None,
            all_value: ALL_VALUE.to_string(),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("time_range", &self.time_range)
            .field("interval_ms", &self.interval_ms)
            .field("template_vars", &self.template_vars)
            .field("filters", &self.filters)
            .field("table_keys", &self.table_keys.is_some())
            .field("replace_fn", &self.replace_fn.is_some())
            .field("all_value", &self.all_value)
            .finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_template_vars(mut self, vars: Vec<TemplateVariable>) -> Self {
        self.template_vars = vars;
        self
    }

    pub fn with_filters(mut self, filters: Vec<AdHocFilter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_table_keys(mut self, resolver: Arc<dyn TableKeyResolver>) -> Self {
        self.table_keys = Some(resolver);
        self
    }

    pub fn with_table_fn<F>(mut self, table_fn: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.table_fn = Arc::new(table_fn);
        self
    }

    pub fn with_replace_fn<F>(mut self, replace_fn: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.replace_fn = Some(Arc::new(replace_fn));
        self
    }

    pub fn with_all_value(mut self, all_value: impl Into<String>) -> Self {
        self.all_value = all_value.into();
        self
    }

    /// Interval in seconds, never below one.
    pub fn interval_seconds(&self) -> f64 {
        (self.interval_ms as f64 / 1000.0).max(1.0)
    }

    /// Interval in milliseconds, never below one.
    pub fn interval_millis(&self) -> u64 {
        self.interval_ms.max(1)
    }

    /// Look up a template variable by exact name.
    pub fn variable(&self, name: &str) -> Option<&TemplateVariable> {
        self.template_vars.iter().find(|v| v.name == name)
    }

    /// Run the caller's substitution, or return the text unchanged.
    pub fn replace(&self, text: &str) -> String {
        match &self.replace_fn {
            Some(replace) => replace(text),
            None => text.to_string(),
        }
    }
}

/// Serializable description of a request, used by the CLI's `--context` flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    pub time_range: Option<TimeRange>,
    pub interval_ms: u64,
    pub template_vars: Vec<TemplateVariable>,
    pub filters: Vec<AdHocFilter>,
}

impl RequestContext {
    /// Layer the request values over a base context.
    pub fn apply_to(self, base: Context) -> Context {
        let mut ctx = base
            .with_interval_ms(self.interval_ms)
            .with_template_vars(self.template_vars)
            .with_filters(self.filters);
        ctx.time_range = self.time_range;
        ctx
    }
}
