//! Time range macros.
//!
//! | Macro | Expands to |
//! |-------|-----------|
//! | `$__fromTime` / `$__toTime` | `toDateTime(<unix seconds, fractional>)` |
//! | `$__fromTime_ms` / `$__toTime_ms` | `fromUnixTimestamp64Milli(<unix ms>)` |
//! | `$__timeFilter(col)` | `col >= toDateTime(..) AND col <= toDateTime(..)` |
//! | `$__timeFilter_ms(col)` | same with millisecond precision |
//! | `$__dateFilter(col)` | `col >= toDate('YYYY-MM-DD') AND col <= toDate(..)` |
//! | `$__dateTimeFilter(d, t)` / `$__dt(d, t)` | date filter on `d` AND time filter on `t` |
//!
//! The boundary macros need a time range and fail without one. The filter
//! macros fall back to `1=1`.

use async_trait::async_trait;

use super::applier::{MacroApplier, MacroMatcher};
use super::args::MacroInvocation;
use crate::context::{Context, TimeRange};
use crate::error::{MacroError, MacroResult};
use crate::sql::helpers::format_number;
use crate::sql::{quote_string_single, TRUE_CONDITION};

/// Timestamp precision a macro renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Seconds,
    Millis,
}

impl Precision {
    fn lower_bound(self, range: &TimeRange) -> String {
        match self {
            Precision::Seconds => format!("toDateTime({})", range.from_seconds()),
            Precision::Millis => format!("fromUnixTimestamp64Milli({})", range.from_millis_ts()),
        }
    }

    fn upper_bound(self, range: &TimeRange) -> String {
        match self {
            Precision::Seconds => format!("toDateTime({})", range.to_seconds()),
            Precision::Millis => format!("fromUnixTimestamp64Milli({})", range.to_millis_ts()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    From,
    To,
}

// ============================================================================
// $__fromTime, $__toTime and _ms variants
// ============================================================================

/// One end of the time range as a timestamp literal.
pub struct TimeBoundaryApplier {
    matcher: MacroMatcher,
    boundary: Boundary,
    precision: Precision,
}

impl TimeBoundaryApplier {
    pub fn from_time() -> Self {
        Self::build("$__fromTime", Boundary::From, Precision::Seconds)
    }

    pub fn to_time() -> Self {
        Self::build("$__toTime", Boundary::To, Precision::Seconds)
    }

    pub fn from_time_ms() -> Self {
        Self::build("$__fromTime_ms", Boundary::From, Precision::Millis)
    }

    pub fn to_time_ms() -> Self {
        Self::build("$__toTime_ms", Boundary::To, Precision::Millis)
    }

    fn build(name: &'static str, boundary: Boundary, precision: Precision) -> Self {
        Self {
            matcher: MacroMatcher::new(name),
            boundary,
            precision,
        }
    }
}

#[async_trait]
impl MacroApplier for TimeBoundaryApplier {
    fn matcher(&self) -> &MacroMatcher {
        &self.matcher
    }

    async fn expand(
        &self,
        _sql: &str,
        invocation: &MacroInvocation,
        ctx: &Context,
    ) -> MacroResult<String> {
        invocation.require_args(0)?;
        let range = ctx
            .time_range
            .as_ref()
            .ok_or_else(|| MacroError::missing_time_range(invocation.name))?;

        // Boundaries keep sub-second precision; the filters use whole seconds.
        Ok(match (self.precision, self.boundary) {
            (Precision::Seconds, Boundary::From) => {
                format!("toDateTime({})", format_number(range.from_seconds_fractional()))
            }
            (Precision::Seconds, Boundary::To) => {
                format!("toDateTime({})", format_number(range.to_seconds_fractional()))
            }
            (Precision::Millis, Boundary::From) => self.precision.lower_bound(range),
            (Precision::Millis, Boundary::To) => self.precision.upper_bound(range),
        })
    }
}

// ============================================================================
// $__timeFilter, $__timeFilter_ms
// ============================================================================

/// `col >= <from> AND col <= <to>`.
pub struct TimeFilterApplier {
    matcher: MacroMatcher,
    precision: Precision,
}

impl TimeFilterApplier {
    pub fn seconds() -> Self {
        Self {
            matcher: MacroMatcher::new("$__timeFilter"),
            precision: Precision::Seconds,
        }
    }

    pub fn millis() -> Self {
        Self {
            matcher: MacroMatcher::new("$__timeFilter_ms"),
            precision: Precision::Millis,
        }
    }

    /// The filter condition for `column`, or `1=1` without a time range.
    pub fn condition(&self, column: &str, range: Option<&TimeRange>) -> String {
        match range {
            Some(range) => format!(
                "{column} >= {} AND {column} <= {}",
                self.precision.lower_bound(range),
                self.precision.upper_bound(range),
            ),
            None => TRUE_CONDITION.to_string(),
        }
    }
}

#[async_trait]
impl MacroApplier for TimeFilterApplier {
    fn matcher(&self) -> &MacroMatcher {
        &self.matcher
    }

    async fn expand(
        &self,
        _sql: &str,
        invocation: &MacroInvocation,
        ctx: &Context,
    ) -> MacroResult<String> {
        let args = invocation.require_args(1)?;
        Ok(self.condition(args[0], ctx.time_range.as_ref()))
    }
}

// ============================================================================
// $__dateFilter
// ============================================================================

/// `col >= toDate('<from>') AND col <= toDate('<to>')`.
pub struct DateFilterApplier {
    matcher: MacroMatcher,
}

impl DateFilterApplier {
    pub fn new() -> Self {
        Self {
            matcher: MacroMatcher::new("$__dateFilter"),
        }
    }

    pub fn condition(&self, column: &str, range: Option<&TimeRange>) -> String {
        match range {
            Some(range) => format!(
                "{column} >= toDate({}) AND {column} <= toDate({})",
                quote_string_single(&range.from_date()),
                quote_string_single(&range.to_date()),
            ),
            None => TRUE_CONDITION.to_string(),
        }
    }
}

impl Default for DateFilterApplier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MacroApplier for DateFilterApplier {
    fn matcher(&self) -> &MacroMatcher {
        &self.matcher
    }

    async fn expand(
        &self,
        _sql: &str,
        invocation: &MacroInvocation,
        ctx: &Context,
    ) -> MacroResult<String> {
        let args = invocation.require_args(1)?;
        Ok(self.condition(args[0], ctx.time_range.as_ref()))
    }
}

// ============================================================================
// $__dateTimeFilter, $__dt
// ============================================================================

/// Date filter on the first column AND time filter on the second.
pub struct DateTimeFilterApplier {
    matcher: MacroMatcher,
    date_filter: DateFilterApplier,
    time_filter: TimeFilterApplier,
}

impl DateTimeFilterApplier {
    pub fn new() -> Self {
        Self::named("$__dateTimeFilter")
    }

    /// The `$__dt` short-hand.
    pub fn short_hand() -> Self {
        Self::named("$__dt")
    }

    fn named(name: &'static str) -> Self {
        Self {
            matcher: MacroMatcher::new(name),
            date_filter: DateFilterApplier::new(),
            time_filter: TimeFilterApplier::seconds(),
        }
    }
}

impl Default for DateTimeFilterApplier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MacroApplier for DateTimeFilterApplier {
    fn matcher(&self) -> &MacroMatcher {
        &self.matcher
    }

    async fn expand(
        &self,
        _sql: &str,
        invocation: &MacroInvocation,
        ctx: &Context,
    ) -> MacroResult<String> {
        let args = invocation.require_args(2)?;
        let Some(range) = ctx.time_range.as_ref() else {
            return Ok(TRUE_CONDITION.to_string());
        };

        Ok(format!(
            "{} AND {}",
            self.date_filter.condition(args[0], Some(range)),
            self.time_filter.condition(args[1], Some(range)),
        ))
    }
}
