//! Interval macros.
//!
//! The context interval is clamped to at least one unit so a zero interval
//! never produces `INTERVAL 0 second`.

use async_trait::async_trait;

use super::applier::{MacroApplier, MacroMatcher};
use super::args::MacroInvocation;
use super::time::Precision;
use crate::context::Context;
use crate::error::MacroResult;
use crate::sql::helpers::format_number;

/// `$__timeInterval(col)` / `$__timeInterval_ms(col)`: bucket a column by the query interval.
pub struct TimeIntervalApplier {
    matcher: MacroMatcher,
    precision: Precision,
}

impl TimeIntervalApplier {
    pub fn seconds() -> Self {
        Self {
            matcher: MacroMatcher::new("$__timeInterval"),
            precision: Precision::Seconds,
        }
    }

    pub fn millis() -> Self {
        Self {
            matcher: MacroMatcher::new("$__timeInterval_ms"),
            precision: Precision::Millis,
        }
    }
}

#[async_trait]
impl MacroApplier for TimeIntervalApplier {
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
        let column = args[0];

        Ok(match self.precision {
            Precision::Seconds => format!(
                "toStartOfInterval(toDateTime({column}), INTERVAL {} second)",
                format_number(ctx.interval_seconds())
            ),
            Precision::Millis => format!(
                "toStartOfInterval(toDateTime64({column}, 3), INTERVAL {} millisecond)",
                ctx.interval_millis()
            ),
        })
    }
}

/// `$__interval_s()`: the query interval in seconds.
pub struct IntervalSecondsApplier {
    matcher: MacroMatcher,
}

impl IntervalSecondsApplier {
    pub fn new() -> Self {
        Self {
            matcher: MacroMatcher::new("$__interval_s"),
        }
    }
}

impl Default for IntervalSecondsApplier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MacroApplier for IntervalSecondsApplier {
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
        Ok(format_number(ctx.interval_seconds()))
    }
}
