//! The macro registry.
//!
//! [`MacrosService`] owns the appliers in a fixed order and folds the SQL
//! through them one after another. Order matters: `$__conditionalAll` runs
//! first so a dropped condition never triggers the macros inside it, and the
//! ad-hoc filter looks at the query before time macros rewrite it.

use std::sync::LazyLock;

use tracing::debug;

use super::adhoc::AdHocFilterApplier;
use super::applier::MacroApplier;
use super::conditional::ConditionalAllApplier;
use super::interval::{IntervalSecondsApplier, TimeIntervalApplier};
use super::time::{DateFilterApplier, DateTimeFilterApplier, TimeBoundaryApplier, TimeFilterApplier};
use crate::context::Context;
use crate::error::MacroResult;

static DEFAULT_SERVICE: LazyLock<MacrosService> = LazyLock::new(MacrosService::new);

/// Expand all macros in `sql` with the default registry.
pub async fn apply_macros(sql: &str, ctx: &Context) -> MacroResult<String> {
    DEFAULT_SERVICE.apply_macros(sql, ctx).await
}

/// Ordered collection of macro appliers.
pub struct MacrosService {
    appliers: Vec<Box<dyn MacroApplier>>,
}

impl MacrosService {
    /// The registry with every built-in macro.
    pub fn new() -> Self {
        Self::with_appliers(vec![
            Box::new(ConditionalAllApplier::new()),
            Box::new(AdHocFilterApplier::new()),
            Box::new(IntervalSecondsApplier::new()),
            Box::new(TimeIntervalApplier::seconds()),
            Box::new(TimeIntervalApplier::millis()),
            Box::new(TimeFilterApplier::seconds()),
            Box::new(TimeFilterApplier::millis()),
            Box::new(DateFilterApplier::new()),
            Box::new(DateTimeFilterApplier::new()),
            Box::new(DateTimeFilterApplier::short_hand()),
            Box::new(TimeBoundaryApplier::to_time()),
            Box::new(TimeBoundaryApplier::to_time_ms()),
            Box::new(TimeBoundaryApplier::from_time()),
            Box::new(TimeBoundaryApplier::from_time_ms()),
        ])
    }

    /// A registry with a custom set of appliers, applied in the given order.
    pub fn with_appliers(appliers: Vec<Box<dyn MacroApplier>>) -> Self {
        Self { appliers }
    }

    /// Append an applier; it runs after all existing ones.
    pub fn register(&mut self, applier: Box<dyn MacroApplier>) {
        self.appliers.push(applier);
    }

    /// Macro names in application order.
    pub fn macro_names(&self) -> Vec<&'static str> {
        self.appliers.iter().map(|a| a.macro_name()).collect()
    }

    /// Expand every registered macro in `sql`.
    ///
    /// Stops at the first failing macro; there is no partial result.
    pub async fn apply_macros(&self, sql: &str, ctx: &Context) -> MacroResult<String> {
        let mut sql = sql.to_string();
        for applier in &self.appliers {
            sql = applier.apply_all(sql, ctx).await?;
        }
        debug!(%sql, "interpolated query");
        Ok(sql)
    }
}

impl Default for MacrosService {
    fn default() -> Self {
        Self::new()
    }
}
