//! Macro interpolation engine.
//!
//! Each macro is a [`MacroApplier`]: it finds its own `$__name(...)`
//! occurrences, validates the arguments and rewrites them into SQL using the
//! request [`Context`](crate::context::Context). [`MacrosService`] runs the
//! appliers in a fixed order, threading the query through each.
//!
//! - [`args`] - argument list parsing
//! - [`applier`] - the applier trait and name matching
//! - [`time`] - time range, time filter and date filter macros
//! - [`interval`] - interval macros
//! - [`conditional`] - `$__conditionalAll`
//! - [`adhoc`] - `$__adHocFilter`
//! - [`service`] - the registry

pub mod adhoc;
pub mod applier;
pub mod args;
pub mod conditional;
pub mod interval;
pub mod service;
pub mod time;

pub use adhoc::AdHocFilterApplier;
pub use applier::{MacroApplier, MacroMatcher};
pub use args::{parse_args, MacroInvocation, ParsedArgs};
pub use conditional::ConditionalAllApplier;
pub use interval::{IntervalSecondsApplier, TimeIntervalApplier};
pub use service::{apply_macros, MacrosService};
pub use time::{
    DateFilterApplier, DateTimeFilterApplier, Precision, TimeBoundaryApplier, TimeFilterApplier,
};
