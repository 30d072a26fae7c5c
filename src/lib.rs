//! # chmacro
//!
//! Dashboard macro interpolation for ClickHouse SQL.
//!
//! ## Architecture
//!
//! A query written in a dashboard editor contains placeholders such as
//! `$__timeFilter(ts)` or `$__adHocFilter()`. Before it is sent to ClickHouse
//! every placeholder is expanded from the request context:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Raw SQL + Context (time range, interval,          │
//! │        template variables, ad-hoc filters)               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [MacrosService, fixed order]
//! ┌─────────────────────────────────────────────────────────┐
//! │  conditionalAll → adHocFilter → interval_s →             │
//! │  timeInterval(_ms) → timeFilter(_ms) → dateFilter →      │
//! │  dateTimeFilter/dt → toTime(_ms) → fromTime(_ms)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │        ▲
//!                          │        │ table keys (cached)
//!                          │   ┌────┴───────────────────┐
//!                          │   │ CachedMetadataProvider │
//!                          │   └────────────────────────┘
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Interpolated SQL                        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use chmacro::prelude::*;
//!
//! let ctx = Context::new()
//!     .with_time_range(TimeRange::from_millis(1_700_000_000_000, 1_700_003_600_000).unwrap())
//!     .with_interval_ms(60_000);
//!
//! let sql = apply_macros("SELECT $__timeInterval(ts), count() FROM t WHERE $__timeFilter(ts)", &ctx).await?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod macros;
pub mod metadata;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::context::{
        AdHocFilter, Context, FilterOperator, TemplateVariable, TimeRange, VariableValue,
        ALL_VALUE,
    };
    pub use crate::error::{MacroError, MacroResult};
    pub use crate::macros::{apply_macros, MacroApplier, MacrosService};
    pub use crate::metadata::{
        CachedMetadataProvider, MetadataProvider, StaticMetadataProvider, TableKey,
        TableKeyResolver,
    };
}

// Also export at crate root for convenience
pub use context::Context;
pub use error::{MacroError, MacroResult};
pub use macros::{apply_macros, MacrosService};
