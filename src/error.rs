//! Error types for macro interpolation.

use thiserror::Error;

use crate::metadata::MetadataError;

/// Result type for macro operations.
pub type MacroResult<T> = Result<T, MacroError>;

/// Errors raised while expanding macros.
///
/// None of these are recovered inside the engine: the first error aborts the
/// remaining appliers and is returned to the caller verbatim.
#[derive(Debug, Error)]
pub enum MacroError {
    /// Wrong number of arguments, or an argument that must not be empty was empty.
    #[error("failed to apply macro {macro_name}: expected {expected}")]
    Arity {
        macro_name: &'static str,
        expected: &'static str,
    },

    /// A macro that needs the dashboard time range was used without one.
    #[error("cannot apply macro(s) without time range: {macro_name}")]
    MissingTimeRange { macro_name: &'static str },

    /// Ad-hoc filter compares NULL with an operator other than `=` / `!=`.
    #[error("operator {operator} cannot be applied to NULL value (column {column})")]
    InvalidNullOperator { column: String, operator: String },

    /// Ad-hoc filters are active but no table could be found in the query.
    #[error("cannot apply macro $__adHocFilter: unable to determine table from query")]
    NoTable,

    /// Ad-hoc filters are active but the context carries no table key resolver.
    #[error("cannot apply macro $__adHocFilter: no table key resolver configured")]
    MissingTableKeys,

    /// The metadata lookup for the query table failed.
    #[error("cannot apply macro $__adHocFilter: failed to resolve keys for table {table}: {source}")]
    UnresolvableTable {
        table: String,
        #[source]
        source: MetadataError,
    },

    /// An argument was present but could not be interpreted.
    #[error("failed to apply macro {macro_name}: {message}")]
    InvalidArgument {
        macro_name: &'static str,
        message: String,
    },
}

impl MacroError {
    pub fn arity(macro_name: &'static str, expected: &'static str) -> Self {
        Self::Arity {
            macro_name,
            expected,
        }
    }

    pub fn missing_time_range(macro_name: &'static str) -> Self {
        Self::MissingTimeRange { macro_name }
    }

    /// The macro this error is attributed to.
    pub fn macro_name(&self) -> &'static str {
        match self {
            Self::Arity { macro_name, .. }
            | Self::MissingTimeRange { macro_name }
            | Self::InvalidArgument { macro_name, .. } => macro_name,
            Self::InvalidNullOperator { .. }
            | Self::NoTable
            | Self::MissingTableKeys
            | Self::UnresolvableTable { .. } => "$__adHocFilter",
        }
    }
}
