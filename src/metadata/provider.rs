//! MetadataProvider and TableKeyResolver trait definitions.
//!
//! `MetadataProvider` abstracts over the backend that knows the schema.
//! `TableKeyResolver` is the narrow capability the ad-hoc filter applier
//! consumes: given a table name, which columns may be filtered on.

use async_trait::async_trait;
use thiserror::Error;

use super::types::*;

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors that can occur while fetching metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("table not found: {database}.{table}")]
    TableNotFound { database: String, table: String },

    /// The backend answered with an error.
    #[error("metadata source error: {0}")]
    Source(String),

    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse schema file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Trait for fetching database metadata.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// List all databases.
    async fn list_databases(&self) -> MetadataResult<Vec<DatabaseInfo>>;

    /// List all tables in a database.
    async fn list_tables(&self, database: &str) -> MetadataResult<Vec<TableInfo>>;

    /// List the columns of a table.
    async fn list_columns(&self, database: &str, table: &str) -> MetadataResult<Vec<ColumnInfo>>;
}

/// Resolves the filterable keys of a table.
///
/// Implementations must fail with a descriptive error if the table's schema
/// cannot be resolved.
#[async_trait]
pub trait TableKeyResolver: Send + Sync {
    async fn table_keys(&self, table: &str) -> MetadataResult<Vec<TableKey>>;
}
