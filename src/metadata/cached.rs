//! Caching MetadataProvider wrapper.
//!
//! Entries are fetched once and kept for the lifetime of the provider; there
//! is no eviction. Two lookups racing on the same missing key both fetch and
//! the last insert wins, which is harmless since the values are identical.

use async_trait::async_trait;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::debug;

use super::provider::{MetadataProvider, MetadataResult, TableKeyResolver};
use super::types::{ColumnInfo, DatabaseInfo, TableInfo, TableKey};
use crate::sql::split_qualified;

/// MetadataProvider that memoizes another provider.
pub struct CachedMetadataProvider<P> {
    inner: P,
    default_database: String,
    databases: OnceCell<Vec<DatabaseInfo>>,
    tables: DashMap<String, Vec<TableInfo>>,
    columns: DashMap<(String, String), Vec<ColumnInfo>>,
    table_keys: DashMap<String, Vec<TableKey>>,
}

impl<P: MetadataProvider> CachedMetadataProvider<P> {
    /// Wrap a provider. Unqualified table names resolve against `default_database`.
    pub fn new(inner: P, default_database: impl Into<String>) -> Self {
        Self {
            inner,
            default_database: default_database.into(),
            databases: OnceCell::new(),
            tables: DashMap::new(),
            columns: DashMap::new(),
            table_keys: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.databases = OnceCell::new();
        self.tables.clear();
        self.columns.clear();
        self.table_keys.clear();
    }

    /// Split `db.table` into its parts, falling back to the default database.
    fn resolve_table<'a>(&'a self, table: &'a str) -> (&'a str, &'a str) {
        split_qualified(table).unwrap_or((self.default_database.as_str(), table))
    }
}

#[async_trait]
impl<P: MetadataProvider> MetadataProvider for CachedMetadataProvider<P> {
    async fn list_databases(&self) -> MetadataResult<Vec<DatabaseInfo>> {
        if let Some(cached) = self.databases.get() {
            return Ok(cached.clone());
        }

        let databases = self.inner.list_databases().await?;
        let _ = self.databases.set(databases.clone());
        Ok(databases)
    }

    async fn list_tables(&self, database: &str) -> MetadataResult<Vec<TableInfo>> {
        let cached = self.tables.get(database).map(|e| e.value().clone());
        if let Some(tables) = cached {
            return Ok(tables);
        }

        let tables = self.inner.list_tables(database).await?;
        self.tables.insert(database.to_string(), tables.clone());
        Ok(tables)
    }

    async fn list_columns(&self, database: &str, table: &str) -> MetadataResult<Vec<ColumnInfo>> {
        let key = (database.to_string(), table.to_string());
        let cached = self.columns.get(&key).map(|e| e.value().clone());
        if let Some(columns) = cached {
            return Ok(columns);
        }

        let columns = self.inner.list_columns(database, table).await?;
        self.columns.insert(key, columns.clone());
        Ok(columns)
    }
}

#[async_trait]
impl<P: MetadataProvider> TableKeyResolver for CachedMetadataProvider<P> {
    async fn table_keys(&self, table: &str) -> MetadataResult<Vec<TableKey>> {
        let cached = self.table_keys.get(table).map(|e| e.value().clone());
        if let Some(keys) = cached {
            debug!(table, "table keys cache hit");
            return Ok(keys);
        }

        debug!(table, "table keys cache miss");
        let (database, name) = self.resolve_table(table);
        let keys: Vec<TableKey> = self
            .list_columns(database, name)
            .await?
            .into_iter()
            .map(TableKey::from)
            .collect();

        self.table_keys.insert(table.to_string(), keys.clone());
        Ok(keys)
    }
}
