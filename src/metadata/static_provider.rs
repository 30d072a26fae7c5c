//! In-memory MetadataProvider loaded from a TOML schema file.
//!
//! Example schema file:
//! ```toml
//! [[tables]]
//! database = "default"
//! name = "events"
//! columns = [
//!     { name = "ts", type = "DateTime" },
//!     { name = "level", type = "LowCardinality(String)" },
//! ]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::{MetadataError, MetadataProvider, MetadataResult};
use super::types::{ColumnInfo, DatabaseInfo, TableInfo};

fn default_database() -> String {
    "default".to_string()
}

/// One table entry of a schema file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default = "default_database")]
    pub database: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

/// Root of a schema file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

/// MetadataProvider serving a fixed schema.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadataProvider {
    /// database -> table -> columns
    databases: BTreeMap<String, BTreeMap<String, Vec<ColumnInfo>>>,
}

impl StaticMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a provider from a TOML schema file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> MetadataResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> MetadataResult<Self> {
        let schema: SchemaFile = toml::from_str(content)?;
        Ok(Self::from_schema(schema))
    }

    pub fn from_schema(schema: SchemaFile) -> Self {
        schema
            .tables
            .into_iter()
            .fold(Self::new(), |provider, table| {
                provider.with_table(table.database, table.name, table.columns)
            })
    }

    /// Add (or replace) a table.
    pub fn with_table(
        mut self,
        database: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<ColumnInfo>,
    ) -> Self {
        self.databases
            .entry(database.into())
            .or_default()
            .insert(table.into(), columns);
        self
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadataProvider {
    async fn list_databases(&self) -> MetadataResult<Vec<DatabaseInfo>> {
        Ok(self
            .databases
            .keys()
            .map(|name| DatabaseInfo { name: name.clone() })
            .collect())
    }

    async fn list_tables(&self, database: &str) -> MetadataResult<Vec<TableInfo>> {
        let tables = self
            .databases
            .get(database)
            .ok_or_else(|| MetadataError::DatabaseNotFound(database.to_string()))?;

        Ok(tables
            .keys()
            .map(|name| TableInfo {
                database: database.to_string(),
                name: name.clone(),
            })
            .collect())
    }

    async fn list_columns(&self, database: &str, table: &str) -> MetadataResult<Vec<ColumnInfo>> {
        self.databases
            .get(database)
            .and_then(|tables| tables.get(table))
            .cloned()
            .ok_or_else(|| MetadataError::TableNotFound {
                database: database.to_string(),
                table: table.to_string(),
            })
    }
}
