//! Metadata value types.

use serde::{Deserialize, Serialize};

/// A database visible to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub name: String,
}

/// A table within a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub database: String,
    pub name: String,
}

impl TableInfo {
    /// `database.name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }
}

/// A column and its backend type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A filterable column as handed to the ad-hoc filter applier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableKey {
    /// Column name.
    pub value: String,
    /// Backend column type, when known.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
}

impl TableKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            key_type: None,
        }
    }

    pub fn typed(value: impl Into<String>, key_type: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            key_type: Some(key_type.into()),
        }
    }
}

impl From<ColumnInfo> for TableKey {
    fn from(column: ColumnInfo) -> Self {
        Self {
            value: column.name,
            key_type: Some(column.data_type),
        }
    }
}
