//! Metadata provider module.
//!
//! The ad-hoc filter macro needs the list of columns a query's table exposes.
//! This module abstracts over where that list comes from and caches it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  CachedMetadataProvider<P>                      │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │  DashMap caches (append-only, provider lifetime)          │  │
//! │  │  - databases   - tables/{db}   - columns/{db}.{table}     │  │
//! │  │  - table keys/{table}                                     │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │ miss
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            MetadataProvider (e.g. StaticMetadataProvider)       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use chmacro::metadata::{CachedMetadataProvider, StaticMetadataProvider, TableKeyResolver};
//!
//! let source = StaticMetadataProvider::from_file("schema.toml")?;
//! let provider = CachedMetadataProvider::new(source, "default");
//!
//! // First call hits the source, later calls are served from the cache
//! let keys = provider.table_keys("events").await?;
//! ```

mod cached;
mod provider;
mod static_provider;
mod types;

pub use cached::CachedMetadataProvider;
pub use provider::{MetadataError, MetadataProvider, MetadataResult, TableKeyResolver};
pub use static_provider::{SchemaFile, StaticMetadataProvider, TableSchema};
pub use types::*;
