use std::fs;
use std::sync::Arc;

use chmacro::context::{AdHocFilter, FilterOperator};
use chmacro::config::Settings;
use chmacro::macros::MacrosService;
use chmacro::metadata::{
    CachedMetadataProvider, MetadataError, MetadataProvider, StaticMetadataProvider, TableKey,
    TableKeyResolver,
};

const SCHEMA: &str = r#"
[[tables]]
name = "events"
columns = [
    { name = "ts", type = "DateTime" },
    { name = "level", type = "LowCardinality(String)" },
]

[[tables]]
database = "analytics"
name = "sessions"
columns = [{ name = "user_id", type = "UInt64" }]
"#;

#[tokio::test]
async fn test_schema_file_roundtrip_through_cache() {
    let path = std::env::temp_dir().join(format!("chmacro-schema-{}.toml", std::process::id()));
    fs::write(&path, SCHEMA).unwrap();

    let source = StaticMetadataProvider::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let provider = CachedMetadataProvider::new(source, "default");

    let tables = provider.list_tables("analytics").await.unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].qualified_name(), "analytics.sessions");

    let keys = provider.table_keys("events").await.unwrap();
    assert_eq!(
        keys,
        vec![
            TableKey::typed("ts", "DateTime"),
            TableKey::typed("level", "LowCardinality(String)"),
        ]
    );

    let keys = provider.table_keys("analytics.sessions").await.unwrap();
    assert_eq!(keys, vec![TableKey::typed("user_id", "UInt64")]);
}

#[tokio::test]
async fn test_missing_schema_file() {
    let err = StaticMetadataProvider::from_file("/nonexistent/schema.toml").unwrap_err();
    assert!(matches!(err, MetadataError::Io(_)));
}

#[tokio::test]
async fn test_settings_default_database_drives_resolution() {
    let settings: Settings = toml::from_str("[metadata]\ndefault_database = \"analytics\"").unwrap();
    let source = StaticMetadataProvider::from_toml_str(SCHEMA).unwrap();
    let provider = Arc::new(CachedMetadataProvider::new(
        source,
        settings.metadata.default_database.clone(),
    ));

    let ctx = settings
        .context_defaults()
        .with_filters(vec![AdHocFilter::new("user_id", FilterOperator::Eq, "42")])
        .with_table_keys(provider);

    let out = MacrosService::new()
        .apply_macros("SELECT count() FROM sessions WHERE $__adHocFilter()", &ctx)
        .await
        .unwrap();
    assert_eq!(out, "SELECT count() FROM sessions WHERE user_id = '42'");
}

#[tokio::test]
async fn test_concurrent_lookups_share_cache() {
    let source = StaticMetadataProvider::from_toml_str(SCHEMA).unwrap();
    let provider = Arc::new(CachedMetadataProvider::new(source, "default"));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let provider = provider.clone();
            tokio::spawn(async move { provider.table_keys("events").await })
        })
        .collect();

    for handle in handles {
        let keys = handle.await.unwrap().unwrap();
        assert_eq!(keys.len(), 2);
    }
}
