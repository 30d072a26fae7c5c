use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chmacro::context::{AdHocFilter, Context, FilterOperator, TimeRange};
use chmacro::error::MacroError;
use chmacro::macros::apply_macros;
use chmacro::metadata::{
    CachedMetadataProvider, ColumnInfo, DatabaseInfo, MetadataProvider, MetadataResult,
    StaticMetadataProvider, TableInfo,
};

/// Provider that counts column lookups so cache behaviour is observable.
struct CountingProvider {
    inner: StaticMetadataProvider,
    column_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl MetadataProvider for CountingProvider {
    async fn list_databases(&self) -> MetadataResult<Vec<DatabaseInfo>> {
        self.inner.list_databases().await
    }

    async fn list_tables(&self, database: &str) -> MetadataResult<Vec<TableInfo>> {
        self.inner.list_tables(database).await
    }

    async fn list_columns(&self, database: &str, table: &str) -> MetadataResult<Vec<ColumnInfo>> {
        self.column_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_columns(database, table).await
    }
}

fn provider() -> (Arc<CachedMetadataProvider<CountingProvider>>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = StaticMetadataProvider::new()
        .with_table(
            "default",
            "t",
            vec![
                ColumnInfo::new("column1", "String"),
                ColumnInfo::new("column2", "UInt32"),
            ],
        )
        .with_table(
            "logs",
            "access",
            vec![ColumnInfo::new("path", "String"), ColumnInfo::new("status", "UInt16")],
        );
    let provider = CachedMetadataProvider::new(
        CountingProvider {
            inner: source,
            column_calls: calls.clone(),
        },
        "default",
    );
    (Arc::new(provider), calls)
}

#[tokio::test]
async fn test_adhoc_filter_example() {
    let (provider, _) = provider();
    let ctx = Context::new()
        .with_filters(vec![AdHocFilter::new("column1", FilterOperator::Eq, "value")])
        .with_table_keys(provider);

    let out = apply_macros("SELECT * FROM t WHERE $__adHocFilter()", &ctx)
        .await
        .unwrap();
    assert_eq!(out, "SELECT * FROM t WHERE column1 = 'value'");
}

#[tokio::test]
async fn test_filter_value_repeating_the_macro_terminates() {
    let (provider, _) = provider();
    let ctx = Context::new()
        .with_filters(vec![AdHocFilter::new(
            "column1",
            FilterOperator::Eq,
            "$__adHocFilter()",
        )])
        .with_table_keys(provider);

    let out = apply_macros(
        "SELECT * FROM t WHERE $__adHocFilter() OR $__adHocFilter()",
        &ctx,
    )
    .await
    .unwrap();
    assert_eq!(
        out,
        "SELECT * FROM t WHERE column1 = '$__adHocFilter()' OR column1 = '$__adHocFilter()'"
    );
}

#[tokio::test]
async fn test_table_keys_fetched_once_per_provider() {
    let (provider, calls) = provider();
    let ctx = Context::new()
        .with_filters(vec![AdHocFilter::new("column2", FilterOperator::Gt, "3")])
        .with_table_keys(provider.clone());

    let sql = "SELECT * FROM t WHERE $__adHocFilter() UNION ALL SELECT * FROM t WHERE $__adHocFilter()";
    let out = apply_macros(sql, &ctx).await.unwrap();
    assert_eq!(
        out,
        "SELECT * FROM t WHERE column2 > '3' UNION ALL SELECT * FROM t WHERE column2 > '3'"
    );

    // A second request against the same provider is served from the cache
    apply_macros("SELECT * FROM t WHERE $__adHocFilter()", &ctx)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_allow_list_enforced() {
    let (provider, _) = provider();
    let ctx = Context::new()
        .with_filters(vec![
            AdHocFilter::new("status", FilterOperator::GtEq, "500"),
            AdHocFilter::new("column1", FilterOperator::Eq, "not-in-access"),
            AdHocFilter::new("access.path", FilterOperator::Like, "/api/%"),
            AdHocFilter::new("t.column2", FilterOperator::Eq, "other-table"),
        ])
        .with_table_keys(provider);

    let out = apply_macros("SELECT * FROM logs.access WHERE $__adHocFilter()", &ctx)
        .await
        .unwrap();
    assert_eq!(
        out,
        "SELECT * FROM logs.access WHERE status >= '500' AND toString(path) LIKE '/api/%'"
    );
}

#[tokio::test]
async fn test_all_filters_disallowed() {
    let (provider, _) = provider();
    let ctx = Context::new()
        .with_filters(vec![AdHocFilter::new("nope", FilterOperator::Eq, "x")])
        .with_table_keys(provider);

    let out = apply_macros("SELECT * FROM t WHERE $__adHocFilter()", &ctx)
        .await
        .unwrap();
    assert_eq!(out, "SELECT * FROM t WHERE 1=1");
}

#[tokio::test]
async fn test_unknown_table_is_fatal() {
    let (provider, _) = provider();
    let ctx = Context::new()
        .with_time_range(TimeRange::from_millis(0, 1000).unwrap())
        .with_filters(vec![AdHocFilter::new("column1", FilterOperator::Eq, "x")])
        .with_table_keys(provider);

    let err = apply_macros(
        "SELECT * FROM nowhere WHERE $__adHocFilter() AND $__timeFilter(ts)",
        &ctx,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, MacroError::UnresolvableTable { .. }));
    assert!(err.to_string().contains("nowhere"));
}

#[tokio::test]
async fn test_null_operator_error_names_column() {
    let (provider, _) = provider();
    let ctx = Context::new()
        .with_filters(vec![AdHocFilter::null("column1", FilterOperator::Like)])
        .with_table_keys(provider);

    let err = apply_macros("SELECT * FROM t WHERE $__adHocFilter()", &ctx)
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("cannot be applied to NULL value"));
    assert!(message.contains("column1"));
    assert!(message.contains("=~"));
}
