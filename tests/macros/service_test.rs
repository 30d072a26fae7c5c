use chmacro::context::{Context, TemplateVariable, TimeRange, ALL_VALUE};
use chmacro::error::MacroError;
use chmacro::macros::{apply_macros, MacrosService};
use insta::assert_snapshot;

/// 2024-01-01T00:00:00Z .. 2024-01-01T06:00:00Z
fn range() -> TimeRange {
    TimeRange::from_millis(1_704_067_200_000, 1_704_088_800_000).unwrap()
}

fn ctx() -> Context {
    Context::new().with_time_range(range())
}

#[tokio::test]
async fn test_identity_for_plain_sql() {
    let queries = [
        "SELECT 1",
        "SELECT * FROM t WHERE name = '$__all' AND x = $x",
        "SELECT $__unknownMacro(ts) FROM t",
        "SELECT '$__' || '__timeFilter' FROM t",
    ];
    for sql in queries {
        assert_eq!(apply_macros(sql, &ctx()).await.unwrap(), sql);
        assert_eq!(apply_macros(sql, &Context::new()).await.unwrap(), sql);
    }
}

#[tokio::test]
async fn test_interval_s_example() {
    let out = apply_macros("SELECT $__interval_s() $__interval_s()", &Context::new())
        .await
        .unwrap();
    assert_eq!(out, "SELECT 1 1");
}

#[tokio::test]
async fn test_time_filter_bounds() {
    let out = apply_macros("SELECT * FROM t WHERE $__timeFilter(ts)", &ctx())
        .await
        .unwrap();
    assert_eq!(
        out,
        "SELECT * FROM t WHERE ts >= toDateTime(1704067200) AND ts <= toDateTime(1704088800)"
    );
}

#[tokio::test]
async fn test_time_filter_empty_parens_is_arity_error() {
    let err = apply_macros("SELECT * FROM t WHERE $__timeFilter()", &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, MacroError::Arity { .. }));
    assert!(err.to_string().contains("$__timeFilter"));
}

#[tokio::test]
async fn test_boundaries_require_time_range() {
    for sql in [
        "SELECT $__fromTime()",
        "SELECT $__toTime()",
        "SELECT $__fromTime_ms()",
        "SELECT $__toTime_ms()",
    ] {
        let err = apply_macros(sql, &Context::new()).await.unwrap_err();
        assert!(
            err.to_string()
                .contains("cannot apply macro(s) without time range"),
            "{sql}: {err}"
        );
        assert!(apply_macros(sql, &ctx()).await.is_ok());
    }
}

#[tokio::test]
async fn test_prefix_names_do_not_collide() {
    let sql = "SELECT $__timeInterval(ts), $__timeInterval_ms(ts) FROM t \
               WHERE $__timeFilter(ts) AND $__timeFilter_ms(ts) \
               AND $__fromTime() < $__fromTime_ms() AND $__toTime() > $__toTime_ms()";
    let out = apply_macros(sql, &ctx().with_interval_ms(60_000)).await.unwrap();
    assert_snapshot!(out, @"SELECT toStartOfInterval(toDateTime(ts), INTERVAL 60 second), toStartOfInterval(toDateTime64(ts, 3), INTERVAL 60000 millisecond) FROM t WHERE ts >= toDateTime(1704067200) AND ts <= toDateTime(1704088800) AND ts >= fromUnixTimestamp64Milli(1704067200000) AND ts <= fromUnixTimestamp64Milli(1704088800000) AND toDateTime(1704067200) < fromUnixTimestamp64Milli(1704067200000) AND toDateTime(1704088800) > fromUnixTimestamp64Milli(1704088800000)");
}

#[tokio::test]
async fn test_every_occurrence_expanded() {
    let sql = "SELECT $__timeFilter(a), $__timeFilter(b), $__timeFilter(c)";
    let out = apply_macros(sql, &Context::new()).await.unwrap();
    assert_eq!(out, "SELECT 1=1, 1=1, 1=1");
}

#[tokio::test]
async fn test_macro_like_text_in_replacement_terminates() {
    let ctx = ctx().with_template_vars(vec![TemplateVariable::new("v", "x")]);
    let out = apply_macros("$__conditionalAll($__timeFilterX = 1, $v)", &ctx)
        .await
        .unwrap();
    assert_eq!(out, "$__timeFilterX = 1");
}

#[tokio::test]
async fn test_conditional_all_with_inner_macros() {
    let sql = "SELECT * FROM t WHERE $__conditionalAll($__timeFilter(ts) AND host IN ($host), $host)";

    let selected = ctx().with_template_vars(vec![TemplateVariable::new("host", "web-1")]);
    let out = apply_macros(sql, &selected).await.unwrap();
    assert_eq!(
        out,
        "SELECT * FROM t WHERE ts >= toDateTime(1704067200) AND ts <= toDateTime(1704088800) \
         AND host IN ($host)"
    );

    let all = ctx().with_template_vars(vec![TemplateVariable::new("host", ALL_VALUE)]);
    let out = apply_macros(sql, &all).await.unwrap();
    assert_eq!(out, "SELECT * FROM t WHERE 1=1");
}

#[tokio::test]
async fn test_conditional_all_example() {
    let ctx = Context::new().with_template_vars(vec![TemplateVariable::new("bar", ALL_VALUE)]);
    let out = apply_macros(
        "SELECT * FROM t WHERE $__conditionalAll(bar in ($bar), $bar) LIMIT 10",
        &ctx,
    )
    .await
    .unwrap();
    assert_eq!(out, "SELECT * FROM t WHERE 1=1 LIMIT 10");
}

#[tokio::test]
async fn test_error_aborts_pipeline() {
    // The interval macro would expand fine, but the later boundary macro fails
    let err = apply_macros("SELECT $__interval_s(), $__fromTime()", &Context::new())
        .await
        .unwrap_err();
    assert_eq!(err.macro_name(), "$__fromTime");
}

#[tokio::test]
async fn test_dashboard_query() {
    let sql = "SELECT $__timeInterval(ts) AS t, count() FROM logs \
               WHERE $__dt(day, ts) AND $__conditionalAll(level = '$level', $level) \
               GROUP BY t ORDER BY t";
    let ctx = ctx()
        .with_interval_ms(300_000)
        .with_template_vars(vec![TemplateVariable::new("level", "error")]);

    let out = MacrosService::new().apply_macros(sql, &ctx).await.unwrap();
    assert_snapshot!(out, @"SELECT toStartOfInterval(toDateTime(ts), INTERVAL 300 second) AS t, count() FROM logs WHERE day >= toDate('2024-01-01') AND day <= toDate('2024-01-01') AND ts >= toDateTime(1704067200) AND ts <= toDateTime(1704088800) AND level = '$level' GROUP BY t ORDER BY t");
}
