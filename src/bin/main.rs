//! chmacro CLI - Expand dashboard macros in ClickHouse SQL
//!
//! Usage:
//!   chmacro expand [file.sql] [--from <time>] [--to <time>] [--interval-ms <ms>]
//!                  [--var name=value]... [--filter "key op value"]...
//!                  [--schema <schema.toml>] [--context <request.json>]
//!   chmacro macros
//!
//! Examples:
//!   chmacro expand query.sql --from 2024-01-01T00:00:00Z --to 2024-01-02T00:00:00Z
//!   echo 'SELECT $__interval_s()' | chmacro expand --interval-ms 30000
//!   chmacro expand query.sql --schema schema.toml --filter "level = error"

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chmacro::config::Settings;
use chmacro::context::{
    AdHocFilter, Context, FilterOperator, RequestContext, TemplateVariable, TimeRange,
    VariableValue,
};
use chmacro::macros::MacrosService;
use chmacro::metadata::{CachedMetadataProvider, StaticMetadataProvider};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chmacro")]
#[command(about = "chmacro - Expand dashboard macros in ClickHouse SQL")]
#[command(version)]
struct Cli {
    /// Path to a chmacro.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand the macros in a query
    Expand(ExpandArgs),

    /// List the supported macros in application order
    Macros,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings);

    match cli.command {
        Commands::Expand(args) => match cmd_expand(&settings, args).await {
            Ok(sql) => {
                println!("{}", sql);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Macros => {
            for name in MacrosService::new().macro_names() {
                println!("{}", name);
            }
            ExitCode::SUCCESS
        }
    }
}

#[derive(Args)]
struct ExpandArgs {
    /// Path to the SQL file (reads stdin if not specified)
    file: Option<PathBuf>,

    /// Start of the time range (RFC 3339 or unix milliseconds)
    #[arg(long, requires = "to")]
    from: Option<String>,

    /// End of the time range (RFC 3339 or unix milliseconds)
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// Query interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Template variable as name=value (comma separated for multi-value)
    #[arg(long = "var")]
    vars: Vec<String>,

    /// Ad-hoc filter as "key op value" (value NULL for SQL NULL)
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Schema file listing filterable columns per table
    #[arg(long)]
    schema: Option<PathBuf>,

    /// JSON file describing the request context
    #[arg(long)]
    context: Option<PathBuf>,
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, chmacro::config::SettingsError> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

async fn cmd_expand(settings: &Settings, args: ExpandArgs) -> Result<String, String> {
    let sql = match &args.file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("reading file '{}': {}", path.display(), e))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("reading stdin: {}", e))?;
            buf
        }
    };

    let ctx = build_context(settings, &args)?;
    debug!(?ctx, "expanding query");

    MacrosService::new()
        .apply_macros(sql.trim_end(), &ctx)
        .await
        .map_err(|e| e.to_string())
}

fn build_context(settings: &Settings, args: &ExpandArgs) -> Result<Context, String> {
    let mut ctx = settings.context_defaults();

    if let Some(path) = &args.context {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("reading context '{}': {}", path.display(), e))?;
        let request: RequestContext = serde_json::from_str(&content)
            .map_err(|e| format!("parsing context '{}': {}", path.display(), e))?;
        ctx = request.apply_to(ctx);
    }

    if let (Some(from), Some(to)) = (&args.from, &args.to) {
        ctx = ctx.with_time_range(TimeRange::new(parse_time(from)?, parse_time(to)?));
    }

    if let Some(interval_ms) = args.interval_ms {
        ctx = ctx.with_interval_ms(interval_ms);
    }

    if !args.vars.is_empty() {
        let mut vars = ctx.template_vars.clone();
        for raw in &args.vars {
            vars.push(parse_var(raw)?);
        }
        ctx = ctx.with_template_vars(vars);
    }

    if !args.filters.is_empty() {
        let mut filters = ctx.filters.clone();
        for raw in &args.filters {
            filters.push(parse_filter(raw)?);
        }
        ctx = ctx.with_filters(filters);
    }

    let schema = match &args.schema {
        Some(path) => Some(path.clone()),
        None => settings
            .metadata
            .resolved_schema_file()
            .map_err(|e| e.to_string())?,
    };
    if let Some(path) = schema {
        let source = StaticMetadataProvider::from_file(&path)
            .map_err(|e| format!("loading schema '{}': {}", path.display(), e))?;
        let provider = CachedMetadataProvider::new(source, &settings.metadata.default_database);
        ctx = ctx.with_table_keys(Arc::new(provider));
    }

    Ok(ctx)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| format!("timestamp out of range: {}", raw));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid time '{}': {}", raw, e))
}

fn parse_var(raw: &str) -> Result<TemplateVariable, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid variable '{}', expected name=value", raw))?;

    let value = if value.contains(',') {
        VariableValue::Multi(value.split(',').map(|v| v.trim().to_string()).collect())
    } else {
        VariableValue::Single(value.to_string())
    };
    Ok(TemplateVariable::new(name.trim(), value))
}

fn parse_filter(raw: &str) -> Result<AdHocFilter, String> {
    let mut parts = raw.trim().splitn(3, char::is_whitespace);
    let (Some(key), Some(op)) = (parts.next(), parts.next()) else {
        return Err(format!("invalid filter '{}', expected \"key op value\"", raw));
    };
    let operator: FilterOperator = op.parse()?;
    let value = parts.next().unwrap_or("").trim();

    Ok(if value.eq_ignore_ascii_case("null") {
        AdHocFilter::null(key, operator)
    } else {
        AdHocFilter::new(key, operator, value)
    })
}
