mod config;

use std::io::Read;
use std::process::ExitCode;

use agencydb_contract::{
    SchemaValidator, detect_drift_ignoring, drift_report, json_schema, load_snapshot, registry,
    validate,
};
use agencydb_render::{render_drift_md, render_table_md};
use agencydb_types::report::{ReportStatus, ReportToolInfo};
use agencydb_types::{Shape, TableDef};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{ConfigMerger, Engine};
use fs_err as fs;
use serde::Serialize;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Exit code for a rejected payload or detected drift.
const EXIT_BLOCKED: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "agencydb",
    version,
    about = "Schema contracts for the agency workspace database."
)]
struct Cli {
    /// Config file (default: ./agencydb.toml when present).
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every declared table.
    Tables(ListArgs),
    /// List every declared enum with its values.
    Enums(ListArgs),
    /// Print the markdown contract of one table.
    Describe(DescribeArgs),
    /// Print the JSON Schema of one table shape.
    Schema(SchemaArgs),
    /// Check a JSON payload against a table shape.
    Validate(ValidateArgs),
    /// Write the JSON Schema of every table shape to a directory.
    Export(ExportArgs),
    /// Print the declared schema as an introspection snapshot.
    Snapshot,
    /// Compare the declared schema with an introspection snapshot of the live database.
    CheckDrift(CheckDriftArgs),
}

#[derive(Debug, Parser)]
struct ListArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
struct DescribeArgs {
    /// Table name, e.g. "tickets".
    table: String,
}

#[derive(Debug, Parser)]
struct SchemaArgs {
    table: String,

    #[arg(long, default_value = "row")]
    shape: Shape,
}

#[derive(Debug, Parser)]
struct ValidateArgs {
    table: String,

    #[arg(long)]
    shape: Shape,

    /// Payload file, or "-" for stdin.
    #[arg(long)]
    payload: String,

    /// Validator to use (default: structural, or `[validate] engine`).
    #[arg(long, value_enum)]
    engine: Option<Engine>,
}

#[derive(Debug, Parser)]
struct ExportArgs {
    /// Output directory (default: `[export] out_dir`, else "schemas").
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct CheckDriftArgs {
    /// Introspection snapshot (default: `[drift] snapshot`).
    #[arg(long)]
    snapshot: Option<Utf8PathBuf>,

    /// Output directory for drift.json and drift.md (default: artifacts/agencydb).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Table to leave out of the comparison; repeatable.
    #[arg(long = "ignore-table")]
    ignore_table: Vec<String>,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config = config::load_or_default(cli.config.as_deref(), Utf8Path::new("."))
        .context("load agencydb.toml config")?;
    let merger = ConfigMerger::new(file_config);

    match cli.cmd {
        Command::Tables(args) => cmd_tables(args).map(|_| ExitCode::SUCCESS),
        Command::Enums(args) => cmd_enums(args).map(|_| ExitCode::SUCCESS),
        Command::Describe(args) => cmd_describe(args).map(|_| ExitCode::SUCCESS),
        Command::Schema(args) => cmd_schema(args).map(|_| ExitCode::SUCCESS),
        Command::Validate(args) => cmd_validate(args, merger),
        Command::Export(args) => cmd_export(args, merger).map(|_| ExitCode::SUCCESS),
        Command::Snapshot => cmd_snapshot().map(|_| ExitCode::SUCCESS),
        Command::CheckDrift(args) => cmd_check_drift(args, merger),
    }
}

#[derive(Serialize)]
struct TableView {
    name: &'static str,
    columns: Vec<ColumnView>,
    required_on_insert: Vec<&'static str>,
}

#[derive(Serialize)]
struct ColumnView {
    name: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    nullable: bool,
    has_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    references: Option<&'static str>,
}

fn table_view(table: &TableDef) -> TableView {
    TableView {
        name: table.name,
        columns: table
            .columns
            .iter()
            .map(|c| ColumnView {
                name: c.name,
                kind: c.kind.label(),
                nullable: c.nullable,
                has_default: c.has_default,
                references: table.references(c.name),
            })
            .collect(),
        required_on_insert: table.required_columns(Shape::Insert),
    }
}

fn cmd_tables(args: ListArgs) -> anyhow::Result<()> {
    let tables = registry::tables();
    match args.format {
        OutputFormat::Text => {
            for table in tables {
                println!(
                    "{:<28} {:>2} columns  insert requires: {}",
                    table.name,
                    table.columns.len(),
                    table.required_columns(Shape::Insert).join(", ")
                );
            }
        }
        OutputFormat::Json => {
            let views: Vec<TableView> = tables.iter().map(table_view).collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct EnumView {
    name: &'static str,
    values: &'static [&'static str],
}

fn cmd_enums(args: ListArgs) -> anyhow::Result<()> {
    let enums = registry::enums();
    match args.format {
        OutputFormat::Text => {
            for def in enums {
                println!("{}: {}", def.name, def.values.join(", "));
            }
        }
        OutputFormat::Json => {
            let views: Vec<EnumView> = enums
                .iter()
                .map(|def| EnumView {
                    name: def.name,
                    values: def.values,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
    }
    Ok(())
}

fn cmd_describe(args: DescribeArgs) -> anyhow::Result<()> {
    let table = registry::table(&args.table)?;
    print!("{}", render_table_md(table));
    Ok(())
}

fn cmd_schema(args: SchemaArgs) -> anyhow::Result<()> {
    let table = registry::table(&args.table)?;
    let schema = json_schema(table, args.shape);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn cmd_validate(args: ValidateArgs, merger: ConfigMerger) -> anyhow::Result<ExitCode> {
    let merged = merger.merge_validate_args(args.engine);
    let table = registry::table(&args.table)?;
    let payload = read_payload(&args.payload)?;

    debug!(
        table = table.name,
        shape = %args.shape,
        engine = ?merged.engine,
        "validating payload"
    );

    let violations: Vec<String> = match merged.engine {
        Engine::Structural => match validate(table, args.shape, &payload) {
            Ok(()) => vec![],
            Err(mismatch) => mismatch.violations.iter().map(|v| v.to_string()).collect(),
        },
        Engine::JsonSchema => SchemaValidator::new(table, args.shape)?.errors(&payload),
    };

    if violations.is_empty() {
        println!("{}.{}: valid", table.name, args.shape);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}.{}: rejected", table.name, args.shape);
    for violation in &violations {
        println!("  - {}", violation);
    }
    Ok(ExitCode::from(EXIT_BLOCKED))
}

fn read_payload(source: &str) -> anyhow::Result<serde_json::Value> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read payload from stdin")?;
        buf
    } else {
        fs::read_to_string(source).with_context(|| format!("read payload {}", source))?
    };
    serde_json::from_str(&raw).with_context(|| format!("parse payload {}", source))
}

fn cmd_export(args: ExportArgs, merger: ConfigMerger) -> anyhow::Result<()> {
    let merged = merger.merge_export_args(args.out_dir);
    let out_dir = merged.export_dir;
    fs::create_dir_all(&out_dir).with_context(|| format!("create {}", out_dir))?;

    let mut written = 0usize;
    for table in registry::tables() {
        for shape in Shape::ALL {
            let path = out_dir.join(schema_file_name(table.name, shape));
            write_json(&path, &json_schema(table, shape))?;
            written += 1;
        }
    }

    info!("wrote {} schemas to {}", written, out_dir);
    println!("wrote {} schemas to {}", written, out_dir);
    Ok(())
}

fn schema_file_name(table: &str, shape: Shape) -> String {
    format!("{}.{}.schema.json", table, shape)
}

fn cmd_snapshot() -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&registry::snapshot())?);
    Ok(())
}

fn cmd_check_drift(args: CheckDriftArgs, merger: ConfigMerger) -> anyhow::Result<ExitCode> {
    let merged = merger.merge_drift_args(args.snapshot, args.out_dir, &args.ignore_table);
    let snapshot_path = merged
        .snapshot
        .context("no snapshot given; pass --snapshot or set [drift] snapshot in agencydb.toml")?;

    let snapshot = load_snapshot(&snapshot_path)
        .with_context(|| format!("load snapshot {}", snapshot_path))?;
    let drift = detect_drift_ignoring(&snapshot, &merged.ignore_tables);
    let report = drift_report(
        &drift,
        &merged.ignore_tables,
        tool_info(),
        Some(snapshot_path.as_str()),
    );

    let out_dir = merged.drift_dir;
    fs::create_dir_all(&out_dir).with_context(|| format!("create {}", out_dir))?;
    write_json(&out_dir.join("drift.json"), &report)?;
    let md = render_drift_md(&report);
    fs::write(out_dir.join("drift.md"), &md)?;

    info!("wrote drift report to {}", out_dir);
    print!("{}", md);

    Ok(match report.verdict.status {
        ReportStatus::Pass => ExitCode::SUCCESS,
        ReportStatus::Fail => ExitCode::from(EXIT_BLOCKED),
    })
}

fn write_json<T: serde::Serialize>(path: &Utf8Path, v: &T) -> anyhow::Result<()> {
    let mut s = serde_json::to_string_pretty(v).context("serialize json")?;
    s.push('\n');
    fs::write(path, s).with_context(|| format!("write {}", path))?;
    Ok(())
}

fn tool_info() -> ReportToolInfo {
    ReportToolInfo {
        name: "agencydb".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
