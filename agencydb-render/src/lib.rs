//! Rendering helpers (markdown) for human-readable artifacts.

use agencydb_types::report::{DriftReport, ReportStatus};
use agencydb_types::{Shape, TableDef};

/// Markdown contract of one table: every column with its requirement in each shape.
pub fn render_table_md(table: &TableDef) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", table.name));
    out.push_str(&format!(
        "- Columns: {}\n- Required on insert: {}\n\n",
        table.columns.len(),
        list_or_dash(&table.required_columns(Shape::Insert))
    ));

    out.push_str("| Column | Type | Nullable | Default | Row | Insert | Update | References |\n");
    out.push_str("|---|---|---|---|---|---|---|---|\n");
    for column in table.columns {
        let references = table
            .references(column.name)
            .map(|target| format!("`{}.id`", target))
            .unwrap_or_default();
        out.push_str(&format!(
            "| `{}` | {} | {} | {} | {} | {} | {} | {} |\n",
            column.name,
            column.kind.label(),
            yes_no(column.nullable),
            yes_no(column.has_default),
            presence(Shape::Row.requires(column)),
            presence(Shape::Insert.requires(column)),
            presence(Shape::Update.requires(column)),
            references
        ));
    }

    let enums: Vec<_> = table
        .columns
        .iter()
        .filter_map(|c| c.kind.enum_def().map(|def| (c.name, def)))
        .collect();
    if !enums.is_empty() {
        out.push_str("\n## Enums\n\n");
        for (column, def) in enums {
            out.push_str(&format!(
                "- `{}` ({}): {}\n",
                column,
                def.name,
                def.values
                    .iter()
                    .map(|v| format!("`{}`", v))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }

    out
}

pub fn render_drift_md(report: &DriftReport) -> String {
    let mut out = String::new();
    out.push_str("# agencydb drift\n\n");
    out.push_str(&format!("- Status: `{}`\n", status_label(report.verdict.status)));
    out.push_str(&format!(
        "- Tables checked: {}\n- Enums checked: {}\n- Drift: {}\n",
        report.verdict.counts.tables_checked,
        report.verdict.counts.enums_checked,
        report.verdict.counts.drift
    ));
    if let Some(snapshot) = &report.snapshot {
        out.push_str(&format!("- Snapshot: `{}`\n", snapshot));
    }
    out.push('\n');

    out.push_str("## Findings\n\n");
    if report.findings.is_empty() {
        out.push_str("_No drift._\n");
        return out;
    }

    for (i, finding) in report.findings.iter().enumerate() {
        let location = match (&finding.table, &finding.column) {
            (Some(table), Some(column)) => format!(" at `{}.{}`", table, column),
            (Some(table), None) => format!(" at `{}`", table),
            _ => String::new(),
        };
        out.push_str(&format!(
            "{}. `{}`{}: {}\n",
            i + 1,
            finding.code,
            location,
            finding.message
        ));
    }

    out
}

fn status_label(s: ReportStatus) -> &'static str {
    match s {
        ReportStatus::Pass => "pass",
        ReportStatus::Fail => "fail",
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

fn presence(required: bool) -> &'static str {
    if required { "required" } else { "optional" }
}

fn list_or_dash(names: &[&str]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names
            .iter()
            .map(|n| format!("`{}`", n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
