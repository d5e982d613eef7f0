use agencydb_contract::{json_schema, registry};
use agencydb_types::Shape;
use agencydb_types::schema::{AGENCYDB_DRIFT_V1, AGENCYDB_SNAPSHOT_V1, table_schema_id};
use anyhow::Context;
use clap::{Parser, Subcommand};
use fs_err as fs;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Workspace helper tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print schema identifiers used by agencydb.
    PrintSchemas,
    /// Write the JSON Schema of every table shape into the committed schema directory.
    ExportSchemas {
        #[arg(long, default_value = "schemas")]
        dir: String,
    },
    /// Fail if the committed JSON Schemas differ from the declared tables.
    CheckSchemas {
        #[arg(long, default_value = "schemas")]
        dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::PrintSchemas => {
            println!("{AGENCYDB_DRIFT_V1}");
            println!("{AGENCYDB_SNAPSHOT_V1}");
            for table in registry::tables() {
                for shape in Shape::ALL {
                    println!("{}", table_schema_id(table.name, shape));
                }
            }
        }
        Command::ExportSchemas { dir } => {
            let written = export_schemas(Path::new(&dir))?;
            println!("wrote {written} schemas to {dir}");
        }
        Command::CheckSchemas { dir } => {
            let problems = check_schemas(Path::new(&dir))?;
            if !problems.is_empty() {
                for problem in &problems {
                    eprintln!("{problem}");
                }
                anyhow::bail!(
                    "{} schema problem(s) in {dir}; run `cargo xtask export-schemas`",
                    problems.len()
                );
            }
            println!("schemas in {dir} are up to date");
        }
    }
    Ok(())
}

/// Generated schema documents keyed by file name.
fn generated() -> anyhow::Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for table in registry::tables() {
        for shape in Shape::ALL {
            let mut text = serde_json::to_string_pretty(&json_schema(table, shape))
                .context("serialize schema")?;
            text.push('\n');
            out.insert(format!("{}.{}.schema.json", table.name, shape), text);
        }
    }
    Ok(out)
}

fn export_schemas(dir: &Path) -> anyhow::Result<usize> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let schemas = generated()?;
    for (name, text) in &schemas {
        fs::write(dir.join(name), text)?;
    }
    Ok(schemas.len())
}

fn check_schemas(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut expected = generated()?;
    let mut problems = Vec::new();

    let pattern = dir.join("*.schema.json");
    let pattern = pattern.to_string_lossy();
    for entry in glob::glob(&pattern).context("glob schema files")? {
        let path = entry.context("read schema directory entry")?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = fs::read_to_string(&path)?;

        let committed: serde_json::Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                problems.push(format!("{name}: invalid JSON: {e}"));
                continue;
            }
        };
        if let Err(e) = jsonschema::validator_for(&committed) {
            problems.push(format!("{name}: does not compile: {e}"));
        }

        match expected.remove(&name) {
            Some(fresh) if fresh == text => {}
            Some(_) => problems.push(format!("{name}: stale")),
            None => problems.push(format!("{name}: no matching table shape")),
        }
    }

    problems.extend(expected.into_keys().map(|name| format!("{name}: missing")));
    Ok(problems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn exported_schemas_pass_the_check() {
        let temp = TempDir::new().unwrap();
        assert_eq!(export_schemas(temp.path()).unwrap(), 72);
        assert!(check_schemas(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn check_reports_stale_missing_and_unexpected_files() {
        let temp = TempDir::new().unwrap();
        export_schemas(temp.path()).unwrap();

        std::fs::write(temp.path().join("tickets.row.schema.json"), "{}\n").unwrap();
        std::fs::remove_file(temp.path().join("tags.update.schema.json")).unwrap();
        std::fs::write(temp.path().join("leads.row.schema.json"), "{}\n").unwrap();

        let problems = check_schemas(temp.path()).unwrap();
        assert_eq!(
            problems,
            vec![
                "leads.row.schema.json: no matching table shape".to_string(),
                "tickets.row.schema.json: stale".to_string(),
                "tags.update.schema.json: missing".to_string(),
            ]
        );
    }
}
