//! Configuration file loading for agencydb.
//!
//! Discovers and loads `agencydb.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "agencydb.toml";

pub const DEFAULT_EXPORT_DIR: &str = "schemas";
pub const DEFAULT_DRIFT_DIR: &str = "artifacts/agencydb";

/// Top-level configuration from agencydb.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgencydbConfig {
    pub export: ExportConfig,
    pub validate: ValidateConfig,
    pub drift: DriftConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving `<table>.<shape>.schema.json` files.
    pub out_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
    pub engine: Option<Engine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Introspection snapshot of the live schema.
    pub snapshot: Option<Utf8PathBuf>,

    /// Directory receiving `drift.json` and `drift.md`.
    pub out_dir: Option<Utf8PathBuf>,

    /// Tables excluded from drift detection (e.g. migration bookkeeping).
    pub ignore_tables: Vec<String>,
}

/// Validator used by `agencydb validate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    #[default]
    Structural,
    JsonSchema,
}

/// Discover the agencydb.toml config file.
///
/// Returns `None` if no config file is found in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse an agencydb.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<AgencydbConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<AgencydbConfig> {
    let config: AgencydbConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load the explicit config file if given, else discover one in `dir`, else defaults.
pub fn load_or_default(
    explicit: Option<&Utf8Path>,
    dir: &Utf8Path,
) -> anyhow::Result<AgencydbConfig> {
    match explicit {
        Some(path) => load_config(path),
        None => match discover_config(dir) {
            Some(path) => load_config(&path),
            None => Ok(AgencydbConfig::default()),
        },
    }
}

/// Settings of one command after merging config file and CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
    pub export_dir: Utf8PathBuf,
    pub engine: Engine,
    pub snapshot: Option<Utf8PathBuf>,
    pub drift_dir: Utf8PathBuf,
    pub ignore_tables: Vec<String>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: AgencydbConfig,
}

impl ConfigMerger {
    pub fn new(config: AgencydbConfig) -> Self {
        Self { config }
    }

    fn base(&self) -> MergedConfig {
        MergedConfig {
            export_dir: self
                .config
                .export
                .out_dir
                .clone()
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_EXPORT_DIR)),
            engine: self.config.validate.engine.unwrap_or_default(),
            snapshot: self.config.drift.snapshot.clone(),
            drift_dir: self
                .config
                .drift
                .out_dir
                .clone()
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DRIFT_DIR)),
            ignore_tables: self.config.drift.ignore_tables.clone(),
        }
    }

    pub fn merge_export_args(self, cli_out_dir: Option<Utf8PathBuf>) -> MergedConfig {
        let mut merged = self.base();
        if let Some(dir) = cli_out_dir {
            merged.export_dir = dir;
        }
        merged
    }

    pub fn merge_validate_args(self, cli_engine: Option<Engine>) -> MergedConfig {
        let mut merged = self.base();
        if let Some(engine) = cli_engine {
            merged.engine = engine;
        }
        merged
    }

    /// CLI `ignore_table` entries extend the config file list.
    pub fn merge_drift_args(
        self,
        cli_snapshot: Option<Utf8PathBuf>,
        cli_out_dir: Option<Utf8PathBuf>,
        cli_ignore: &[String],
    ) -> MergedConfig {
        let mut merged = self.base();
        if cli_snapshot.is_some() {
            merged.snapshot = cli_snapshot;
        }
        if let Some(dir) = cli_out_dir {
            merged.drift_dir = dir;
        }
        for table in cli_ignore {
            if !merged.ignore_tables.contains(table) {
                merged.ignore_tables.push(table.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let contents = r#"
[export]
out_dir = "contracts/json"

[validate]
engine = "json-schema"

[drift]
snapshot = "artifacts/introspection.json"
out_dir = "artifacts/drift"
ignore_tables = ["_prisma_migrations"]
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(
            config.export.out_dir.as_deref(),
            Some(Utf8Path::new("contracts/json"))
        );
        assert_eq!(config.validate.engine, Some(Engine::JsonSchema));
        assert_eq!(
            config.drift.snapshot.as_deref(),
            Some(Utf8Path::new("artifacts/introspection.json"))
        );
        assert_eq!(config.drift.ignore_tables, vec!["_prisma_migrations"]);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.export.out_dir.is_none());
        assert!(config.validate.engine.is_none());
        assert!(config.drift.ignore_tables.is_empty());
    }

    #[test]
    fn test_unknown_engine_is_rejected() {
        let err = parse_config("[validate]\nengine = \"regex\"\n").expect_err("bad engine");
        assert!(format!("{:#}", err).contains("regex"));
    }

    #[test]
    fn test_defaults_apply_without_config() {
        let merged = ConfigMerger::new(AgencydbConfig::default()).merge_export_args(None);
        assert_eq!(merged.export_dir, DEFAULT_EXPORT_DIR);
        assert_eq!(merged.engine, Engine::Structural);
        assert_eq!(merged.drift_dir, DEFAULT_DRIFT_DIR);
        assert!(merged.snapshot.is_none());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = parse_config(
            "[export]\nout_dir = \"a\"\n[validate]\nengine = \"json-schema\"\n",
        )
        .unwrap();

        let merged = ConfigMerger::new(config.clone()).merge_export_args(Some("b".into()));
        assert_eq!(merged.export_dir, "b");

        let merged = ConfigMerger::new(config.clone()).merge_validate_args(None);
        assert_eq!(merged.engine, Engine::JsonSchema);

        let merged = ConfigMerger::new(config).merge_validate_args(Some(Engine::Structural));
        assert_eq!(merged.engine, Engine::Structural);
    }

    #[test]
    fn test_merge_drift_args_extends_ignore_list() {
        let config = parse_config(
            "[drift]\nsnapshot = \"live.json\"\nignore_tables = [\"_prisma_migrations\"]\n",
        )
        .unwrap();

        let merged = ConfigMerger::new(config).merge_drift_args(
            None,
            Some("out".into()),
            &["_prisma_migrations".to_string(), "audit_log".to_string()],
        );
        assert_eq!(merged.snapshot.as_deref(), Some(Utf8Path::new("live.json")));
        assert_eq!(merged.drift_dir, "out");
        assert_eq!(merged.ignore_tables, vec!["_prisma_migrations", "audit_log"]);
    }

    #[test]
    fn test_load_or_default_prefers_explicit_path() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());
        let cfg = load_or_default(None, &root).expect("defaults");
        assert!(cfg.validate.engine.is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "[validate]\nengine = \"structural\"\n")
            .expect("write config");
        let other = root.join("other.toml");
        std::fs::write(&other, "[validate]\nengine = \"json-schema\"\n").expect("write other");

        let discovered = load_or_default(None, &root).expect("discovered");
        assert_eq!(discovered.validate.engine, Some(Engine::Structural));
        let explicit = load_or_default(Some(other.as_path()), &root).expect("explicit");
        assert_eq!(explicit.validate.engine, Some(Engine::JsonSchema));
    }
}
