//! Initialization helpers for `.triage/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{TriageConfig, write_config};
use super::store::{WARD_SCHEMA, WardDocument, write_ward};

/// All canonical paths within `.triage/` for a project root.
#[derive(Debug, Clone)]
pub struct TriagePaths {
    pub root: PathBuf,
    pub triage_dir: PathBuf,
    pub state_dir: PathBuf,
    pub gitignore_path: PathBuf,
    pub ward_path: PathBuf,
    pub schema_path: PathBuf,
    pub config_path: PathBuf,
}

impl TriagePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let triage_dir = root.join(".triage");
        let state_dir = triage_dir.join("state");
        Self {
            root,
            triage_dir: triage_dir.clone(),
            state_dir: state_dir.clone(),
            gitignore_path: triage_dir.join(".gitignore"),
            ward_path: state_dir.join("ward.json"),
            schema_path: state_dir.join("schema.json"),
            config_path: state_dir.join("config.toml"),
        }
    }
}

/// Options for `init_triage`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing files, including the ward itself.
    pub force: bool,
}

/// Create `.triage/` scaffolding in `root`: schema, default config, empty ward.
///
/// Fails if `.triage/` already exists unless `options.force` is set.
pub fn init_triage(root: &Path, options: &InitOptions) -> Result<TriagePaths> {
    let paths = TriagePaths::new(root);
    if paths.triage_dir.exists() && !paths.triage_dir.is_dir() {
        return Err(anyhow!(
            "triage init: .triage exists but is not a directory"
        ));
    }
    if paths.triage_dir.exists() && !options.force {
        return Err(anyhow!(
            "triage init: .triage already exists (use --force to overwrite)"
        ));
    }

    create_dir(&paths.triage_dir)?;
    create_dir(&paths.state_dir)?;

    write_file(&paths.gitignore_path, TRIAGE_GITIGNORE)?;
    write_file(&paths.schema_path, WARD_SCHEMA)?;
    write_config(&paths.config_path, &TriageConfig::default())?;
    write_ward(&paths.ward_path, &WardDocument::default())?;

    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("write file {}", path.display()))
}

const TRIAGE_GITIGNORE: &str = "state/ward.json\nstate/*.tmp\n";
