//! Ward configuration stored under `.triage/state/config.toml`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Ward configuration (TOML).
///
/// Edited by humans; missing fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TriageConfig {
    /// Interval between live display snapshots, in milliseconds.
    pub live_tick_ms: u64,

    /// Snapshots queued per live subscriber before it is dropped as lagging.
    pub subscriber_buffer: usize,

    /// SSE keep-alive interval in seconds.
    pub keep_alive_secs: u64,

    /// Maximum rows returned by the patient list.
    pub patient_list_limit: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            live_tick_ms: 1000,
            subscriber_buffer: 16,
            keep_alive_secs: 15,
            patient_list_limit: 100,
        }
    }
}

impl TriageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.live_tick_ms == 0 {
            return Err(anyhow!("live_tick_ms must be > 0"));
        }
        if self.subscriber_buffer == 0 {
            return Err(anyhow!("subscriber_buffer must be > 0"));
        }
        if self.keep_alive_secs == 0 {
            return Err(anyhow!("keep_alive_secs must be > 0"));
        }
        if self.patient_list_limit == 0 {
            return Err(anyhow!("patient_list_limit must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `TriageConfig::default()`.
pub fn load_config(path: &Path) -> Result<TriageConfig> {
    if !path.exists() {
        let cfg = TriageConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: TriageConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &TriageConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Write `contents` next to `path` and rename over it.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, TriageConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let cfg = TriageConfig {
            live_tick_ms: 250,
            ..TriageConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
        assert!(!temp.path().join("config.toml.tmp").exists());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "patient_list_limit = 5\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.patient_list_limit, 5);
        assert_eq!(cfg.live_tick_ms, 1000);
    }

    #[test]
    fn zero_tick_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "live_tick_ms = 0\n").expect("write");
        let err = load_config(&path).expect_err("zero tick");
        assert!(format!("{err:#}").contains("live_tick_ms must be > 0"));
    }
}
