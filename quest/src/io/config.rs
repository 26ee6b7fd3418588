//! Tutor configuration read from `git-quest.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "git-quest.toml";

/// Tutor configuration (TOML).
///
/// Missing fields default to the values the curriculum was written against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuestConfig {
    /// Scratch repository directory. Relative paths resolve against the
    /// current directory.
    pub workspace_dir: PathBuf,

    /// Progress save file.
    pub save_path: PathBuf,

    /// Executable used for every backend operation.
    pub git_program: String,

    /// Branch name created by `git init` in labs and bootstrap.
    pub default_branch: String,

    /// Upper bound on a single backend operation, in seconds.
    pub backend_timeout_secs: u64,

    /// Truncate captured backend stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("git-quest"),
            save_path: PathBuf::from("git_quest_save.json"),
            git_program: "git".to_string(),
            default_branch: "main".to_string(),
            backend_timeout_secs: 10,
            output_limit_bytes: 100_000,
        }
    }
}

impl QuestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backend_timeout_secs == 0 {
            return Err(anyhow!("backend_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.git_program.trim().is_empty() {
            return Err(anyhow!("git_program must not be empty"));
        }
        if self.default_branch.trim().is_empty() {
            return Err(anyhow!("default_branch must not be empty"));
        }
        if self.workspace_dir.as_os_str().is_empty() {
            return Err(anyhow!("workspace_dir must not be empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `QuestConfig::default()`.
pub fn load_config(path: &Path) -> Result<QuestConfig> {
    if !path.exists() {
        let cfg = QuestConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: QuestConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, QuestConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "backend_timeout_secs = 30\nworkspace_dir = \"/tmp/quest\"\n")
            .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.backend_timeout_secs, 30);
        assert_eq!(cfg.workspace_dir, PathBuf::from("/tmp/quest"));
        assert_eq!(cfg.default_branch, "main");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "backend_timeout_secs = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("backend_timeout_secs"));
    }

    #[test]
    fn serialized_defaults_parse_back() {
        let text = toml::to_string_pretty(&QuestConfig::default()).expect("serialize");
        let cfg: QuestConfig = toml::from_str(&text).expect("parse");
        assert_eq!(cfg, QuestConfig::default());
    }
}
