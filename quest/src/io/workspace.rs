//! Scoped text-file access beneath the scratch workspace root.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

/// The disposable directory a learner's repository lives in.
///
/// Every path handed to the accessor is relative to the root; absolute paths
/// and `..` components are refused so a lab can never touch anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory (and its parents) if missing.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create workspace {}", self.root.display()))
    }

    /// True when the root holds a git repository.
    pub fn has_vcs_root(&self) -> bool {
        self.root.join(".git").is_dir()
    }

    /// Delete the whole workspace, repository included.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn wipe(&self) -> Result<()> {
        if !self.root.exists() {
            return Ok(());
        }
        debug!("wiping workspace");
        fs::remove_dir_all(&self.root)
            .with_context(|| format!("remove workspace {}", self.root.display()))
    }

    /// A sibling workspace named `<root>-<suffix>`, e.g. a teammate's clone.
    pub fn sibling(&self, suffix: &str) -> Workspace {
        let name = self
            .root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workspace".to_string());
        let parent = self.root.parent().unwrap_or_else(|| Path::new("."));
        Workspace::new(parent.join(format!("{name}-{suffix}")))
    }

    /// Resolve `relative` beneath the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        let mut resolved = self.root.clone();
        for component in rel.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(anyhow!("path escapes workspace: {relative}"));
                }
            }
        }
        if resolved == self.root {
            return Err(anyhow!("path names the workspace root: '{relative}'"));
        }
        Ok(resolved)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.resolve(relative)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// File contents, or an empty string when missing or unreadable.
    pub fn read_text(&self, relative: &str) -> String {
        self.resolve(relative)
            .ok()
            .and_then(|path| fs::read_to_string(path).ok())
            .unwrap_or_default()
    }

    pub fn write_text(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.prepare(relative)?;
        fs::write(&path, content).with_context(|| format!("write {}", path.display()))
    }

    pub fn append_text(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.prepare(relative)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("append {}", path.display()))
    }

    /// Delete a file; missing files are not an error.
    pub fn remove(&self, relative: &str) -> Result<()> {
        let path = self.resolve(relative)?;
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))
    }

    fn prepare(&self, relative: &str) -> Result<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> (tempfile::TempDir, Workspace) {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path().join("git-quest"));
        (temp, ws)
    }

    #[test]
    fn write_creates_root_and_parents() {
        let (_temp, ws) = workspace();
        ws.write_text("notes/hero.txt", "hello\n").expect("write");
        assert!(ws.exists("notes/hero.txt"));
        assert_eq!(ws.read_text("notes/hero.txt"), "hello\n");
    }

    #[test]
    fn append_extends_file() {
        let (_temp, ws) = workspace();
        ws.write_text("hero.txt", "line 1\n").expect("write");
        ws.append_text("hero.txt", "line 2\n").expect("append");
        assert_eq!(ws.read_text("hero.txt"), "line 1\nline 2\n");
    }

    #[test]
    fn missing_file_reads_empty() {
        let (_temp, ws) = workspace();
        assert_eq!(ws.read_text("nope.txt"), "");
        assert!(!ws.exists("nope.txt"));
    }

    #[test]
    fn escaping_paths_are_refused() {
        let (_temp, ws) = workspace();
        assert!(ws.write_text("../outside.txt", "x").is_err());
        assert!(ws.write_text("/etc/passwd", "x").is_err());
        assert!(ws.resolve(".").is_err());
        assert!(!ws.exists("../"));
    }

    #[test]
    fn remove_and_wipe() {
        let (_temp, ws) = workspace();
        ws.write_text("a.txt", "a").expect("write");
        ws.remove("a.txt").expect("remove");
        ws.remove("a.txt").expect("remove missing");
        assert!(!ws.exists("a.txt"));

        ws.write_text("b.txt", "b").expect("write");
        ws.wipe().expect("wipe");
        assert!(!ws.root().exists());
        ws.wipe().expect("wipe missing");
    }

    #[test]
    fn sibling_shares_parent() {
        let ws = Workspace::new("/tmp/play/git-quest");
        assert_eq!(
            ws.sibling("cloud").root(),
            Path::new("/tmp/play/git-quest-cloud")
        );
    }

    #[test]
    fn vcs_root_detection() {
        let (_temp, ws) = workspace();
        ws.ensure_root().expect("root");
        assert!(!ws.has_vcs_root());
        fs::create_dir_all(ws.root().join(".git")).expect("mkdir");
        assert!(ws.has_vcs_root());
    }
}
