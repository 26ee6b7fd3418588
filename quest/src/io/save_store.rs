//! Save file storage for learner progress.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::core::progress::ProgressState;

/// Outcome of reading the save record.
#[derive(Debug)]
pub enum LoadResult {
    Found(ProgressState),
    /// No record exists yet.
    Absent,
    /// A record exists but could not be read or parsed.
    Unreadable(anyhow::Error),
}

impl LoadResult {
    /// Collapse to a usable state; anything but `Found` means "no prior progress".
    pub fn into_state_or_default(self) -> ProgressState {
        match self {
            LoadResult::Found(state) => state,
            LoadResult::Absent => ProgressState::default(),
            LoadResult::Unreadable(err) => {
                warn!(err = %format!("{err:#}"), "ignoring unreadable save record");
                ProgressState::default()
            }
        }
    }
}

/// Durable home of [`ProgressState`].
pub trait ProgressStore {
    fn load(&self) -> LoadResult;
    fn save(&self, state: &ProgressState) -> Result<()>;
    /// Delete the record. Missing records are not an error.
    fn clear(&self) -> Result<()>;
}

/// Pretty-printed JSON save file, written atomically.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn load(&self) -> LoadResult {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no save record");
                return LoadResult::Absent;
            }
            Err(err) => {
                return LoadResult::Unreadable(
                    anyhow::Error::new(err).context(format!("read {}", self.path.display())),
                );
            }
        };
        match parse_record(&contents) {
            Ok(state) => {
                debug!(
                    experience_points = state.experience_points,
                    unlocked_level = state.unlocked_level,
                    "save record loaded"
                );
                LoadResult::Found(state)
            }
            Err(err) => {
                LoadResult::Unreadable(err.context(format!("parse {}", self.path.display())))
            }
        }
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn save(&self, state: &ProgressState) -> Result<()> {
        debug!(
            experience_points = state.experience_points,
            unlocked_level = state.unlocked_level,
            "writing save record"
        );
        let mut buf = serde_json::to_string_pretty(state).context("serialize progress")?;
        buf.push('\n');
        write_atomic(&self.path, &buf)
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("remove save record {}", self.path.display()))
            }
        }
    }
}

/// Parse a save record field by field.
///
/// The record must be a JSON object. A missing or ill-typed field falls back to
/// its default without discarding the fields that are well formed. The legacy
/// names `xp` and `current_level` are understood too.
pub fn parse_record(contents: &str) -> Result<ProgressState> {
    let value: Value = serde_json::from_str(contents).context("parse save json")?;
    let object = value
        .as_object()
        .context("save record is not a JSON object")?;
    let defaults = ProgressState::default();

    let experience_points = field(object, &["experience_points", "xp"])
        .and_then(Value::as_u64)
        .unwrap_or(defaults.experience_points);
    let achievements = field(object, &["achievements"])
        .and_then(Value::as_array)
        .map(|items| {
            let mut names: Vec<String> = Vec::new();
            for name in items.iter().filter_map(Value::as_str) {
                if !names.iter().any(|held| held == name) {
                    names.push(name.to_string());
                }
            }
            names
        })
        .unwrap_or(defaults.achievements);
    let unlocked_level = field(object, &["unlocked_level", "current_level"])
        .and_then(Value::as_u64)
        .and_then(|level| u32::try_from(level).ok())
        .filter(|level| *level >= 1)
        .unwrap_or(defaults.unlocked_level);

    Ok(ProgressState {
        experience_points,
        achievements,
        unlocked_level,
    })
}

fn field<'a>(object: &'a serde_json::Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp save record {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace save record {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, JsonFileStore) {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(temp.path().join("git_quest_save.json"));
        (temp, store)
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_temp, store) = store();
        let state = ProgressState {
            experience_points: 420,
            achievements: vec!["First Commit".to_string(), "Time Traveler".to_string()],
            unlocked_level: 3,
        };
        store.save(&state).expect("save");
        match store.load() {
            LoadResult::Found(loaded) => assert_eq!(loaded, state),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn missing_record_is_absent() {
        let (_temp, store) = store();
        assert!(matches!(store.load(), LoadResult::Absent));
        assert_eq!(store.load().into_state_or_default(), ProgressState::default());
    }

    #[test]
    fn corrupt_record_falls_back_to_defaults() {
        let (_temp, store) = store();
        fs::write(store.path(), "{ not json").expect("write");
        let loaded = store.load();
        assert!(matches!(loaded, LoadResult::Unreadable(_)));
        assert_eq!(loaded.into_state_or_default(), ProgressState::default());

        fs::write(store.path(), "[1, 2, 3]").expect("write");
        assert!(matches!(store.load(), LoadResult::Unreadable(_)));
    }

    #[test]
    fn malformed_fields_default_individually() {
        let state = parse_record(
            r#"{"experience_points": "lots", "achievements": ["A", 7, "A", "B"], "unlocked_level": 0}"#,
        )
        .expect("parse");
        assert_eq!(state.experience_points, 0);
        assert_eq!(state.achievements, vec!["A", "B"]);
        assert_eq!(state.unlocked_level, 1);
    }

    #[test]
    fn legacy_field_names_are_read() {
        let state =
            parse_record(r#"{"xp": 150, "achievements": ["First Commit"], "current_level": 2}"#)
                .expect("parse");
        assert_eq!(
            state,
            ProgressState {
                experience_points: 150,
                achievements: vec!["First Commit".to_string()],
                unlocked_level: 2,
            }
        );
    }

    #[test]
    fn record_layout_is_stable() {
        let (_temp, store) = store();
        store.save(&ProgressState::default()).expect("save");
        let contents = fs::read_to_string(store.path()).expect("read");
        let expected =
            "{\n  \"experience_points\": 0,\n  \"achievements\": [],\n  \"unlocked_level\": 1\n}\n";
        assert_eq!(contents, expected);
    }

    #[test]
    fn clear_removes_record_and_tolerates_absence() {
        let (_temp, store) = store();
        store.save(&ProgressState::default()).expect("save");
        store.clear().expect("clear");
        assert!(!store.path().exists());
        store.clear().expect("clear again");
    }
}
