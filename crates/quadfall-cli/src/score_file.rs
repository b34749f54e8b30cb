use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use quadfall_engine::ScoreStore;
use serde::{Deserialize, Serialize};

use crate::util::{self, Output};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ScoreEntry {
    pub(crate) score: u32,
    pub(crate) updated_at: DateTime<Utc>,
}

/// Best scores kept in a JSON file, keyed like `classic.best_score`.
///
/// Loaded once and written back by [`ScoreFile::save`]; a missing file is an
/// empty store.
#[derive(Debug, Clone)]
pub(crate) struct ScoreFile {
    path: PathBuf,
    entries: BTreeMap<String, ScoreEntry>,
    dirty: bool,
}

impl ScoreFile {
    pub(crate) fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        let entries = if path.exists() {
            util::read_json_file("best score", &path)?
        } else {
            tracing::debug!(path = %path.display(), "no best score file yet");
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn entry(&self, key: &str) -> Option<&ScoreEntry> {
        self.entries.get(key)
    }

    /// Writes the file if any score changed since it was opened.
    pub(crate) fn save(&mut self) -> anyhow::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        Output::create(self.path.clone())?.write_json(&self.entries)?;
        tracing::info!(path = %self.path.display(), "best scores saved");
        self.dirty = false;
        Ok(())
    }
}

impl ScoreStore for ScoreFile {
    fn get(&self, key: &str) -> Option<u32> {
        self.entries.get(key).map(|entry| entry.score)
    }

    fn set(&mut self, key: &str, score: u32) {
        tracing::debug!(key, score, "new best score");
        self.entries.insert(
            key.to_owned(),
            ScoreEntry {
                score,
                updated_at: Utc::now(),
            },
        );
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir()
            .join(format!("quadfall-test-{}", process::id()))
            .join(name)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let store = ScoreFile::open(temp_path("missing/best_scores.json")).unwrap();
        assert_eq!(store.get("classic.best_score"), None);
        assert!(store.entry("zen.best_score").is_none());
    }

    #[test]
    fn test_saved_scores_are_reloaded() {
        let path = temp_path("saved/best_scores.json");
        let mut store = ScoreFile::open(&path).unwrap();
        store.set("classic.best_score", 1200);
        store.set("blitz.best_score", 430);
        store.save().unwrap();

        let reloaded = ScoreFile::open(&path).unwrap();
        assert_eq!(reloaded.path(), path);
        assert_eq!(reloaded.get("classic.best_score"), Some(1200));
        assert_eq!(reloaded.get("blitz.best_score"), Some(430));
        assert_eq!(reloaded.get("zen.best_score"), None);
        assert_eq!(
            reloaded.entry("classic.best_score"),
            store.entry("classic.best_score")
        );

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_unchanged_store_is_not_written() {
        let path = temp_path("unchanged/best_scores.json");
        let mut store = ScoreFile::open(&path).unwrap();
        store.save().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let path = temp_path("malformed/best_scores.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let err = ScoreFile::open(&path).unwrap_err();
        assert!(
            err.to_string().contains("Failed to parse best score JSON file"),
            "{err}"
        );

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
