use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

const STORE_VERSION: u8 = 1;
const MAX_ENTRIES: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: i32,
    #[serde(rename = "recordedAt", alias = "recorded_at")]
    pub recorded_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct HighScoreFile {
    version: u8,
    entries: Vec<HighScoreEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct HighScoreFileRaw {
    version: u8,
    entries: Vec<serde_json::Value>,
}

/// File-backed top-five score table. Load and save failures degrade to an
/// empty table rather than failing the game.
pub struct HighScoreStore {
    file_path: PathBuf,
    entries: Vec<HighScoreEntry>,
}

impl HighScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        let entries = load_entries(&file_path);
        Self { file_path, entries }
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    pub fn qualifies(&self, score: i32) -> bool {
        if score <= 0 {
            return false;
        }
        self.entries.len() < MAX_ENTRIES
            || self.entries.last().is_some_and(|last| score > last.score)
    }

    /// Inserts the score in rank order and persists the table. Returns
    /// false when the score does not make the cut.
    pub fn submit(&mut self, name: &str, score: i32) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() || !self.qualifies(score) {
            return false;
        }
        let position = self
            .entries
            .iter()
            .position(|entry| score > entry.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            position,
            HighScoreEntry {
                name: trimmed.to_string(),
                score,
                recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        );
        self.entries.truncate(MAX_ENTRIES);
        self.save();
        true
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                warn!(
                    "high-score store failed to create parent dir {}: {error}",
                    parent.display()
                );
                return;
            }
        }

        let payload = HighScoreFile {
            version: STORE_VERSION,
            entries: self.entries.clone(),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    warn!(
                        "high-score store failed to write {}: {error}",
                        self.file_path.display()
                    );
                }
            }
            Err(error) => {
                warn!(
                    "high-score store failed to serialize payload for {}: {error}",
                    self.file_path.display()
                );
            }
        }
    }
}

fn load_entries(path: &Path) -> Vec<HighScoreEntry> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!("high-score store failed to read {}: {error}", path.display());
            }
            return Vec::new();
        }
    };
    let parsed: HighScoreFileRaw = match serde_json::from_str::<HighScoreFileRaw>(&text) {
        Ok(value) if value.version == STORE_VERSION => value,
        Ok(value) => {
            warn!(
                "high-score store has unsupported version {} at {}",
                value.version,
                path.display()
            );
            return Vec::new();
        }
        Err(error) => {
            warn!("high-score store failed to parse {}: {error}", path.display());
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    for raw_value in parsed.entries {
        let value: HighScoreEntry = match serde_json::from_value(raw_value) {
            Ok(entry) => entry,
            Err(error) => {
                warn!(
                    "high-score store skipped a malformed entry in {}: {error}",
                    path.display()
                );
                continue;
            }
        };
        let Some(normalized) = sanitize_entry(value) else {
            continue;
        };
        entries.push(normalized);
    }

    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(MAX_ENTRIES);
    entries
}

fn sanitize_entry(value: HighScoreEntry) -> Option<HighScoreEntry> {
    let name = value.name.trim().to_string();
    if name.is_empty() || value.score < 0 {
        return None;
    }
    Some(HighScoreEntry { name, ..value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        );
        std::env::temp_dir().join(unique).join("highscores.json")
    }

    #[test]
    fn submit_keeps_the_table_sorted_and_bounded() {
        let path = temp_file("highscores-sorted");
        let mut store = HighScoreStore::new(path.clone());
        for (name, score) in [
            ("a", 30),
            ("b", 10),
            ("c", 50),
            ("d", 20),
            ("e", 40),
            ("f", 60),
        ] {
            assert!(store.submit(name, score));
        }
        let scores: Vec<i32> = store.entries().iter().map(|entry| entry.score).collect();
        assert_eq!(scores, vec![60, 50, 40, 30, 20]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn qualifies_requires_beating_a_full_table() {
        let path = temp_file("highscores-qualify");
        let mut store = HighScoreStore::new(path.clone());
        assert!(!store.qualifies(0));
        assert!(store.qualifies(1));
        for score in [10, 20, 30, 40, 50] {
            store.submit("p", score);
        }
        assert!(!store.qualifies(10));
        assert!(store.qualifies(11));
        assert!(!store.submit("p", 5));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn blank_names_are_rejected() {
        let path = temp_file("highscores-blank");
        let mut store = HighScoreStore::new(path.clone());
        assert!(!store.submit("   ", 99));
        assert!(store.entries().is_empty());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn table_survives_a_reload() {
        let path = temp_file("highscores-reload");
        {
            let mut store = HighScoreStore::new(path.clone());
            store.submit(" Alice ", 120);
            store.submit("Bob", 80);
        }
        let store = HighScoreStore::new(path.clone());
        assert_eq!(store.entries().len(), 2);
        assert_eq!(store.entries()[0].name, "Alice");
        assert_eq!(store.entries()[0].score, 120);

        let parent = path.parent().expect("parent exists").to_path_buf();
        let _ = fs::remove_file(path);
        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let path = temp_file("highscores-corrupt");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(&path, "{ not json").expect("write file");

        let store = HighScoreStore::new(path.clone());
        assert!(store.entries().is_empty());

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn load_keeps_valid_entries_when_invalid_entries_exist() {
        let path = temp_file("highscores-partial");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{
  "version": 1,
  "entries": [
    { "name": "Alice", "score": 120, "recordedAt": "2026-01-01T00:00:00.000Z" },
    { "name": "Broken", "score": "not-a-number" },
    { "name": "   ", "score": 50, "recordedAt": "2026-01-01T00:00:00.000Z" },
    { "name": "Bob", "score": -5, "recordedAt": "2026-01-01T00:00:00.000Z" },
    { "name": "Carol", "score": 90, "recorded_at": "2026-01-01T00:00:00.000Z" }
  ]
}"#;
        fs::write(&path, raw).expect("write file");

        let store = HighScoreStore::new(path.clone());
        let names: Vec<&str> = store
            .entries()
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice", "Carol"]);

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn unsupported_version_loads_as_empty() {
        let path = temp_file("highscores-version");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{ "version": 2, "entries": [] }"#;
        fs::write(&path, raw).expect("write file");

        let store = HighScoreStore::new(path.clone());
        assert!(store.entries().is_empty());

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&parent);
    }
}
