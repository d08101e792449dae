// ABOUTME: Append-only JSONL history log for debate records.
// ABOUTME: One JSON record per line; timestamps are injected at write time.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use council_core::DebateRecord;

/// Errors that can occur during history log operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An append-only history log backed by a JSONL file. Each line is one
/// serialized DebateRecord followed by a newline.
pub struct HistoryLog {
    path: PathBuf,
    file: File,
}

impl HistoryLog {
    /// Returns the path to the underlying JSONL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open (or create) a history log at the given path. Creates parent
    /// directories if they do not exist; the file is opened in append mode.
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Append a record. A record without a timestamp gets the current UTC
    /// time; an existing timestamp is preserved. The line is fsynced so a
    /// crash cannot drop an acknowledged write.
    pub fn append(&mut self, record: &DebateRecord) -> Result<(), HistoryError> {
        let mut record = record.clone();
        if record.timestamp.is_none() {
            record.timestamp = Some(Utc::now());
        }

        let json = serde_json::to_string(&record)?;
        writeln!(self.file, "{}", json)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Read all records back in order. Empty lines are skipped; an empty
    /// file yields an empty Vec.
    pub fn replay(path: &Path) -> Result<Vec<DebateRecord>, HistoryError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: DebateRecord = serde_json::from_str(&line)?;
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_core::{MISSING_MODERATOR, MemberRecord, ProviderKind, ReplyRecord};
    use tempfile::TempDir;

    fn make_record(prompt: &str) -> DebateRecord {
        let reply = ReplyRecord {
            member: "gemini:gemini-2.0-flash".to_string(),
            text: "An answer.".to_string(),
            error: None,
        };
        DebateRecord {
            prompt: prompt.to_string(),
            members: vec![MemberRecord {
                provider: ProviderKind::Gemini,
                model: "gemini-2.0-flash".to_string(),
            }],
            round1: vec![reply.clone()],
            round2: vec![reply],
            moderator: ReplyRecord {
                member: String::new(),
                text: String::new(),
                error: Some(MISSING_MODERATOR.to_string()),
            },
            timestamp: None,
        }
    }

    #[test]
    fn append_and_replay_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");

        let mut log = HistoryLog::open(&path).unwrap();
        log.append(&make_record("first")).unwrap();
        log.append(&make_record("second")).unwrap();

        let records = HistoryLog::replay(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prompt, "first");
        assert_eq!(records[1].prompt, "second");
    }

    #[test]
    fn append_injects_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");

        let record = make_record("timestamped");
        assert!(record.timestamp.is_none());

        let mut log = HistoryLog::open(&path).unwrap();
        log.append(&record).unwrap();

        let records = HistoryLog::replay(&path).unwrap();
        assert!(records[0].timestamp.is_some());

        // Replayed records match the written one except for the timestamp.
        let mut replayed = records[0].clone();
        replayed.timestamp = None;
        assert_eq!(replayed, record);
    }

    #[test]
    fn existing_timestamp_is_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");

        let stamp = "2026-01-02T03:04:05Z".parse().unwrap();
        let mut record = make_record("stamped");
        record.timestamp = Some(stamp);

        let mut log = HistoryLog::open(&path).unwrap();
        log.append(&record).unwrap();

        let records = HistoryLog::replay(&path).unwrap();
        assert_eq!(records[0].timestamp, Some(stamp));
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("history.jsonl");

        let mut log = HistoryLog::open(&path).unwrap();
        log.append(&make_record("nested")).unwrap();

        assert!(path.exists());
        assert_eq!(HistoryLog::replay(&path).unwrap().len(), 1);
    }

    #[test]
    fn replay_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.jsonl");
        File::create(&path).unwrap();

        let records = HistoryLog::replay(&path).unwrap();
        assert!(records.is_empty());
    }
}
