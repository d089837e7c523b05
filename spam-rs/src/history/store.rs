//! File-backed classification history
//!
//! Two append-only files: a human-readable log with one rendered event per
//! line, and a structured `timestamp,label` log read by the statistics.
//! Both are guarded by one lock so every append and clear touches the pair
//! as a single operation.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use super::types::{ClassificationEvent, HistoryQuery, StructuredProjection, STRUCTURED_HEADER};
use crate::config::HistoryConfig;
use crate::error::{Result, SpamError};

/// Append-only log of classification events
pub trait HistoryStore: Send + Sync {
    /// Record one event in both projections; durable on return
    fn append(&self, event: &ClassificationEvent) -> Result<()>;

    /// Rendered lines matching `query`, as a fresh vector
    fn query(&self, query: &HistoryQuery) -> Result<Vec<String>>;

    /// Drop every event from both projections
    fn clear(&self) -> Result<()>;

    /// The structured projection, or `None` when it is absent or empty
    fn read_structured(&self) -> Result<Option<StructuredProjection>>;
}

/// History kept in two flat files
pub struct FileHistoryStore {
    log_path: PathBuf,
    structured_path: PathBuf,
    lock: RwLock<()>,
}

impl FileHistoryStore {
    pub fn new(log_path: impl Into<PathBuf>, structured_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            structured_path: structured_path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.log_path.clone(), config.structured_path.clone())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn structured_path(&self) -> &Path {
        &self.structured_path
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, ()>> {
        self.lock
            .read()
            .map_err(|_| SpamError::Storage("history lock poisoned".to_string()))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, ()>> {
        self.lock
            .write()
            .map_err(|_| SpamError::Storage("history lock poisoned".to_string()))
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    SpamError::Storage(format!("Failed to create directory {:?}: {}", parent, e))
                })?;
            }
        }
        Ok(())
    }

    fn append_line(path: &Path, line: &str) -> Result<u64> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let previous_len = file.metadata()?.len();
        writeln!(file, "{}", line)?;
        file.sync_data()?;
        Ok(previous_len)
    }

    fn append_structured(&self, event: &ClassificationEvent) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.structured_path)?;

        let mut buf = String::new();
        if file.metadata()?.len() == 0 {
            buf.push_str(&STRUCTURED_HEADER.join(","));
            buf.push('\n');
        }
        buf.push_str(&event.structured_row());
        buf.push('\n');

        file.write_all(buf.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    /// Undo a human-readable append whose structured half failed
    fn rollback_log(&self, previous_len: u64) -> Result<()> {
        let file = OpenOptions::new().write(true).open(&self.log_path)?;
        file.set_len(previous_len)?;
        file.sync_data()?;
        Ok(())
    }

    fn open_for_clear(path: &Path) -> Result<File> {
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?)
    }

    fn truncate(file: &File) -> Result<()> {
        file.set_len(0)?;
        file.sync_all()?;
        Ok(())
    }

    /// Put back structured content removed by a clear whose log half failed
    fn restore(mut file: &File, content: &[u8]) -> Result<()> {
        file.seek(SeekFrom::Start(0))?;
        file.write_all(content)?;
        file.sync_all()?;
        Ok(())
    }

    fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl HistoryStore for FileHistoryStore {
    fn append(&self, event: &ClassificationEvent) -> Result<()> {
        let _guard = self.write_guard()?;

        Self::ensure_parent(&self.log_path)?;
        Self::ensure_parent(&self.structured_path)?;

        let previous_len = Self::append_line(&self.log_path, &event.render())?;

        if let Err(e) = self.append_structured(event) {
            warn!(
                "Structured history append failed, rolling back {}: {}",
                self.log_path.display(),
                e
            );
            if let Err(rollback) = self.rollback_log(previous_len) {
                warn!("History rollback failed: {}", rollback);
            }
            return Err(e);
        }

        debug!("Recorded {} event in history", event.label);
        Ok(())
    }

    fn query(&self, query: &HistoryQuery) -> Result<Vec<String>> {
        let _guard = self.read_guard()?;

        // The log is opaque text; undecodable bytes must not hide the good lines
        let raw = Self::read_if_exists(&self.log_path)?.unwrap_or_default();
        let content = String::from_utf8_lossy(&raw);
        let lines = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.to_string());

        Ok(query.apply(lines))
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.write_guard()?;

        Self::ensure_parent(&self.log_path)?;
        Self::ensure_parent(&self.structured_path)?;

        // Both files are opened before either is touched
        let mut structured = Self::open_for_clear(&self.structured_path)?;
        let log = Self::open_for_clear(&self.log_path)?;

        let mut backup = Vec::new();
        structured.read_to_end(&mut backup)?;

        Self::truncate(&structured)?;
        if let Err(e) = Self::truncate(&log) {
            warn!(
                "Clearing {} failed, restoring {}: {}",
                self.log_path.display(),
                self.structured_path.display(),
                e
            );
            if let Err(restore) = Self::restore(&structured, &backup) {
                warn!("History restore failed: {}", restore);
            }
            return Err(e);
        }

        info!("Cleared classification history");
        Ok(())
    }

    /// Undecodable content is reported as [`SpamError::MalformedHistory`]
    fn read_structured(&self) -> Result<Option<StructuredProjection>> {
        let _guard = self.read_guard()?;

        let Some(raw) = Self::read_if_exists(&self.structured_path)? else {
            return Ok(None);
        };
        let content = String::from_utf8(raw).map_err(|e| {
            SpamError::MalformedHistory(format!(
                "{} is not valid UTF-8: {}",
                self.structured_path.display(),
                e.utf8_error()
            ))
        })?;

        Ok(StructuredProjection::parse(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Label;
    use crate::history::{HistoryFilter, HistoryOrder};

    fn store(dir: &Path) -> FileHistoryStore {
        FileHistoryStore::new(dir.join("history.txt"), dir.join("history.csv"))
    }

    #[test]
    fn test_append_writes_both_projections() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        store
            .append(&ClassificationEvent::new(Label::Spam, 0.91, "win free money"))
            .unwrap();
        store
            .append(&ClassificationEvent::new(Label::Ham, 0.75, "lunch?"))
            .unwrap();

        let log = fs::read_to_string(store.log_path()).unwrap();
        assert_eq!(log.lines().count(), 2);
        assert!(log.contains("🚫 SPAM | Confidence: 0.91 | Text: win free money"));

        let csv = fs::read_to_string(store.structured_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,label");
        assert!(lines[1].ends_with(",spam"));
        assert!(lines[2].ends_with(",ham"));
    }

    #[test]
    fn test_query_missing_files_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        assert!(store.query(&HistoryQuery::default()).unwrap().is_empty());
        assert!(store.read_structured().unwrap().is_none());
    }

    #[test]
    fn test_query_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        for text in ["A", "B", "C"] {
            store
                .append(&ClassificationEvent::new(Label::Ham, 0.6, text))
                .unwrap();
        }

        let newest = store
            .query(&HistoryQuery::new(HistoryFilter::All, HistoryOrder::NewestFirst, None))
            .unwrap();
        let texts: Vec<&str> = newest.iter().map(|l| l.rsplit("Text: ").next().unwrap()).collect();
        assert_eq!(texts, vec!["C", "B", "A"]);

        let oldest = store
            .query(&HistoryQuery::new(HistoryFilter::All, HistoryOrder::OldestFirst, None))
            .unwrap();
        let texts: Vec<&str> = oldest.iter().map(|l| l.rsplit("Text: ").next().unwrap()).collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_clear_truncates_and_restarts_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store
            .append(&ClassificationEvent::new(Label::Spam, 0.9, "spam"))
            .unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.query(&HistoryQuery::default()).unwrap().is_empty());
        assert!(store.read_structured().unwrap().is_none());
        assert_eq!(fs::read_to_string(store.structured_path()).unwrap(), "");

        store
            .append(&ClassificationEvent::new(Label::Ham, 0.9, "ham"))
            .unwrap();
        let projection = store.read_structured().unwrap().unwrap();
        assert_eq!(projection.header, vec!["timestamp", "label"]);
        assert_eq!(projection.rows.len(), 1);
    }

    #[test]
    fn test_failed_structured_append_rolls_back_log() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the structured file should be makes its append fail
        let structured = dir.path().join("history.csv");
        fs::create_dir(&structured).unwrap();
        let store = FileHistoryStore::new(dir.path().join("history.txt"), &structured);

        let result = store.append(&ClassificationEvent::new(Label::Spam, 0.9, "lost"));
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(store.log_path()).unwrap(), "");
    }

    #[test]
    fn test_query_tolerates_undecodable_log_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store
            .append(&ClassificationEvent::new(Label::Spam, 0.91, "win free money"))
            .unwrap();

        let mut file = OpenOptions::new().append(true).open(store.log_path()).unwrap();
        file.write_all(b"garbage \xff line\n").unwrap();

        let lines = store
            .query(&HistoryQuery::new(HistoryFilter::Spam, HistoryOrder::NewestFirst, None))
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("win free money"));

        // The damaged line is still listed, as opaque text
        assert_eq!(store.query(&HistoryQuery::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_failed_clear_leaves_both_projections() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store
            .append(&ClassificationEvent::new(Label::Spam, 0.9, "kept"))
            .unwrap();

        // Swap the structured file for a directory so it cannot be opened
        fs::remove_file(store.structured_path()).unwrap();
        fs::create_dir(store.structured_path()).unwrap();

        assert!(store.clear().is_err());
        let log = fs::read_to_string(store.log_path()).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains("kept"));
    }

    fn counts(log: &[u8], structured: &[u8]) -> (usize, usize) {
        let log_lines = String::from_utf8_lossy(log)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count();
        let rows = String::from_utf8_lossy(structured)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count()
            .saturating_sub(1);
        (log_lines, rows)
    }

    #[test]
    fn test_readers_never_see_torn_updates() {
        use std::sync::atomic::{AtomicBool, Ordering};

        const BATCH: usize = 3;
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for round in 0..50 {
                    for i in 0..BATCH {
                        store
                            .append(&ClassificationEvent::new(
                                Label::Ham,
                                0.7,
                                format!("round {} message {}", round, i),
                            ))
                            .unwrap();
                    }
                    store.clear().unwrap();
                }
                done.store(true, Ordering::SeqCst);
            });

            while !done.load(Ordering::SeqCst) {
                {
                    let _guard = store.read_guard().unwrap();
                    let log = fs::read(store.log_path()).unwrap_or_default();
                    let structured = fs::read(store.structured_path()).unwrap_or_default();
                    let (log_lines, rows) = counts(&log, &structured);
                    assert_eq!(log_lines, rows);
                    assert!(log_lines <= BATCH);
                }

                let lines = store.query(&HistoryQuery::default()).unwrap();
                assert!(lines.len() <= BATCH);
                assert!(lines.iter().all(|l| l.contains("message")));

                if let Some(projection) = store.read_structured().unwrap() {
                    assert_eq!(projection.header, vec!["timestamp", "label"]);
                    assert!(projection.rows.len() <= BATCH);
                    assert!(projection.rows.iter().all(|r| r.len() == 2 && r[1] == "ham"));
                }
            }
        });

        assert!(store.query(&HistoryQuery::default()).unwrap().is_empty());
        assert!(store.read_structured().unwrap().is_none());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::new(
            dir.path().join("logs/history.txt"),
            dir.path().join("logs/structured/history.csv"),
        );
        store
            .append(&ClassificationEvent::new(Label::Ham, 0.9, "hi"))
            .unwrap();
        assert!(store.structured_path().exists());
    }
}
