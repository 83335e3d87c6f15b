//! Date-keyed note storage.
//!
//! Each calendar date owns at most one plain-text file, `<YYYY-MM-DD>.txt`,
//! inside a private directory. Content is stored verbatim as UTF-8 with no
//! header or metadata.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};

use crate::error::{DiaryError, Result};
use crate::models::{NO_ENTRY_SENTINEL, date_key, parse_date_key};
use crate::storage::{atomic_write, ensure_dir};

pub const NOTE_EXTENSION: &str = "txt";

#[derive(Debug, Clone)]
pub struct NoteStore {
    dir: PathBuf,
}

impl NoteStore {
    /// Opens the store rooted at `dir`, creating it with owner-only access.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.{NOTE_EXTENSION}", date_key(date)))
    }

    /// Stores `text` as the note for `date`, replacing any previous note.
    pub fn write(&self, date: NaiveDate, text: &str) -> Result<()> {
        atomic_write(&self.path_for(date), text.as_bytes())?;
        info!(
            "event=note_write date={} bytes={}",
            date_key(date),
            text.len()
        );
        Ok(())
    }

    /// The note for `date`, or [`NO_ENTRY_SENTINEL`] when there is no file or
    /// the stored text is blank.
    pub fn read(&self, date: NaiveDate) -> Result<String> {
        match self.load(date)? {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Ok(NO_ENTRY_SENTINEL.to_string()),
        }
    }

    /// Raw stored text, `None` when no file exists.
    pub fn load(&self, date: NaiveDate) -> Result<Option<String>> {
        let path = self.path_for(date);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("event=note_read date={} status=missing", date_key(date));
                Ok(None)
            }
            Err(e) => Err(DiaryError::io(&path, e)),
        }
    }

    pub fn exists(&self, date: NaiveDate) -> bool {
        self.path_for(date).is_file()
    }

    /// Removes the note for `date`. Returns whether a file was removed.
    pub fn delete(&self, date: NaiveDate) -> Result<bool> {
        let path = self.path_for(date);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("event=note_delete date={} status=removed", date_key(date));
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("event=note_delete date={} status=missing", date_key(date));
                Ok(false)
            }
            Err(e) => Err(DiaryError::io(&path, e)),
        }
    }

    /// Dates that currently have a note file, ascending.
    ///
    /// This scans the directory on every call. Files that are not named
    /// after an ISO date are skipped.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DiaryError::io(&self.dir, e)),
        };

        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DiaryError::io(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(NOTE_EXTENSION)
            {
                continue;
            }
            // Only exact keys count; `path_for` never names anything else.
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if let Ok(date) = parse_date_key(stem) {
                if date_key(date) == stem {
                    dates.push(date);
                }
            }
        }
        dates.sort();
        Ok(dates)
    }
}
