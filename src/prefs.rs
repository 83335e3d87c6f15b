//! Persisted dark-mode preference with live subscriptions.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::sync::watch;

use crate::error::{DiaryError, Result};
use crate::models::Preferences;
use crate::storage::atomic_write;

pub const DARK_MODE_KEY: &str = "dark_mode";

/// Owns the preference file and publishes the flag to subscribers.
///
/// Subscribers receive a `watch::Receiver`, which always holds the latest
/// value. No async runtime is needed to read it.
pub struct PreferenceStore {
    path: PathBuf,
    tx: watch::Sender<bool>,
}

impl PreferenceStore {
    /// Loads the preference file at `path`. A missing file, or one that does
    /// not parse, leaves the flag at its default.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let prefs = load_preferences(&path)?;
        let (tx, _rx) = watch::channel(prefs.dark_mode);
        Ok(Self { path, tx })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_flag(&self) -> bool {
        *self.tx.borrow()
    }

    /// Persists `value` and notifies subscribers if it changed. When the
    /// write fails the published value is left as it was.
    pub fn set_flag(&self, value: bool) -> Result<()> {
        let prefs = Preferences { dark_mode: value };
        let data =
            serde_json::to_string_pretty(&prefs).map_err(|e| DiaryError::json(&self.path, e))?;
        atomic_write(&self.path, data.as_bytes())?;
        info!("event=pref_write key={DARK_MODE_KEY} value={value}");

        self.tx.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
        Ok(())
    }

    pub fn toggle(&self) -> Result<bool> {
        let next = !self.get_flag();
        self.set_flag(next)?;
        Ok(next)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

fn load_preferences(path: &Path) -> Result<Preferences> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Preferences::default()),
        Err(e) => return Err(DiaryError::io(path, e)),
    };
    match serde_json::from_str(&raw) {
        Ok(prefs) => Ok(prefs),
        Err(e) => {
            warn!(
                "event=pref_load status=corrupt path={} error={e}",
                path.display()
            );
            Ok(Preferences::default())
        }
    }
}
