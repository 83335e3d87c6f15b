//! Local-first terminal diary: one plain-text entry per calendar day, plus a
//! persisted dark-mode preference.

pub mod app;
pub mod calendar;
pub mod error;
pub mod logging;
pub mod models;
pub mod notes;
pub mod prefs;
pub mod screen;
pub mod storage;
pub mod ui;

pub use error::{DiaryError, Result};
pub use models::NO_ENTRY_SENTINEL;
pub use notes::NoteStore;
pub use prefs::PreferenceStore;
