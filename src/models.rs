use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DiaryError, Result};

/// Returned by a read when a date has no usable entry.
pub const NO_ENTRY_SENTINEL: &str = "No diary entry found.";
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// ISO form of a date, used as the entry file stem.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` key. Unpadded or decorated forms are rejected.
pub fn parse_date_key(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date = NaiveDate::parse_from_str(trimmed, DATE_KEY_FORMAT)
        .map_err(|_| DiaryError::InvalidDate(raw.to_string()))?;
    if date_key(date) != trimmed {
        return Err(DiaryError::InvalidDate(raw.to_string()));
    }
    Ok(date)
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}
