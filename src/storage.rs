use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DiaryError, Result};

pub const DIARY_DIR: &str = ".terminal-diary";
pub const ENTRIES_DIR: &str = "entries";
pub const PREFS_FILE: &str = "prefs.json";
pub const CONFIG_FILE: &str = "config.json";
pub const LOG_DIR: &str = "logs";

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diary_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(DiaryError::NoHomeDir)
}

pub fn default_base_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(DIARY_DIR))
}

/// The config file always lives in the default directory, even when it
/// points the diary somewhere else.
pub fn config_path() -> Result<PathBuf> {
    Ok(default_base_dir()?.join(CONFIG_FILE))
}

pub fn load_config() -> Result<Option<Config>> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| DiaryError::io(path, e))?;
    let cfg: Config = serde_json::from_str(&raw).map_err(|e| DiaryError::json(path, e))?;
    Ok(Some(cfg))
}

/// Remembers `base_dir` as the diary directory, keeping other config keys.
pub fn save_config(base_dir: &Path) -> Result<()> {
    let path = config_path()?;
    let validated = validate_configured_dir(base_dir, &home_dir()?)?;
    let mut cfg = load_config_from(&path)?.unwrap_or_default();
    cfg.diary_dir = Some(
        validated
            .to_str()
            .ok_or_else(|| DiaryError::InvalidDir("path is not valid UTF-8".into()))?
            .to_string(),
    );
    write_config(&path, &cfg)
}

pub fn write_config(path: &Path, cfg: &Config) -> Result<()> {
    let data = serde_json::to_string_pretty(cfg).map_err(|e| DiaryError::json(path, e))?;
    atomic_write(path, data.as_bytes())
}

/// Resolves the diary directory from config, falling back to the default.
pub fn configured_base_dir(cfg: Option<&Config>) -> Result<PathBuf> {
    match cfg.and_then(|c| c.diary_dir.as_deref()) {
        Some(dir) => validate_configured_dir(Path::new(dir), &home_dir()?),
        None => default_base_dir(),
    }
}

pub fn entries_dir(base_dir: &Path) -> PathBuf {
    base_dir.join(ENTRIES_DIR)
}

pub fn prefs_path(base_dir: &Path) -> PathBuf {
    base_dir.join(PREFS_FILE)
}

pub fn log_dir(base_dir: &Path) -> PathBuf {
    base_dir.join(LOG_DIR)
}

/// Creates `path` if needed and tightens it to owner-only access.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| DiaryError::io(path, e))?;
    }
    restrict_dir(path)
}

pub fn validate_configured_dir(raw: &Path, home: &Path) -> Result<PathBuf> {
    let candidate = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        home.join(raw)
    };

    if candidate
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(DiaryError::InvalidDir(
            "parent traversal is not allowed".into(),
        ));
    }
    if !candidate.starts_with(home) {
        return Err(DiaryError::InvalidDir(format!(
            "must be inside home directory ({})",
            home.display()
        )));
    }

    // A symlink inside home may still point outside of it.
    let home_real = fs::canonicalize(home).unwrap_or_else(|_| home.to_path_buf());
    let existing = if candidate.exists() {
        Some(candidate.as_path())
    } else {
        candidate.parent().filter(|p| p.exists())
    };
    if let Some(existing) = existing {
        let real = fs::canonicalize(existing).map_err(|e| DiaryError::io(existing, e))?;
        if !real.starts_with(&home_real) {
            return Err(DiaryError::InvalidDir(format!(
                "resolves outside home directory ({})",
                home.display()
            )));
        }
    }

    Ok(candidate)
}

/// Replaces `path` with `bytes` through a temp file in the same directory.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| DiaryError::InvalidDir(format!("{} has no parent", path.display())))?;
    ensure_dir(parent)?;

    let io_err = |e: std::io::Error| DiaryError::io(path, e);
    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    temp.write_all(bytes).map_err(io_err)?;
    temp.flush().map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| DiaryError::io(path, e.error))?;
    restrict_file(path)
}

fn restrict_file(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if path.exists() {
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms).map_err(|e| DiaryError::io(path, e))?;
        }
    }
    Ok(())
}

fn restrict_dir(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if path.exists() {
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(path, perms).map_err(|e| DiaryError::io(path, e))?;
        }
    }
    Ok(())
}

/// Permission bits of `path`, for the self-check report.
#[cfg(unix)]
pub fn mode_of(path: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    let meta = fs::metadata(path).map_err(|e| DiaryError::io(path, e))?;
    Ok(meta.permissions().mode() & 0o777)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_creates_parent_and_replaces_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("file.txt");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_restricts_permissions() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("private");
        let path = dir.join("file.txt");
        atomic_write(&path, b"x").unwrap();
        assert_eq!(mode_of(&path).unwrap(), 0o600);
        assert_eq!(mode_of(&dir).unwrap(), 0o700);
    }

    #[test]
    fn validate_accepts_relative_path_under_home() {
        let home = tempfile::tempdir().unwrap();
        let resolved = validate_configured_dir(Path::new("journal"), home.path()).unwrap();
        assert_eq!(resolved, home.path().join("journal"));
    }

    #[test]
    fn validate_rejects_parent_traversal() {
        let home = tempfile::tempdir().unwrap();
        let err = validate_configured_dir(Path::new("journal/../../etc"), home.path())
            .unwrap_err();
        assert!(err.to_string().contains("parent traversal"));
    }

    #[test]
    fn validate_rejects_paths_outside_home() {
        let home = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let err = validate_configured_dir(other.path(), home.path()).unwrap_err();
        assert!(matches!(err, DiaryError::InvalidDir(_)));
    }

    #[test]
    fn config_round_trips_and_skips_unset_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        assert!(load_config_from(&path).unwrap().is_none());

        let cfg = Config {
            diary_dir: None,
            log_level: Some("warn".into()),
        };
        write_config(&path, &cfg).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("diary_dir"));
        assert_eq!(load_config_from(&path).unwrap(), Some(cfg));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(DiaryError::Json { .. })
        ));
    }
}
