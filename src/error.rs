use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, DiaryError>;

#[derive(Debug, thiserror::Error)]
pub enum DiaryError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid date `{0}`: expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Configured diary path is invalid: {0}")]
    InvalidDir(String),
    #[error("Could not determine home directory")]
    NoHomeDir,
}

impl DiaryError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}
