use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TidyError>;

#[derive(Debug, Error)]
pub enum TidyError {
    #[error("index document not found: {}", .0.display())]
    IndexNotFound(PathBuf),

    #[error("content directory not found: {}", .0.display())]
    MissingContentDirectory(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl TidyError {
    /// Adapter for `map_err` that attaches the path being worked on.
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> TidyError + '_ {
        move |source| TidyError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
