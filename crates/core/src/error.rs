use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a Photos library (no database/Photos.sqlite): {}", .0.display())]
    LibraryNotFound(PathBuf),

    #[error("derivatives directory not found: {}", .0.display())]
    DerivativesDirNotFound(PathBuf),

    #[error("derivative path cannot be resolved: {}", .0.display())]
    MissingPath(PathBuf),

    #[error("not authenticated — log in first")]
    NotAuthenticated,

    #[error("authentication rejected for user {0}")]
    AuthRejected(String),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },
}

pub type Result<T> = std::result::Result<T, Error>;
