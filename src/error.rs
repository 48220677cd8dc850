use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which phase of a backend I/O operation failed.
///
/// Collapsing `IoOpen`/`IoClose`/`IoRead`/`IoWrite`/`IoSeek` into one
/// `Error::Io` variant parameterized on this enum keeps the error type from
/// growing five near-identical `thiserror` variants while still letting
/// callers match on which phase failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoKind {
    Open,
    Close,
    Read,
    Write,
    Seek,
}

impl fmt::Display for IoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IoKind::Open => "open",
            IoKind::Close => "close",
            IoKind::Read => "read",
            IoKind::Write => "write",
            IoKind::Seek => "seek",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    ArgumentInvalid(String),

    #[error("invalid state: {0}")]
    StateInvalid(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("backend {kind} failed: {source}")]
    Io {
        kind: IoKind,
        #[source]
        source: std::io::Error,
    },

    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("path encoding conversion failed: {0}")]
    Conversion(String),
}

impl Error {
    pub fn io(kind: IoKind, source: std::io::Error) -> Self {
        Error::Io { kind, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
