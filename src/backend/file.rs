//! File-backed backend (`spec.md` §4.C).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, IoKind, Result};
use crate::flags::AccessFlags;

#[derive(Debug)]
pub struct FileBackend {
    pub(crate) path: PathBuf,
    pub(crate) flags: AccessFlags,
    pub(crate) file: Option<File>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBackend {
            path: path.into(),
            flags: AccessFlags::NONE,
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn open(&mut self, flags: AccessFlags) -> Result<()> {
        if flags.is_empty_access() {
            return Err(Error::ArgumentInvalid(
                "file backend requires read and/or write".to_string(),
            ));
        }
        let mut opts = OpenOptions::new();
        // `spec.md` §4.C's flag -> OS-flag matrix.
        match (flags.read(), flags.write()) {
            (true, true) => {
                opts.read(true).write(true).create(true);
            }
            (true, false) => {
                opts.read(true);
            }
            (false, true) => {
                opts.write(true).create(true);
            }
            (false, false) => unreachable!("rejected above"),
        }
        if flags.write() && flags.truncate() {
            opts.truncate(true);
        }
        let file = opts.open(&self.path).map_err(|e| classify_open_error(&self.path, e))?;
        debug!(path = %self.path.display(), ?flags, "file backend opened");
        self.file = Some(file);
        self.flags = flags;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            drop(file);
            debug!(path = %self.path.display(), "file backend closed");
        }
        Ok(())
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() > isize::MAX as usize {
            return Err(Error::ArgumentInvalid(
                "read size exceeds isize::MAX".to_string(),
            ));
        }
        let file = self.file.as_mut().ok_or_else(|| {
            Error::StateInvalid("read on closed file backend".to_string())
        })?;
        file.read(buf).map_err(|e| Error::io(IoKind::Read, e))
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.len() > isize::MAX as usize {
            return Err(Error::ArgumentInvalid(
                "write size exceeds isize::MAX".to_string(),
            ));
        }
        let file = self.file.as_mut().ok_or_else(|| {
            Error::StateInvalid("write on closed file backend".to_string())
        })?;
        file.write(buf).map_err(|e| Error::io(IoKind::Write, e))
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<i64> {
        let file = self.file.as_mut().ok_or_else(|| {
            Error::StateInvalid("seek on closed file backend".to_string())
        })?;
        let new_pos = file.seek(pos).map_err(|e| Error::io(IoKind::Seek, e))?;
        i64::try_from(new_pos)
            .map_err(|_| Error::ArgumentInvalid("seek result exceeds i64::MAX".to_string()))
    }

    /// Prefer a stat-like call so size is available whether or not the
    /// backend is currently open (`spec.md` §4.C).
    pub fn get_size(&self) -> Result<u64> {
        let meta = match &self.file {
            Some(f) => f.metadata(),
            None => std::fs::metadata(&self.path),
        };
        meta.map(|m| m.len())
            .map_err(|e| classify_open_error(&self.path, e))
    }

    /// Attempt to open read-only; permission-denied counts as "exists",
    /// not-found as "absent", anything else propagates (`spec.md` §4.C).
    pub fn exists(&self) -> Result<bool> {
        match File::open(&self.path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(IoKind::Open, e)),
        }
    }

    pub fn try_clone(&self) -> Result<FileBackend> {
        let file = match &self.file {
            Some(f) => Some(f.try_clone().map_err(|e| Error::io(IoKind::Open, e))?),
            None => None,
        };
        Ok(FileBackend {
            path: self.path.clone(),
            flags: self.flags,
            file,
        })
    }
}

fn classify_open_error(path: &Path, e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
        std::io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        _ => Error::io(IoKind::Open, e),
    }
}
