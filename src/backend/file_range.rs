//! Bounded-slice view over a [`FileBackend`] (`spec.md` §4.E).
//!
//! All offsets this backend presents to callers are measured from
//! `range_offset`; a `range_size` of 0 means "until end of underlying file".

use std::io::SeekFrom;

use crate::backend::file::FileBackend;
use crate::error::{Error, Result};
use crate::flags::{AccessFlags, Whence};

#[derive(Debug)]
pub struct FileRangeBackend {
    pub(crate) inner: FileBackend,
    pub(crate) range_offset: u64,
    pub(crate) range_size: u64,
}

impl FileRangeBackend {
    pub fn new(inner: FileBackend, range_offset: u64, range_size: u64) -> Self {
        FileRangeBackend {
            inner,
            range_offset,
            range_size,
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    pub fn open(&mut self, flags: AccessFlags) -> Result<()> {
        self.inner.open(flags)?;
        self.inner
            .seek(SeekFrom::Start(self.range_offset))
            .map(|_| ())
    }

    pub fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    pub fn exists(&self) -> Result<bool> {
        self.inner.exists()
    }

    /// `range_size`, or (when 0) the underlying file size minus
    /// `range_offset`.
    pub fn effective_size(&self) -> Result<u64> {
        if self.range_size != 0 {
            return Ok(self.range_size);
        }
        Ok(self.inner.get_size()?.saturating_sub(self.range_offset))
    }

    pub fn get_size(&self) -> Result<u64> {
        self.effective_size()
    }

    /// Current logical offset within the range, derived from the
    /// underlying file's absolute position.
    fn logical_position(&mut self) -> Result<i64> {
        let abs = self.inner.seek(SeekFrom::Current(0))?;
        Ok(abs - self.range_offset as i64)
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let size = self.effective_size()? as i64;
        let pos = self.logical_position()?;
        if pos >= size {
            return Ok(0);
        }
        let clamped = (size - pos) as usize;
        let n = buf.len().min(clamped);
        self.inner.read(&mut buf[..n])
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.inner.write(buf)
    }

    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<i64> {
        let size = self.effective_size()? as i64;
        let current = self.logical_position()?;
        let target = whence.resolve(offset, current, size)?;
        if target < 0 {
            return Err(Error::ArgumentInvalid(
                "seek before start of file range".to_string(),
            ));
        }
        let abs = target
            .checked_add(self.range_offset as i64)
            .ok_or_else(|| Error::ArgumentInvalid("range seek overflows i64".to_string()))?;
        self.inner.seek(SeekFrom::Start(abs as u64))?;
        Ok(target)
    }

    pub fn try_clone(&self) -> Result<FileRangeBackend> {
        Ok(FileRangeBackend {
            inner: self.inner.try_clone()?,
            range_offset: self.range_offset,
            range_size: self.range_size,
        })
    }
}
