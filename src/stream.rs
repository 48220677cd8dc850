//! `Stream`: orchestrates a backend through its dispatch, tracking access
//! flags, logical offset, lazy size, open-on-demand mode, and an optional
//! read-range index (`spec.md` §3/§4.F).

use std::cell::Cell;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::backend::file::FileBackend;
use crate::backend::file_range::FileRangeBackend;
use crate::backend::memory::MemoryBackend;
use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::flags::{AccessFlags, Whence};
use crate::range_index::{Interval, RangeIndex};

/// A polymorphic byte stream over a file, memory buffer, or bounded file
/// slice.
#[derive(Debug)]
pub struct Stream {
    backend: Backend,
    flags: AccessFlags,
    offset: i64,
    size: Cell<Option<u64>>,
    open_on_demand: bool,
    reads: Option<RangeIndex>,
}

impl Stream {
    fn from_backend(backend: Backend) -> Self {
        Stream {
            backend,
            flags: AccessFlags::NONE,
            offset: 0,
            size: Cell::new(None),
            open_on_demand: false,
            reads: None,
        }
    }

    pub fn new_file(path: impl AsRef<Path>) -> Self {
        Self::from_backend(Backend::File(FileBackend::new(path.as_ref().to_path_buf())))
    }

    pub fn new_memory(buf: Arc<[u8]>) -> Self {
        Self::from_backend(Backend::Memory(MemoryBackend::new_read_only(buf)))
    }

    pub fn new_memory_mut(buf: Arc<Mutex<Vec<u8>>>) -> Self {
        Self::from_backend(Backend::Memory(MemoryBackend::new_read_write(buf)))
    }

    /// Wrap `file` (must not yet be open as part of another live stream)
    /// restricted to `[range_offset, range_offset+range_size)`; `range_size
    /// == 0` means "until end of file".
    pub fn new_file_range(path: impl AsRef<Path>, range_offset: u64, range_size: u64) -> Self {
        let inner = FileBackend::new(path.as_ref().to_path_buf());
        Self::from_backend(Backend::FileRange(FileRangeBackend::new(
            inner,
            range_offset,
            range_size,
        )))
    }

    pub fn set_open_on_demand(&mut self, on: bool) -> Result<()> {
        if on && self.flags.write() {
            return Err(Error::StateInvalid(
                "open-on-demand requires idempotent reopen, incompatible with write".to_string(),
            ));
        }
        self.open_on_demand = on;
        Ok(())
    }

    pub fn set_track_reads(&mut self, on: bool) {
        if on && self.reads.is_none() {
            self.reads = Some(RangeIndex::new());
        }
        if !on {
            self.reads = None;
        }
    }

    pub fn read_ranges_len(&self) -> usize {
        self.reads.as_ref().map_or(0, RangeIndex::len)
    }

    pub fn get_read_range(&self, i: usize) -> Option<Interval> {
        self.reads.as_ref().and_then(|r| r.get(i)).copied()
    }

    pub fn get_offset(&self) -> i64 {
        self.offset
    }

    pub fn is_open(&self) -> Result<bool> {
        self.backend.is_open()
    }

    pub fn exists(&self) -> Result<bool> {
        self.backend.exists()
    }

    /// Open with `flags`. Open-on-demand streams merely record the flags —
    /// the backend is opened lazily around each read.
    pub fn open(&mut self, flags: AccessFlags) -> Result<()> {
        if flags.is_empty_access() {
            return Err(Error::ArgumentInvalid(
                "stream open requires read and/or write".to_string(),
            ));
        }
        if self.open_on_demand {
            if flags.write() {
                return Err(Error::ArgumentInvalid(
                    "open-on-demand stream cannot request write".to_string(),
                ));
            }
            self.flags = flags;
            return Ok(());
        }
        self.backend.open(flags)?;
        self.flags = flags;
        Ok(())
    }

    /// No-op if `flags` already match. Otherwise close, then (unless
    /// open-on-demand) reopen with the new flags and — only when the new
    /// flags include read — reseek to the remembered logical offset
    /// (`spec.md` §4.F).
    pub fn reopen(&mut self, flags: AccessFlags) -> Result<()> {
        if flags == self.flags {
            return Ok(());
        }
        self.close()?;
        if self.open_on_demand {
            self.flags = flags;
            return Ok(());
        }
        self.backend.open(flags)?;
        if flags.read() {
            self.backend.seek(self.offset, Whence::Set)?;
        }
        // Flags are committed only after the backend open succeeds, so a
        // failed reopen leaves the stream observably in its prior state.
        self.flags = flags;
        Ok(())
    }

    /// Returns `Ok(())` silently if already closed under open-on-demand
    /// (`spec.md` §4.F); otherwise invokes the backend close unconditionally.
    pub fn close(&mut self) -> Result<()> {
        if self.open_on_demand && !self.backend.is_open()? {
            return Ok(());
        }
        self.backend.close()
    }

    fn resync_for_demand_open(&mut self) -> Result<()> {
        if !self.backend.is_open()? {
            self.backend.open(self.flags)?;
            self.backend.seek(self.offset, Whence::Set)?;
        }
        Ok(())
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.open_on_demand {
            self.resync_for_demand_open()?;
        }
        let n = self.backend.read(buf)?;
        if n > 0 {
            if let Some(reads) = self.reads.as_mut() {
                reads.append(self.offset, n as u64)?;
            }
            self.offset += n as i64;
        }
        if self.open_on_demand {
            self.backend.close()?;
        }
        Ok(n)
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.backend.write(buf)?;
        self.offset += n as i64;
        Ok(n)
    }

    /// A seek to the current offset is a pure no-op — it never touches the
    /// backend (`spec.md` §4.F / §8 idempotence laws).
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<i64> {
        if whence == Whence::Set && offset == self.offset {
            return Ok(self.offset);
        }
        if self.open_on_demand {
            self.resync_for_demand_open()?;
        }
        let new_offset = self.backend.seek(offset, whence)?;
        self.offset = new_offset;
        if self.open_on_demand {
            self.backend.close()?;
        }
        Ok(new_offset)
    }

    /// Lazy: the first call invokes the backend and caches the result; the
    /// cache is never invalidated (a grown/shrunk file needs a new stream).
    pub fn get_size(&self) -> Result<u64> {
        if let Some(size) = self.size.get() {
            return Ok(size);
        }
        let size = self.backend.get_size()?;
        self.size.set(Some(size));
        Ok(size)
    }

    /// Duplicate the backend state, open the clone with the same flags, and
    /// seek it to this stream's current offset. The read-range index is not
    /// cloned.
    pub fn try_clone(&self) -> Result<Stream> {
        let mut clone = Stream {
            backend: self.backend.try_clone()?,
            flags: self.flags,
            offset: 0,
            size: Cell::new(self.size.get()),
            open_on_demand: self.open_on_demand,
            reads: None,
        };
        if !self.open_on_demand {
            clone.backend.open(self.flags)?;
            clone.backend.seek(self.offset, Whence::Set)?;
        }
        clone.offset = self.offset;
        debug!(offset = self.offset, "stream cloned");
        Ok(clone)
    }

    pub(crate) fn flags(&self) -> AccessFlags {
        self.flags
    }
}
