//! Thread-safe wrapper around [`Pool`] (`spec.md` §9 "Shared mutable pool
//! state"). Nearly every public operation mutates the LRU list, so a
//! read/write split buys little; every method here takes the single
//! exclusive lock for its whole duration and releases it on every exit
//! path, including error paths.

use parking_lot::Mutex;

use crate::error::Result;
use crate::flags::{AccessFlags, Whence};

use super::{EntryId, Pool};

pub struct SyncPool {
    inner: Mutex<Pool>,
}

impl SyncPool {
    pub fn new(initial_slots: usize, max_open: Option<u32>) -> Self {
        SyncPool {
            inner: Mutex::new(Pool::new(initial_slots, max_open)),
        }
    }

    pub fn num_slots(&self) -> usize {
        self.inner.lock().num_slots()
    }

    pub fn get_max_open(&self) -> Option<u32> {
        self.inner.lock().get_max_open()
    }

    pub fn set_max_open(&self, max_open: Option<u32>) {
        self.inner.lock().set_max_open(max_open)
    }

    pub fn resize(&self, num_slots: usize) {
        self.inner.lock().resize(num_slots)
    }

    pub fn append(&self, stream: crate::stream::Stream, flags: AccessFlags) -> Result<EntryId> {
        self.inner.lock().append(stream, flags)
    }

    pub fn set(
        &self,
        entry: EntryId,
        stream: crate::stream::Stream,
        flags: AccessFlags,
    ) -> Result<EntryId> {
        self.inner.lock().set(entry, stream, flags)
    }

    pub fn remove(&self, entry: EntryId) -> Result<crate::stream::Stream> {
        self.inner.lock().remove(entry)
    }

    pub fn open(&self, entry: EntryId, flags: AccessFlags) -> Result<()> {
        self.inner.lock().open(entry, flags)
    }

    pub fn reopen(&self, entry: EntryId, flags: AccessFlags) -> Result<()> {
        self.inner.lock().reopen(entry, flags)
    }

    pub fn close(&self, entry: EntryId) -> Result<()> {
        self.inner.lock().close(entry)
    }

    pub fn close_all(&self) -> Result<()> {
        self.inner.lock().close_all()
    }

    pub fn read(&self, entry: EntryId, buf: &mut [u8]) -> Result<usize> {
        self.inner.lock().read(entry, buf)
    }

    pub fn write(&self, entry: EntryId, buf: &[u8]) -> Result<usize> {
        self.inner.lock().write(entry, buf)
    }

    pub fn seek(&self, entry: EntryId, offset: i64, whence: Whence) -> Result<i64> {
        self.inner.lock().seek(entry, offset, whence)
    }

    pub fn get_size(&self, entry: EntryId) -> Result<u64> {
        self.inner.lock().get_size(entry)
    }

    pub fn get_offset(&self, entry: EntryId) -> Result<i64> {
        self.inner.lock().get_offset(entry)
    }

    pub fn open_count(&self) -> u32 {
        self.inner.lock().open_count()
    }
}
