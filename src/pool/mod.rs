//! Handle pool: a growable vector of [`Stream`]s keyed by integer entry id,
//! bounded to `max_open` concurrently open streams via LRU eviction with
//! transparent reopen (`spec.md` §4.G).

pub mod lru;
pub mod sync;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::flags::{AccessFlags, Whence};
use crate::stream::Stream;
use lru::{Handle as LruHandle, Lru};

pub type EntryId = usize;

struct Slot {
    stream: Stream,
    flags: AccessFlags,
    link: Option<LruHandle>,
}

/// Bounded-concurrency pool of [`Stream`]s.
///
/// Single-threaded cooperative per `spec.md` §5: wrap in [`sync::SyncPool`]
/// for multi-threaded access.
pub struct Pool {
    slots: Vec<Option<Slot>>,
    open_count: u32,
    max_open: Option<u32>,
    lru: Lru,
}

impl Pool {
    pub fn new(initial_slots: usize, max_open: Option<u32>) -> Self {
        let mut slots = Vec::with_capacity(initial_slots);
        slots.resize_with(initial_slots, || None);
        Pool {
            slots,
            open_count: 0,
            max_open,
            lru: Lru::new(),
        }
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn get_max_open(&self) -> Option<u32> {
        self.max_open
    }

    pub fn set_max_open(&mut self, max_open: Option<u32>) {
        self.max_open = max_open;
    }

    /// Grow the slot vector; never shrinks.
    pub fn resize(&mut self, num_slots: usize) {
        if num_slots > self.slots.len() {
            self.slots.resize_with(num_slots, || None);
        }
    }

    pub fn get_stream(&self, entry: EntryId) -> Result<&Stream> {
        self.slot(entry).map(|s| &s.stream)
    }

    pub fn get_stream_mut(&mut self, entry: EntryId) -> Result<&mut Stream> {
        self.slot_mut(entry).map(|s| &mut s.stream)
    }

    fn slot(&self, entry: EntryId) -> Result<&Slot> {
        self.slots
            .get(entry)
            .and_then(|s| s.as_ref())
            .ok_or_else(|| Error::ArgumentInvalid(format!("entry {entry} is not occupied")))
    }

    fn slot_mut(&mut self, entry: EntryId) -> Result<&mut Slot> {
        self.slots
            .get_mut(entry)
            .and_then(|s| s.as_mut())
            .ok_or_else(|| Error::ArgumentInvalid(format!("entry {entry} is not occupied")))
    }

    fn place(&mut self, index: usize, stream: Stream, flags: AccessFlags) -> Result<EntryId> {
        let is_open = stream.is_open()?;
        let mut slot = Slot {
            stream,
            flags,
            link: None,
        };
        if is_open {
            if let Some(max) = self.max_open {
                if self.open_count >= max {
                    return Err(Error::ResourceExhausted(
                        "pool is at max_open and the new stream is already open".to_string(),
                    ));
                }
            }
            slot.link = Some(self.lru.push_front(index));
            self.open_count += 1;
        }
        self.slots[index] = Some(slot);
        Ok(index)
    }

    /// Append `stream` (auto-extending the slot vector), returning its
    /// entry id.
    pub fn append(&mut self, stream: Stream, flags: AccessFlags) -> Result<EntryId> {
        let index = self.slots.iter().position(|s| s.is_none()).unwrap_or_else(|| {
            self.slots.push(None);
            self.slots.len() - 1
        });
        self.place(index, stream, flags)
    }

    /// Place `stream` into slot `entry`, which must currently be empty.
    pub fn set(&mut self, entry: EntryId, stream: Stream, flags: AccessFlags) -> Result<EntryId> {
        if entry >= self.slots.len() {
            self.slots.resize_with(entry + 1, || None);
        }
        if self.slots[entry].is_some() {
            return Err(Error::StateInvalid(format!(
                "entry {entry} is already occupied"
            )));
        }
        self.place(entry, stream, flags)
    }

    /// Remove and return the stream at `entry`, leaving the slot empty.
    pub fn remove(&mut self, entry: EntryId) -> Result<Stream> {
        let slot = self
            .slots
            .get_mut(entry)
            .and_then(|s| s.take())
            .ok_or_else(|| Error::ArgumentInvalid(format!("entry {entry} is not occupied")))?;
        if let Some(link) = slot.link {
            self.lru.detach(link);
            self.open_count -= 1;
        }
        Ok(slot.stream)
    }

    /// Internal open helper (`spec.md` §4.G): if already open, promote to
    /// MRU and return; otherwise evict the LRU stream if at capacity, open
    /// the target, and push it to the head.
    fn open_helper(&mut self, entry: EntryId) -> Result<()> {
        if self.slot(entry)?.stream.is_open()? {
            if let Some(link) = self.slot(entry)?.link {
                self.lru.move_to_front(link);
            }
            return Ok(());
        }

        if let Some(max) = self.max_open {
            if self.open_count >= max {
                self.evict_one()?;
            }
        }

        let flags = self.slot(entry)?.flags;
        let target_offset = self.slot(entry)?.stream.get_offset();
        self.slot_mut(entry)?.stream.open(flags)?;
        if flags.read() {
            self.slot_mut(entry)?.stream.seek(target_offset, Whence::Set)?;
        }
        let link = self.lru.push_front(entry);
        self.slot_mut(entry)?.link = Some(link);
        self.open_count += 1;
        Ok(())
    }

    fn evict_one(&mut self) -> Result<()> {
        let Some((victim, _)) = self.lru.pop_back() else {
            return Ok(());
        };
        debug!(entry = victim, "evicting LRU stream to open another entry");
        let Some(slot) = self.slots.get_mut(victim).and_then(|s| s.as_mut()) else {
            self.open_count = self.open_count.saturating_sub(1);
            return Ok(());
        };
        slot.link = None;
        // The eviction must not destroy data on reopen: silently drop a
        // pending truncate so the next open only restores access, not
        // content.
        slot.flags = slot.flags.without_truncate();
        match slot.stream.close() {
            Ok(()) => {}
            Err(e) => {
                warn!(entry = victim, error = %e, "evicting close failed");
                self.open_count = self.open_count.saturating_sub(1);
                return Err(e);
            }
        }
        self.open_count = self.open_count.saturating_sub(1);
        Ok(())
    }

    pub fn open(&mut self, entry: EntryId, flags: AccessFlags) -> Result<()> {
        if self.slot(entry)?.stream.is_open()? {
            return Err(Error::StateInvalid(format!("entry {entry} already open")));
        }
        self.slot_mut(entry)?.flags = flags;
        self.open_helper(entry)
    }

    pub fn reopen(&mut self, entry: EntryId, flags: AccessFlags) -> Result<()> {
        if !self.slot(entry)?.stream.is_open()? {
            return Err(Error::StateInvalid(format!("entry {entry} is not open")));
        }
        self.slot_mut(entry)?.stream.reopen(flags)?;
        self.slot_mut(entry)?.flags = flags;
        Ok(())
    }

    pub fn close(&mut self, entry: EntryId) -> Result<()> {
        let slot = self.slot_mut(entry)?;
        if let Some(link) = slot.link.take() {
            self.lru.detach(link);
            self.open_count = self.open_count.saturating_sub(1);
        }
        self.slot_mut(entry)?.stream.close()
    }

    pub fn close_all(&mut self) -> Result<()> {
        let entries: Vec<EntryId> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
            .collect();
        for entry in entries {
            if self.slot(entry)?.stream.is_open()? {
                self.close(entry)?;
            }
        }
        Ok(())
    }

    fn ensure_open_for_access(&mut self, entry: EntryId) -> Result<()> {
        self.slot(entry)?; // validate occupied
        if !self.slot(entry)?.stream.is_open()? {
            self.open_helper(entry)?;
        } else if let Some(link) = self.slot(entry)?.link {
            self.lru.move_to_front(link);
        }
        Ok(())
    }

    pub fn read(&mut self, entry: EntryId, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open_for_access(entry)?;
        self.slot_mut(entry)?.stream.read(buf)
    }

    pub fn write(&mut self, entry: EntryId, buf: &[u8]) -> Result<usize> {
        self.ensure_open_for_access(entry)?;
        self.slot_mut(entry)?.stream.write(buf)
    }

    pub fn seek(&mut self, entry: EntryId, offset: i64, whence: Whence) -> Result<i64> {
        self.ensure_open_for_access(entry)?;
        self.slot_mut(entry)?.stream.seek(offset, whence)
    }

    pub fn get_size(&mut self, entry: EntryId) -> Result<u64> {
        self.ensure_open_for_access(entry)?;
        self.slot_mut(entry)?.stream.get_size()
    }

    pub fn get_offset(&mut self, entry: EntryId) -> Result<i64> {
        self.ensure_open_for_access(entry)?;
        Ok(self.slot_mut(entry)?.stream.get_offset())
    }

    /// Invariant check used by tests: `open_count == lru.len()`.
    pub fn open_count(&self) -> u32 {
        self.open_count
    }
}
