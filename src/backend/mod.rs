//! Backend dispatch (`spec.md` §4.B).
//!
//! The backend set is closed — file, memory, bounded file-range — so this
//! is a tagged union with inherent per-variant dispatch rather than a
//! trait-object vtable, per the §9 design note: it avoids an indirect call
//! on the read hot path and the set has no plans to grow.

pub mod file;
pub mod file_range;
pub mod memory;

use crate::error::Result;
use crate::flags::{AccessFlags, Whence};

use file::FileBackend;
use file_range::FileRangeBackend;
use memory::MemoryBackend;

#[derive(Debug)]
pub enum Backend {
    File(FileBackend),
    Memory(MemoryBackend),
    FileRange(FileRangeBackend),
}

impl Backend {
    pub fn is_open(&self) -> Result<bool> {
        Ok(match self {
            Backend::File(b) => b.is_open(),
            Backend::Memory(b) => b.is_open(),
            Backend::FileRange(b) => b.is_open(),
        })
    }

    pub fn open(&mut self, flags: AccessFlags) -> Result<()> {
        match self {
            Backend::File(b) => b.open(flags),
            Backend::Memory(b) => b.open(flags),
            Backend::FileRange(b) => b.open(flags),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        match self {
            Backend::File(b) => b.close(),
            Backend::Memory(b) => b.close(),
            Backend::FileRange(b) => b.close(),
        }
    }

    pub fn exists(&self) -> Result<bool> {
        match self {
            Backend::File(b) => b.exists(),
            Backend::Memory(b) => b.exists(),
            Backend::FileRange(b) => b.exists(),
        }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Backend::File(b) => b.read(buf),
            Backend::Memory(b) => b.read(buf),
            Backend::FileRange(b) => b.read(buf),
        }
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self {
            Backend::File(b) => b.write(buf),
            Backend::Memory(b) => b.write(buf),
            Backend::FileRange(b) => b.write(buf),
        }
    }

    /// File backend seeks via `std::io::Seek` directly (the OS already
    /// knows the current position and EOF); memory and file-range backends
    /// need the whence resolved against their own tracked cursor/size.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<i64> {
        match self {
            Backend::File(b) => b.seek(whence.to_seek_from(offset)?),
            Backend::Memory(b) => b.seek(offset, whence),
            Backend::FileRange(b) => b.seek(offset, whence),
        }
    }

    pub fn get_size(&self) -> Result<u64> {
        match self {
            Backend::File(b) => b.get_size(),
            Backend::Memory(b) => b.get_size(),
            Backend::FileRange(b) => b.get_size(),
        }
    }

    pub fn try_clone(&self) -> Result<Backend> {
        Ok(match self {
            Backend::File(b) => Backend::File(b.try_clone()?),
            Backend::Memory(b) => Backend::Memory(b.try_clone()?),
            Backend::FileRange(b) => Backend::FileRange(b.try_clone()?),
        })
    }
}
