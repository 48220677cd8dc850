//! In-memory backend over a caller-owned buffer (`spec.md` §4.D).
//!
//! Safe Rust has no equivalent of a raw pointer usable from both a
//! read-only and a read/write constructor, so the backend holds one of two
//! ownership modes instead of one raw-slice state (see DESIGN.md Open
//! Question 2).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::flags::AccessFlags;

#[derive(Clone)]
enum Buffer {
    ReadOnly(Arc<[u8]>),
    ReadWrite(Arc<Mutex<Vec<u8>>>),
}

impl Buffer {
    fn len(&self) -> usize {
        match self {
            Buffer::ReadOnly(b) => b.len(),
            Buffer::ReadWrite(b) => b.lock().len(),
        }
    }
}

pub struct MemoryBackend {
    buffer: Buffer,
    flags: AccessFlags,
    cursor: usize,
}

impl Clone for MemoryBackend {
    fn clone(&self) -> Self {
        MemoryBackend {
            buffer: self.buffer.clone(),
            flags: self.flags,
            cursor: self.cursor,
        }
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("len", &self.buffer.len())
            .field("flags", &self.flags)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl MemoryBackend {
    pub fn new_read_only(buf: Arc<[u8]>) -> Self {
        MemoryBackend {
            buffer: Buffer::ReadOnly(buf),
            flags: AccessFlags::NONE,
            cursor: 0,
        }
    }

    pub fn new_read_write(buf: Arc<Mutex<Vec<u8>>>) -> Self {
        MemoryBackend {
            buffer: Buffer::ReadWrite(buf),
            flags: AccessFlags::NONE,
            cursor: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.flags.bits() != 0
    }

    pub fn open(&mut self, flags: AccessFlags) -> Result<()> {
        if flags.is_empty_access() {
            return Err(Error::ArgumentInvalid(
                "memory backend requires read and/or write".to_string(),
            ));
        }
        if matches!(self.buffer, Buffer::ReadOnly(_)) && flags.write() {
            return Err(Error::ArgumentInvalid(
                "memory backend buffer is read-only".to_string(),
            ));
        }
        if self.is_open() {
            return Err(Error::StateInvalid(
                "memory backend already open".to_string(),
            ));
        }
        self.cursor = 0;
        self.flags = flags;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.flags = AccessFlags::NONE;
        self.cursor = 0;
        Ok(())
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(true)
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.is_open() {
            return Err(Error::StateInvalid(
                "read on closed memory backend".to_string(),
            ));
        }
        match &self.buffer {
            Buffer::ReadOnly(src) => {
                let read_size = buf.len().min(src.len().saturating_sub(self.cursor));
                buf[..read_size].copy_from_slice(&src[self.cursor..self.cursor + read_size]);
                self.cursor += read_size;
                Ok(read_size)
            }
            Buffer::ReadWrite(src) => {
                let src = src.lock();
                // Fixes the source's documented off-by-one: copy exactly
                // `read_size`, never the full request past the end.
                let read_size = buf.len().min(src.len().saturating_sub(self.cursor));
                buf[..read_size].copy_from_slice(&src[self.cursor..self.cursor + read_size]);
                self.cursor += read_size;
                Ok(read_size)
            }
        }
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if !self.is_open() || !self.flags.write() {
            return Err(Error::StateInvalid(
                "write on closed or read-only memory backend".to_string(),
            ));
        }
        match &self.buffer {
            Buffer::ReadOnly(_) => unreachable!("open() rejects write on read-only buffers"),
            Buffer::ReadWrite(dst) => {
                let mut dst = dst.lock();
                // Clamps like read: the buffer is never grown, only written
                // into up to its existing length.
                let write_size = buf.len().min(dst.len().saturating_sub(self.cursor));
                dst[self.cursor..self.cursor + write_size].copy_from_slice(&buf[..write_size]);
                self.cursor += write_size;
                Ok(write_size)
            }
        }
    }

    pub fn seek(&mut self, offset: i64, whence: crate::flags::Whence) -> Result<i64> {
        let len = self.buffer.len() as i64;
        let new_cursor = whence.resolve(offset, self.cursor as i64, len)?;
        if new_cursor < 0 {
            return Err(Error::ArgumentInvalid(
                "seek before start of memory buffer".to_string(),
            ));
        }
        if new_cursor > isize::MAX as i64 {
            return Err(Error::ArgumentInvalid(
                "seek result exceeds isize::MAX".to_string(),
            ));
        }
        self.cursor = new_cursor as usize;
        Ok(new_cursor)
    }

    pub fn get_size(&self) -> Result<u64> {
        Ok(self.buffer.len() as u64)
    }

    pub fn try_clone(&self) -> Result<MemoryBackend> {
        Ok(self.clone())
    }
}
