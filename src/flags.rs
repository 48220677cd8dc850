use std::io::SeekFrom;

use crate::error::{Error, Result};

/// Access-flag bits (`spec.md` §6). `TRUNCATE` is meaningful only combined
/// with `WRITE`.
pub const READ: u8 = 0x01;
pub const WRITE: u8 = 0x02;
pub const TRUNCATE: u8 = 0x04;

/// Bit set of [`READ`]/[`WRITE`]/[`TRUNCATE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessFlags(u8);

impl AccessFlags {
    pub const NONE: AccessFlags = AccessFlags(0);

    pub fn from_bits(bits: u8) -> Self {
        AccessFlags(bits & (READ | WRITE | TRUNCATE))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn read(self) -> bool {
        self.0 & READ != 0
    }

    pub fn write(self) -> bool {
        self.0 & WRITE != 0
    }

    pub fn truncate(self) -> bool {
        self.0 & TRUNCATE != 0
    }

    /// Neither read nor write requested — every backend rejects this.
    pub fn is_empty_access(self) -> bool {
        !self.read() && !self.write()
    }

    /// Flags with `TRUNCATE` cleared — used when an eviction-driven close
    /// must not let a subsequent reopen destroy the file's contents
    /// (`spec.md` §4.G internal open helper).
    pub fn without_truncate(self) -> Self {
        AccessFlags(self.0 & !TRUNCATE)
    }
}

impl std::ops::BitOr for AccessFlags {
    type Output = AccessFlags;
    fn bitor(self, rhs: AccessFlags) -> AccessFlags {
        AccessFlags(self.0 | rhs.0)
    }
}

/// Seek origin (`spec.md` §6). `Set=0`, `Cur=1`, `End=2`; any other value is
/// `Error::ArgumentInvalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End,
}

impl Whence {
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Whence::Set),
            1 => Ok(Whence::Cur),
            2 => Ok(Whence::End),
            other => Err(Error::ArgumentInvalid(format!(
                "unsupported whence code {other}"
            ))),
        }
    }

    pub(crate) fn resolve(self, offset: i64, current: i64, effective_size: i64) -> Result<i64> {
        let base = match self {
            Whence::Set => 0,
            Whence::Cur => current,
            Whence::End => effective_size,
        };
        base.checked_add(offset).ok_or_else(|| {
            Error::ArgumentInvalid("seek target overflows i64".to_string())
        })
    }

    /// `Whence::Set` treats `offset` as an absolute position, so a negative
    /// value is rejected rather than clamped to 0 — matching the memory and
    /// file-range backends, which reject any resolved cursor below zero.
    pub(crate) fn to_seek_from(self, offset: i64) -> Result<SeekFrom> {
        match self {
            Whence::Set => {
                if offset < 0 {
                    return Err(Error::ArgumentInvalid(
                        "seek before start of file".to_string(),
                    ));
                }
                Ok(SeekFrom::Start(offset as u64))
            }
            Whence::Cur => Ok(SeekFrom::Current(offset)),
            Whence::End => Ok(SeekFrom::End(offset)),
        }
    }
}
