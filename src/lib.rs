//! `iopool` — a uniform byte-stream abstraction over heterogeneous
//! backends (files, bounded file slices, in-memory buffers) and a
//! bounded-concurrency pool that multiplexes a fixed cap of open OS
//! descriptors across an unbounded logical set of such streams.
//!
//! See `SPEC_FULL.md` in the repository root for the full design.

pub mod backend;
pub mod config;
pub mod error;
pub mod flags;
pub mod pool;
pub mod range_index;
pub mod stream;

pub use error::{Error, Result};
pub use flags::{AccessFlags, Whence, READ, TRUNCATE, WRITE};
pub use pool::Pool;
pub use range_index::{Interval, RangeIndex};
pub use stream::Stream;
