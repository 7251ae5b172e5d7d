//! On-disk record format
//!
//! A partition file is a flat sequence of fixed-width records in write order:
//!
//! ```text
//! +----------------------+--------------+
//! | timestamp (i64, BE)  | value (i32)  |   12 bytes, no header or footer
//! +----------------------+--------------+
//! ```
//!
//! A crash in the middle of an append can leave a short record at the end of
//! the file; readers stop at the last complete record.

mod reader;

pub use reader::RecordReader;

use crate::Timestamp;
use bytes::{Buf, BufMut};

/// Size of one encoded record in bytes
pub const RECORD_SIZE: usize = std::mem::size_of::<i64>() + std::mem::size_of::<i32>();

/// A decoded record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub timestamp: Timestamp,
    pub value: i32,
}

impl Record {
    /// Create a new record
    pub fn new(timestamp: Timestamp, value: i32) -> Self {
        Self { timestamp, value }
    }

    /// Encode into a fixed-size buffer
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        let mut cursor = &mut buf[..];
        cursor.put_i64(self.timestamp);
        cursor.put_i32(self.value);
        buf
    }

    /// Decode one record from the front of `data`.
    ///
    /// Returns `None` when fewer than [`RECORD_SIZE`] bytes are available.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < RECORD_SIZE {
            return None;
        }
        let mut cursor = &data[..RECORD_SIZE];
        let timestamp = cursor.get_i64();
        let value = cursor.get_i32();
        Some(Self { timestamp, value })
    }
}
