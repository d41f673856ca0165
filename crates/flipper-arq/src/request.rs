//! In-memory layout of a transfer request record.
//!
//! A request is a 32-byte big-endian record owned by the caller. The
//! scheduler threads requests into its lanes through the `NEXT` field and
//! rewrites the transfer cursor (`SOURCE`/`DEST`/`LENGTH`) as chunks are
//! issued; the rest of the record is written once at post time.

/// Size of one request record, in bytes.
pub const REQUEST_SIZE: u32 = 0x20;

/// Byte offsets of the request record fields.
pub mod field {
    /// Next request in the lane queue (console address, `0` = none).
    pub const NEXT: u32 = 0x00;
    /// Opaque owner tag, passed through untouched.
    pub const OWNER: u32 = 0x04;
    /// Transfer direction, [`KIND_MRAM_TO_ARAM`](super::KIND_MRAM_TO_ARAM)
    /// or [`KIND_ARAM_TO_MRAM`](super::KIND_ARAM_TO_MRAM).
    pub const KIND: u32 = 0x08;
    /// Lane the request was posted to. Written for record parity; dispatch
    /// never reads it back (lane selection happens at post time).
    pub const PRIORITY: u32 = 0x0C;
    /// Transfer source address.
    pub const SOURCE: u32 = 0x10;
    /// Transfer destination address.
    pub const DEST: u32 = 0x14;
    /// Remaining transfer length, in bytes.
    pub const LENGTH: u32 = 0x18;
    /// Completion-callback flag; always stored as `1` (a null caller
    /// callback is backed by the scheduler's internal completion hook).
    pub const HAS_CALLBACK: u32 = 0x1C;
}

/// Main memory → auxiliary RAM.
pub const KIND_MRAM_TO_ARAM: u32 = 0;
/// Auxiliary RAM → main memory.
pub const KIND_ARAM_TO_MRAM: u32 = 1;

pub const PRIORITY_LOW: u32 = 0;
pub const PRIORITY_HIGH: u32 = 1;

/// Default split size for low-priority transfers, in bytes.
pub const DEFAULT_CHUNK_SIZE: u32 = 4096;
