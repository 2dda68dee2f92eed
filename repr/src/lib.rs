//! An OLE compound file is a flat file divided into fixed size blocks:
//!
//! * [Header](header/index.html), occupying the first 512 bytes
//! * Block Allocation Table (BAT) blocks, each mapping 128 blocks to their successor
//! * Extended BAT (XBAT) blocks, holding the BAT block numbers which do not fit in the header
//! * [Directory entries](entry/index.html), 4 per block, chained through the BAT like any stream
//! * Stream data
//!
//! Word documents store two streams of interest inside the container:
//!
//! * `WordDocument`, which starts with the [File Information Block](fib/index.html) and holds
//!   the text itself
//! * `0Table` or `1Table`, which holds the [piece table](clx/index.html)

pub mod clx;
pub mod entry;
pub mod fib;
pub mod header;

/// The size of a block (and of the header) in bytes
pub const BLOCK_SIZE: usize = 512;

/// The number of block pointers held by a single BAT or XBAT block
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;

/// Returns the byte offset of a block within the file.
///
/// Block numbering starts immediately after the header, so block 0 is stored at offset 512.
/// Negative block numbers have no position.
#[inline]
pub fn block_offset(block: i32) -> Option<u64> {
    if block < 0 {
        None
    } else {
        Some((block as u64 + 1) * BLOCK_SIZE as u64)
    }
}

/// Special values stored in the BAT instead of a successor block number.
///
/// Any negative value ends a chain; these are the ones the format defines.
pub mod sentinel {
    /// The block is unused
    pub const FREE: i32 = -1;
    /// The block is the last block of its chain
    pub const END_OF_CHAIN: i32 = -2;
    /// The block holds part of the BAT
    pub const BAT: i32 = -3;
    /// The block holds part of the XBAT
    pub const XBAT: i32 = -4;
}
