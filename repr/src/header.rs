//! The header occupies the first 512 bytes of the file. All fields are little endian.

use static_assertions::assert_eq_size;
use zerocopy::byteorder::{LittleEndian, I32, U16, U32};
use zerocopy::{AsBytes, FromBytes, Unaligned};

/// The file type signature of a compound file
pub const MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// The number of BAT block numbers stored directly in the header.
///
/// The BAT blocks beyond this are listed in XBAT blocks.
pub const HEADER_BAT_LIMIT: usize = 109;

#[derive(Debug, Copy, Clone, PartialEq, Eq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Header {
    /// Should match [`MAGIC`](constant.MAGIC.html)
    pub magic: [u8; 8],
    /// Reserved, normally all zero
    pub clsid: [u8; 16],
    pub minor_version: U16<LittleEndian>,
    /// 3 for 512 byte blocks, 4 for 4096 byte blocks
    pub major_version: U16<LittleEndian>,
    /// `0xFFFE` when the file is little endian, which is always
    pub byte_order: U16<LittleEndian>,
    /// The log2 of the block size
    pub block_shift: U16<LittleEndian>,
    /// The log2 of the small block size
    pub small_block_shift: U16<LittleEndian>,
    pub reserved: [u8; 6],
    /// The number of directory blocks. Always 0 for 512 byte blocks
    pub directory_block_count: U32<LittleEndian>,
    /// The number of BAT blocks
    pub bat_count: I32<LittleEndian>,
    /// The first block of the directory entry chain
    pub entries_start: I32<LittleEndian>,
    pub transaction_signature: U32<LittleEndian>,
    /// Streams smaller than this are stored in the small block stream
    pub small_stream_cutoff: U32<LittleEndian>,
    /// The first block of the small BAT
    pub small_bat_start: I32<LittleEndian>,
    /// The number of small BAT blocks
    pub small_bat_count: I32<LittleEndian>,
    /// The first XBAT block. XBAT blocks are stored contiguously
    pub xbat_start: I32<LittleEndian>,
    /// The number of XBAT blocks
    pub xbat_count: I32<LittleEndian>,
    /// The block numbers of the first 109 BAT blocks
    pub bat_blocks: [I32<LittleEndian>; HEADER_BAT_LIMIT],
}

assert_eq_size!(Header, [u8; crate::BLOCK_SIZE]);

impl Header {
    pub const OFFSET_BAT_COUNT: usize = 0x2C;
    pub const OFFSET_ENTRIES_START: usize = 0x30;
    pub const OFFSET_SMALL_BAT_START: usize = 0x3C;
    pub const OFFSET_SMALL_BAT_COUNT: usize = 0x40;
    pub const OFFSET_XBAT_START: usize = 0x44;
    pub const OFFSET_XBAT_COUNT: usize = 0x48;
    pub const OFFSET_BAT_BLOCKS: usize = 0x4C;
}
