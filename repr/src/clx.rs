//! The piece table
//!
//! The piece table lives in the table stream, at the offset given by the FIB's `fcClx`.
//! It may be preceded by any number of property records:
//!
//! ```text
//! while read_u8() == PROPERTY_TAG {
//!     skip(read_u16())
//! }
//! // the tag just read must be PIECE_TABLE_TAG
//! size = read_u32()
//! count = (size - 4) / 12
//! char_positions = [read_u32(); count + 1]
//! descriptors = [Descriptor; count]
//! ```
//!
//! Piece `i` holds the characters `char_positions[i]..char_positions[i + 1]`, stored at the
//! file position encoded in `descriptors[i]`.

use static_assertions::assert_eq_size;
use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{AsBytes, FromBytes, Unaligned};

/// Tag of a property record, which is skipped
pub const PROPERTY_TAG: u8 = 1;

/// Tag of the piece table itself
pub const PIECE_TABLE_TAG: u8 = 2;

/// The size of a character position in bytes
pub const CHAR_POSITION_SIZE: usize = 4;

/// The bytes used on disk by one piece: a character position plus a descriptor.
pub const RECORD_SIZE: usize = CHAR_POSITION_SIZE + DESCRIPTOR_SIZE;

/// The size of a [`Descriptor`](struct.Descriptor.html)
pub const DESCRIPTOR_SIZE: usize = 8;

/// A piece descriptor
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Descriptor {
    pub flags: U16<LittleEndian>,
    /// See [`EncodedPosition`](struct.EncodedPosition.html)
    pub file_position: U32<LittleEndian>,
    /// Property modifier, unused for text extraction
    pub property: U16<LittleEndian>,
}

assert_eq_size!(Descriptor, [u8; DESCRIPTOR_SIZE]);

impl Descriptor {
    pub const OFFSET_FILE_POSITION: usize = 2;
}

/// The position of a piece's text within the `WordDocument` stream, plus its encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EncodedPosition(pub u32);

impl EncodedPosition {
    /// Set if the piece is stored in the single byte code page
    pub const SINGLE_BYTE_FLAG: u32 = 1 << 30;
    /// Clears the flag bits
    pub const MASK: u32 = !(3 << 30);

    /// Encodes a byte offset of a text run stored one byte per character
    pub fn single_byte(offset: u32) -> Self {
        EncodedPosition((offset * 2) | Self::SINGLE_BYTE_FLAG)
    }

    /// Encodes a byte offset of a text run stored as UTF-16LE
    pub fn two_byte(offset: u32) -> Self {
        EncodedPosition(offset)
    }

    /// Return true if the characters of the piece are 2 bytes wide
    pub fn is_two_byte(self) -> bool {
        self.0 & Self::SINGLE_BYTE_FLAG == 0
    }

    /// The byte offset of the piece's first character
    pub fn offset(self) -> u32 {
        if self.is_two_byte() {
            self.0
        } else {
            (self.0 & Self::MASK) / 2
        }
    }
}
