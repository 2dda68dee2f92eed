//! The File Information Block
//!
//! The `WordDocument` stream starts with the FIB. Only the handful of fields needed to find
//! the text are described here; they are read individually at fixed offsets.

use bitflags::bitflags;

/// The u16 [`Flags`](struct.Flags.html)
pub const OFFSET_FLAGS: u64 = 10;
/// The i32 file offset of the first character of text
pub const OFFSET_FC_MIN: u64 = 24;
/// The i32 file offset just past the last character of text
pub const OFFSET_FC_MAX: u64 = 28;
/// The i32 number of characters in the main document
pub const OFFSET_CCP_TEXT: u64 = 76;
/// The i32 offset of the piece table in the table stream
pub const OFFSET_FC_CLX: u64 = 418;
/// The i32 size of the piece table in bytes
pub const OFFSET_LCB_CLX: u64 = 422;

/// The name of the stream holding the FIB and the text
pub const MAIN_STREAM: &str = "WordDocument";
/// The table stream used when `Flags::TABLE_ONE` is clear
pub const TABLE_ZERO: &str = "0Table";
/// The table stream used when `Flags::TABLE_ONE` is set
pub const TABLE_ONE: &str = "1Table";

bitflags! {
    pub struct Flags: u16 {
        /// The document is a template
        const TEMPLATE   = 1;
        /// The document is a glossary
        const GLOSSARY   = 1 << 1;
        /// The document was fast-saved, it may have many pieces
        const COMPLEX    = 1 << 2;
        /// The document contains pictures
        const HAS_PICTURES = 1 << 3;
        /// The document is encrypted
        const ENCRYPTED  = 1 << 8;
        /// The piece table is stored in `1Table` rather than `0Table`
        const TABLE_ONE  = 1 << 9;
    }
}

impl Flags {
    /// The name of the stream holding the piece table
    pub fn table_stream(self) -> &'static str {
        if self.contains(Flags::TABLE_ONE) {
            TABLE_ONE
        } else {
            TABLE_ZERO
        }
    }
}
