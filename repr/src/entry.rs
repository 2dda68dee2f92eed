//! Directory entries
//!
//! The directory is a flat array of 128 byte records stored in a block chain starting at
//! the header's `entries_start`. Entry 0 is always the root. The entries of one directory
//! level form a binary tree: the directory's `child` points at one member, and every member
//! links to its `previous` and `next` siblings. A negative index means "no entry".

use static_assertions::assert_eq_size;
use zerocopy::byteorder::{LittleEndian, I32, U16, U32};
use zerocopy::{AsBytes, FromBytes, Unaligned};

/// The size of a directory entry in bytes
pub const SIZE: usize = 128;

/// The number of directory entries stored in a block
pub const PER_BLOCK: usize = crate::BLOCK_SIZE / SIZE;

/// The maximum number of UTF-16 code units in a name, including the terminating null
pub const NAME_UNITS: usize = 32;

#[derive(Debug, Copy, Clone, PartialEq, Eq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Entry {
    /// UTF-16LE name, terminated by a null code unit
    pub name: [U16<LittleEndian>; NAME_UNITS],
    /// The size of the name in bytes, including the terminating null
    pub name_size: U16<LittleEndian>,
    /// See [`Kind`](struct.Kind.html)
    pub kind: u8,
    /// Red-black tree node color. Not needed to walk the tree
    pub color: u8,
    /// The index of the previous sibling
    pub previous: I32<LittleEndian>,
    /// The index of the next sibling
    pub next: I32<LittleEndian>,
    /// The index of the first child, for directories and the root
    pub child: I32<LittleEndian>,
    pub clsid: [u8; 16],
    pub state: U32<LittleEndian>,
    pub created: [u8; 8],
    pub modified: [u8; 8],
    /// The first block of the entry's stream
    pub start_block: I32<LittleEndian>,
    /// The size of the entry's stream in bytes
    pub size: I32<LittleEndian>,
    pub reserved: [u8; 4],
}

assert_eq_size!(Entry, [u8; SIZE]);

impl Entry {
    pub const OFFSET_KIND: usize = 0x42;
    pub const OFFSET_PREVIOUS: usize = 0x44;
    pub const OFFSET_NEXT: usize = 0x48;
    pub const OFFSET_CHILD: usize = 0x4C;
    pub const OFFSET_START_BLOCK: usize = 0x74;
    pub const OFFSET_SIZE: usize = 0x78;

    /// The name's code units, up to (not including) the first null
    pub fn name_units(&self) -> impl Iterator<Item = u16> + '_ {
        self.name
            .iter()
            .map(|unit| unit.get())
            .take_while(|&unit| unit != 0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Kind(pub u8);

impl Kind {
    pub const DIRECTORY: Kind = Kind(1);
    pub const FILE: Kind = Kind(2);
    pub const ROOT: Kind = Kind(5);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_offsets() {
        let mut entry = Entry::new_zeroed();
        entry.kind = 2;
        entry.previous = I32::new(-1);
        entry.next = I32::new(7);
        entry.child = I32::new(0x0A0B_0C0D);
        entry.start_block = I32::new(42);
        entry.size = I32::new(0x1000);

        let bytes = entry.as_bytes();
        let at = |offset: usize| &bytes[offset..offset + 4];
        assert_eq!(bytes[Entry::OFFSET_KIND], 2);
        assert_eq!(at(Entry::OFFSET_PREVIOUS), &[0xFF; 4]);
        assert_eq!(at(Entry::OFFSET_NEXT), &[7, 0, 0, 0]);
        assert_eq!(at(Entry::OFFSET_CHILD), &[0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(at(Entry::OFFSET_START_BLOCK), &[42, 0, 0, 0]);
        assert_eq!(at(Entry::OFFSET_SIZE), &[0, 0x10, 0, 0]);
    }

    #[test]
    fn name_stops_at_null() {
        let mut entry = Entry::new_zeroed();
        for (slot, unit) in entry.name.iter_mut().zip("Root".encode_utf16()) {
            *slot = U16::new(unit);
        }
        let name = String::from_utf16_lossy(&entry.name_units().collect::<Vec<_>>());
        assert_eq!(name, "Root");
    }
}
