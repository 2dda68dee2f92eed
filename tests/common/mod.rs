#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use repr::clx::{EncodedPosition, CHAR_POSITION_SIZE, PIECE_TABLE_TAG, RECORD_SIZE};
use repr::entry::Kind;
use repr::header::{Header, HEADER_BAT_LIMIT, MAGIC};
use repr::sentinel::{BAT, END_OF_CHAIN, FREE};
use repr::{fib, BLOCK_SIZE, POINTERS_PER_BLOCK};
use slog::Logger;
use zerocopy::byteorder::{I32, U16};
use zerocopy::{AsBytes, FromBytes};

pub fn discard() -> Logger {
    Logger::root(slog::Discard, slog::o!())
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: u8,
    pub previous: i32,
    pub next: i32,
    pub child: i32,
    pub data: Vec<u8>,
}

impl Node {
    pub fn stream(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            kind: Kind::FILE.0,
            previous: -1,
            next: -1,
            child: -1,
            data,
        }
    }

    pub fn dir(name: &str, child: i32) -> Self {
        Self {
            name: name.to_string(),
            kind: Kind::DIRECTORY.0,
            child,
            ..Self::stream(name, Vec::new())
        }
    }

    pub fn links(mut self, previous: i32, next: i32) -> Self {
        self.previous = previous;
        self.next = next;
        self
    }
}

/// Lays out an in-memory compound file
#[derive(Debug, Clone)]
pub struct CompoundFile {
    pub nodes: Vec<Node>,
    pub magic: [u8; 8],
    /// Allocate blocks out of order, so no chain is contiguous
    pub scatter: bool,
}

impl CompoundFile {
    /// A file with only a root entry with the given child
    pub fn new(root_child: i32) -> Self {
        let mut root = Node::dir("Root Entry", root_child);
        root.kind = Kind::ROOT.0;
        Self {
            nodes: vec![root],
            magic: MAGIC,
            scatter: false,
        }
    }

    /// A root directory holding `streams`, linked as a balanced tree
    pub fn with_streams(streams: Vec<(&str, Vec<u8>)>) -> Self {
        let count = streams.len() as i32;
        let mut file = Self::new(balanced(1, count + 1));
        for (name, data) in streams {
            file.nodes.push(Node::stream(name, data));
        }
        link_balanced(&mut file.nodes, 1, count + 1);
        file
    }

    pub fn push(&mut self, node: Node) -> i32 {
        self.nodes.push(node);
        self.nodes.len() as i32 - 1
    }

    pub fn scattered(mut self) -> Self {
        self.scatter = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let dir_blocks = div_ceil(self.nodes.len(), repr::entry::PER_BLOCK);
        let stream_blocks: Vec<usize> = self
            .nodes
            .iter()
            .map(|node| div_ceil(node.data.len(), BLOCK_SIZE))
            .collect();
        let data_blocks = dir_blocks + stream_blocks.iter().sum::<usize>();
        let mut bat_blocks = 1;
        while bat_blocks * POINTERS_PER_BLOCK < bat_blocks + data_blocks {
            bat_blocks += 1;
        }
        assert!(bat_blocks <= HEADER_BAT_LIMIT);
        let total = bat_blocks + data_blocks;

        let mut pool: Vec<i32> = (bat_blocks as i32..total as i32).collect();
        if self.scatter {
            let mut mixed = Vec::with_capacity(pool.len());
            while !pool.is_empty() {
                mixed.push(pool.pop().unwrap());
                if !pool.is_empty() {
                    mixed.push(pool.remove(0));
                }
            }
            pool = mixed;
        }
        let mut pool = pool.into_iter();

        let mut bat = vec![FREE; bat_blocks * POINTERS_PER_BLOCK];
        for slot in bat.iter_mut().take(bat_blocks) {
            *slot = BAT;
        }
        let mut allocate = |len: usize| -> Vec<i32> {
            let chain: Vec<i32> = pool.by_ref().take(len).collect();
            for pair in chain.windows(2) {
                bat[pair[0] as usize] = pair[1];
            }
            if let Some(&last) = chain.last() {
                bat[last as usize] = END_OF_CHAIN;
            }
            chain
        };
        let dir_chain = allocate(dir_blocks);
        let chains: Vec<Vec<i32>> = stream_blocks.iter().map(|&len| allocate(len)).collect();

        let mut file = vec![0u8; (total + 1) * BLOCK_SIZE];

        let mut header = Header::new_zeroed();
        header.magic = self.magic;
        header.major_version = U16::new(3);
        header.byte_order = U16::new(0xFFFE);
        header.block_shift = U16::new(9);
        header.small_block_shift = U16::new(6);
        header.bat_count = I32::new(bat_blocks as i32);
        header.entries_start = I32::new(dir_chain[0]);
        header.small_bat_start = I32::new(END_OF_CHAIN);
        header.xbat_start = I32::new(END_OF_CHAIN);
        for (i, slot) in header.bat_blocks.iter_mut().enumerate() {
            *slot = I32::new(if i < bat_blocks { i as i32 } else { FREE });
        }
        file[..BLOCK_SIZE].copy_from_slice(header.as_bytes());

        for (i, pointer) in bat.iter().enumerate() {
            let offset = BLOCK_SIZE + i * 4;
            (&mut file[offset..offset + 4])
                .write_i32::<LittleEndian>(*pointer)
                .unwrap();
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let chain = &chains[index];
            let mut entry = repr::entry::Entry::new_zeroed();
            let name: Vec<u16> = node.name.encode_utf16().collect();
            assert!(name.len() < repr::entry::NAME_UNITS);
            for (slot, unit) in entry.name.iter_mut().zip(name.iter()) {
                *slot = U16::new(*unit);
            }
            entry.name_size = U16::new(((name.len() + 1) * 2) as u16);
            entry.kind = node.kind;
            entry.previous = I32::new(node.previous);
            entry.next = I32::new(node.next);
            entry.child = I32::new(node.child);
            entry.start_block = I32::new(chain.first().copied().unwrap_or(END_OF_CHAIN));
            entry.size = I32::new(node.data.len() as i32);

            let block = dir_chain[index / repr::entry::PER_BLOCK];
            let offset = block_start(block) + (index % repr::entry::PER_BLOCK) * repr::entry::SIZE;
            file[offset..offset + repr::entry::SIZE].copy_from_slice(entry.as_bytes());

            for (chunk, &block) in node.data.chunks(BLOCK_SIZE).zip(chain.iter()) {
                let offset = block_start(block);
                file[offset..offset + chunk.len()].copy_from_slice(chunk);
            }
        }
        file
    }
}

fn block_start(block: i32) -> usize {
    (block as usize + 1) * BLOCK_SIZE
}

fn div_ceil(n: usize, d: usize) -> usize {
    (n + d - 1) / d
}

/// The root of a balanced tree over the indexes `start..end`
fn balanced(start: i32, end: i32) -> i32 {
    if start >= end {
        -1
    } else {
        start + (end - start) / 2
    }
}

fn link_balanced(nodes: &mut [Node], start: i32, end: i32) {
    let mid = balanced(start, end);
    if mid < 0 {
        return;
    }
    nodes[mid as usize].previous = balanced(start, mid);
    nodes[mid as usize].next = balanced(mid + 1, end);
    link_balanced(nodes, start, mid);
    link_balanced(nodes, mid + 1, end);
}

/// Bytes of a stream, distinct enough to notice misplaced blocks
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Encode a piece table, `pieces[i]` being the first character of piece `i` and its position
pub fn piece_table(prefix: &[u8], pieces: &[(u32, EncodedPosition)]) -> Vec<u8> {
    let mut table = prefix.to_vec();
    table.push(PIECE_TABLE_TAG);
    table
        .write_u32::<LittleEndian>((pieces.len() * RECORD_SIZE + CHAR_POSITION_SIZE) as u32)
        .unwrap();
    for (start, _) in pieces {
        table.write_u32::<LittleEndian>(*start).unwrap();
    }
    table.write_u32::<LittleEndian>(0).unwrap();
    for (_, position) in pieces {
        table.write_u16::<LittleEndian>(0).unwrap();
        table.write_u32::<LittleEndian>(position.0).unwrap();
        table.write_u16::<LittleEndian>(0).unwrap();
    }
    table
}

/// The offset of the text within generated `WordDocument` streams
pub const TEXT_OFFSET: u32 = 1024;

/// A `WordDocument` stream: a FIB followed by `text` at `TEXT_OFFSET`
pub fn word_document(flags: u16, fc_min: i32, fc_max: i32, fc_clx: i32, text: &[u8]) -> Vec<u8> {
    let mut stream = vec![0u8; TEXT_OFFSET as usize];
    let mut put = |offset: u64, value: i32| {
        let offset = offset as usize;
        stream[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    };
    put(fib::OFFSET_FC_MIN, fc_min);
    put(fib::OFFSET_FC_MAX, fc_max);
    put(fib::OFFSET_CCP_TEXT, fc_max.wrapping_sub(fc_min));
    put(fib::OFFSET_FC_CLX, fc_clx);
    put(fib::OFFSET_LCB_CLX, 0);
    let offset = fib::OFFSET_FLAGS as usize;
    stream[offset..offset + 2].copy_from_slice(&flags.to_le_bytes());
    stream.extend_from_slice(text);
    stream
}

/// A single piece, single byte document holding `text`
pub fn simple_document(text: &str, flags: u16) -> CompoundFile {
    let table_name = fib::Flags::from_bits_truncate(flags).table_stream();
    let main = word_document(flags, 0, text.len() as i32, 0, text.as_bytes());
    let table = piece_table(&[], &[(0, EncodedPosition::single_byte(TEXT_OFFSET))]);
    CompoundFile::with_streams(vec![(fib::MAIN_STREAM, main), (table_name, table)])
}
