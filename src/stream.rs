use crate::errors::*;
use crate::fs::BlockFileSystem;
use positioned_io::ReadAt;
use repr::BLOCK_SIZE;
use std::convert::TryFrom;
use std::io;
use std::io::SeekFrom;

/// A seekable stream of the bytes stored in a block chain
///
/// The BAT only links blocks forward: seeking backwards restarts from the first block of
/// the chain. The stream ends with the last block of the chain, or with the end of the
/// file, whichever comes first.
#[derive(Debug)]
pub struct BlockStream<R> {
    fs: BlockFileSystem<R>,
    start: i32,

    /// The current logical position
    position: u64,
    /// The current block, negative at the end of the chain
    block: i32,
    /// The index of `block` in the chain
    block_index: u64,
    /// The number of bytes consumed in the current block
    block_offset: usize,

    buf: Box<[u8; BLOCK_SIZE]>,
    /// The block held in `buf`, and how many of its bytes the file holds
    buffered: Option<(i32, usize)>,
}

impl<R: ReadAt> BlockStream<R> {
    pub(crate) fn new(fs: BlockFileSystem<R>, start: i32) -> Self {
        Self {
            fs,
            start,
            position: 0,
            block: start,
            block_index: 0,
            block_offset: 0,
            buf: Box::new([0; BLOCK_SIZE]),
            buffered: None,
        }
    }

    pub fn start_block(&self) -> i32 {
        self.start
    }

    /// The logical position of the next byte
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The position of the next byte in the underlying file, `None` at the end of the chain
    pub fn raw_position(&self) -> Option<u64> {
        repr::block_offset(self.block).map(|offset| offset + self.block_offset as u64)
    }

    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        if !self.ensure_block()? {
            return Ok(None);
        }
        let byte = self.buf[self.block_offset];
        self.block_offset += 1;
        self.position += 1;
        Ok(Some(byte))
    }

    /// Read up to the end of the current block
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || !self.ensure_block()? {
            return Ok(0);
        }
        let available = self.available();
        let len = buf.len().min(available - self.block_offset);
        buf[..len].copy_from_slice(&self.buf[self.block_offset..self.block_offset + len]);
        self.block_offset += len;
        self.position += len as u64;
        Ok(len)
    }

    /// Move to an absolute logical position
    ///
    /// Seeking past the end of the chain is not an error: subsequent reads return EOF.
    pub fn seek_to(&mut self, position: u64) -> Result<()> {
        if position == self.position {
            return Ok(());
        }
        let dest_index = position / BLOCK_SIZE as u64;
        let hops = if dest_index >= self.block_index {
            dest_index - self.block_index
        } else {
            self.block = self.start;
            self.block_index = 0;
            dest_index
        };
        let first_index = dest_index - hops;
        for hop in 0..hops {
            if self.block < 0 {
                break;
            }
            if first_index + hop + 1 >= self.fs.max_chain_len() {
                return Err(ErrorInner::CyclicChain { start: self.start }.into());
            }
            self.block = self.fs.next_block(self.block)?;
        }
        self.block_index = dest_index;
        self.block_offset = (position % BLOCK_SIZE as u64) as usize;
        self.position = position;
        Ok(())
    }

    /// Make sure the byte at `block_offset` of the current block is buffered
    ///
    /// Returns false at the end of the stream.
    fn ensure_block(&mut self) -> Result<bool> {
        if self.block < 0 {
            return Ok(false);
        }
        if self.block_offset >= BLOCK_SIZE {
            if self.block_index + 1 >= self.fs.max_chain_len() {
                return Err(ErrorInner::CyclicChain { start: self.start }.into());
            }
            self.block = self.fs.next_block(self.block)?;
            self.block_index += 1;
            self.block_offset = 0;
            if self.block < 0 {
                return Ok(false);
            }
        }
        if self.buffered.map(|(block, _)| block) != Some(self.block) {
            let len = self.fs.read_block(self.block, &mut self.buf[..])?;
            self.buffered = Some((self.block, len));
        }
        Ok(self.block_offset < self.available())
    }

    fn available(&self) -> usize {
        self.buffered.map_or(0, |(_, len)| len)
    }
}

impl<R: ReadAt> io::Read for BlockStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bytes(buf).map_err(Into::into)
    }
}

impl<R: ReadAt> io::Seek for BlockStream<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = match pos {
            SeekFrom::Start(position) => Some(position),
            SeekFrom::Current(delta) => i64::try_from(self.position)
                .ok()
                .and_then(|position| position.checked_add(delta))
                .and_then(|position| u64::try_from(position).ok()),
            SeekFrom::End(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "block streams have no known end",
                ))
            }
        };
        let position = position.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;
        self.seek_to(position)?;
        Ok(position)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}
