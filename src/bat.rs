//! Block Allocation Table navigation
//!
//! The BAT is an array of `i32` with one element per block: the number of the block which
//! follows it in its chain. The BAT is itself stored in blocks, 128 pointers per block.
//! The block numbers of the first 109 BAT blocks are embedded in the header; the rest are
//! listed in XBAT blocks, which are stored contiguously from the header's `xbat_start`.

use crate::cache::{CacheStats, LruCache};
use crate::errors::*;
use crate::header::HeaderBlock;
use byteorder::{ByteOrder, LittleEndian};
use parking_lot::Mutex;
use positioned_io::ReadAt;
use repr::header::HEADER_BAT_LIMIT;
use repr::POINTERS_PER_BLOCK;

type Pointers = Box<[i32; POINTERS_PER_BLOCK]>;

#[derive(Debug)]
pub struct BatNavigator {
    header: HeaderBlock,
    cache: Mutex<LruCache<i32, Pointers>>,
}

impl BatNavigator {
    /// Create a navigator caching up to `cache_size` BAT and XBAT blocks
    pub fn new(header: HeaderBlock, cache_size: usize) -> Self {
        Self {
            header,
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    pub fn header(&self) -> &HeaderBlock {
        &self.header
    }

    /// Return the block following `block` in its chain
    ///
    /// Negative block numbers (end of chain) are returned unchanged.
    pub fn next_block<R: ReadAt + ?Sized>(&self, reader: &R, block: i32) -> Result<i32> {
        if block < 0 {
            return Ok(block);
        }
        let block = block as usize;
        let bat_index = block / POINTERS_PER_BLOCK;
        let slot = block % POINTERS_PER_BLOCK;

        let bat_block = self.bat_block_number(reader, bat_index)?;
        self.pointer(reader, bat_block, slot)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Find the block number of the `bat_index`th BAT block
    fn bat_block_number<R: ReadAt + ?Sized>(&self, reader: &R, bat_index: usize) -> Result<i32> {
        let block = match self.header.bat_block(bat_index) {
            Some(block) => block,
            None => {
                let xbat_index = bat_index - HEADER_BAT_LIMIT;
                let xbat_block = i64::from(self.header.xbat_start())
                    + (xbat_index / POINTERS_PER_BLOCK) as i64;
                if self.header.xbat_start() < 0 || xbat_block > i64::from(i32::MAX) {
                    return Err(ErrorInner::BadBatPointer {
                        bat_index,
                        block: self.header.xbat_start(),
                    }
                    .into());
                }
                self.pointer(reader, xbat_block as i32, xbat_index % POINTERS_PER_BLOCK)?
            }
        };
        if block < 0 {
            return Err(ErrorInner::BadBatPointer { bat_index, block }.into());
        }
        Ok(block)
    }

    /// Read the `slot`th pointer of a BAT or XBAT block, through the cache
    fn pointer<R: ReadAt + ?Sized>(&self, reader: &R, block: i32, slot: usize) -> Result<i32> {
        let mut cache = self.cache.lock();
        if let Some(pointers) = cache.get(&block) {
            return Ok(pointers[slot]);
        }

        let pointers = read_pointers(reader, block)?;
        let result = pointers[slot];
        cache.insert(block, pointers);
        Ok(result)
    }
}

fn read_pointers<R: ReadAt + ?Sized>(reader: &R, block: i32) -> Result<Pointers> {
    let offset = match repr::block_offset(block) {
        Some(offset) => offset,
        None => {
            return Err(ErrorInner::BadBatPointer {
                bat_index: 0,
                block,
            }
            .into())
        }
    };
    let mut buf = [0; repr::BLOCK_SIZE];
    reader.read_exact_at(offset, &mut buf)?;

    let mut pointers = Box::new([0; POINTERS_PER_BLOCK]);
    LittleEndian::read_i32_into(&buf, &mut pointers[..]);
    Ok(pointers)
}
