use crate::bat::BatNavigator;
use crate::cache::CacheStats;
use crate::config::{Config, MagicPolicy};
use crate::entry::Entry;
use crate::errors::*;
use crate::header::HeaderBlock;
use crate::stream::BlockStream;
use positioned_io::{RandomAccessFile, ReadAt};
use repr::POINTERS_PER_BLOCK;
use slog::{Drain, Logger};
use std::io;
use std::path::Path;
use std::sync::Arc;

/// A read-only view of a compound file as a set of block chains
///
/// The handle is cheap to clone: clones share the underlying reader and BAT cache.
#[derive(Debug)]
pub struct BlockFileSystem<R> {
    inner: Arc<Inner<R>>,
}

#[derive(Debug)]
struct Inner<R> {
    reader: R,
    bat: BatNavigator,
    config: Config,
    logger: Logger,
}

impl<R> Clone for BlockFileSystem<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(crate) fn default_logger() -> Logger {
    slog::Logger::root(slog_stdlog::StdLog.fuse(), slog::o!())
}

impl BlockFileSystem<RandomAccessFile> {
    pub fn open<P: AsRef<Path>>(p: P) -> Result<Self> {
        Self::open_with_logger(p, default_logger())
    }

    pub fn open_with_logger<P: AsRef<Path>>(p: P, logger: Logger) -> Result<Self> {
        Self::open_with_config(p, Config::default(), logger)
    }

    pub fn open_with_config<P: AsRef<Path>>(p: P, config: Config, logger: Logger) -> Result<Self> {
        Self::_open_with_config(p.as_ref(), config, logger)
    }

    fn _open_with_config(path: &Path, config: Config, logger: Logger) -> Result<Self> {
        let path_str = path.display().to_string();
        let logger = logger.new(slog::o!("file" => path_str));
        let file = RandomAccessFile::open(path).map_err(|source| ErrorInner::UnableToOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_config(file, config, logger)
    }
}

impl<R: ReadAt> BlockFileSystem<R> {
    pub fn new(reader: R) -> Result<Self> {
        Self::with_logger(reader, default_logger())
    }

    pub fn with_logger(reader: R, logger: Logger) -> Result<Self> {
        Self::with_config(reader, Config::default(), logger)
    }

    pub fn with_config(reader: R, config: Config, logger: Logger) -> Result<Self> {
        let mut buf = [0; repr::BLOCK_SIZE];
        reader.read_exact_at(0, &mut buf)?;
        let header = HeaderBlock::parse(&buf)?;
        header.log(&logger);

        if !header.has_valid_magic() {
            match config.get_magic_policy() {
                MagicPolicy::Warn => {
                    slog::warn!(logger, "Unrecognized file signature, reading anyway";
                        "magic" => ?header.magic())
                }
                MagicPolicy::Reject => {
                    return Err(ErrorInner::BadMagic {
                        magic: header.magic(),
                    }
                    .into())
                }
            }
        }

        let bat = BatNavigator::new(header, config.get_bat_cache_size());
        Ok(Self {
            inner: Arc::new(Inner {
                reader,
                bat,
                config,
                logger,
            }),
        })
    }

    pub fn header(&self) -> &HeaderBlock {
        self.inner.bat.header()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn logger(&self) -> &Logger {
        &self.inner.logger
    }

    pub fn reader(&self) -> &R {
        &self.inner.reader
    }

    /// The root directory entry, which is always entry 0
    pub fn root(&self) -> Result<Entry<R>> {
        let start = self.header().entries_start();
        match self.entry(0)? {
            Some(root) => Ok(root),
            None => Err(ErrorInner::MissingRoot { start }.into()),
        }
    }

    /// Read the directory entry with the given index
    ///
    /// Returns `None` for negative indexes, and for indexes past the end of the directory
    /// chain. The number of entries is not recorded anywhere, so running off the end of
    /// the chain is the only way to find out an index is out of range.
    pub fn entry(&self, index: i32) -> Result<Option<Entry<R>>> {
        if index < 0 {
            return Ok(None);
        }
        let per_block = repr::entry::PER_BLOCK as i32;
        let start = self.header().entries_start();
        let mut block = start;
        for hop in 0..index / per_block {
            if block < 0 {
                break;
            }
            if hop as u64 + 1 >= self.max_chain_len() {
                return Err(ErrorInner::CyclicChain { start }.into());
            }
            block = self.next_block(block)?;
        }
        let offset = match repr::block_offset(block) {
            Some(offset) => offset + ((index % per_block) as usize * repr::entry::SIZE) as u64,
            None => return Ok(None),
        };

        let mut buf = [0; repr::entry::SIZE];
        self.inner.reader.read_exact_at(offset, &mut buf)?;
        Entry::parse(self.clone(), index, &buf).map(Some)
    }

    /// Return the block following `block` in its chain, or a negative number at the end
    pub fn next_block(&self, block: i32) -> Result<i32> {
        self.inner.bat.next_block(&self.inner.reader, block)
    }

    /// Iterate over the block numbers of the chain starting at `start`
    ///
    /// A chain holding more blocks than the BAT can describe yields a `CyclicChain` error.
    pub fn chain(&self, start: i32) -> Chain<'_, R> {
        Chain {
            fs: self,
            start,
            next: start,
            len: 0,
        }
    }

    /// The most blocks a chain can hold: one per BAT slot the header can reach
    pub(crate) fn max_chain_len(&self) -> u64 {
        let header = self.header();
        let reachable = repr::header::HEADER_BAT_LIMIT as u64
            + header.xbat_count().max(0) as u64 * POINTERS_PER_BLOCK as u64;
        let bat_blocks = reachable.max(header.bat_count().max(0) as u64);
        bat_blocks * POINTERS_PER_BLOCK as u64
    }

    /// Open a stream over the chain starting at `start`
    pub fn open_stream(&self, start: i32) -> BlockStream<R> {
        BlockStream::new(self.clone(), start)
    }

    pub fn bat_cache_stats(&self) -> CacheStats {
        self.inner.bat.cache_stats()
    }

    /// Read as much of `block` into `buf` as the file holds
    pub(crate) fn read_block(&self, block: i32, buf: &mut [u8]) -> io::Result<usize> {
        let offset = match repr::block_offset(block) {
            Some(offset) => offset,
            None => return Ok(0),
        };
        let mut filled = 0;
        while filled < buf.len() {
            match self
                .inner
                .reader
                .read_at(offset + filled as u64, &mut buf[filled..])
            {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

/// Iterator over the blocks of a chain, see [`BlockFileSystem::chain`](struct.BlockFileSystem.html#method.chain)
#[derive(Debug)]
pub struct Chain<'a, R> {
    fs: &'a BlockFileSystem<R>,
    start: i32,
    next: i32,
    /// Blocks yielded so far
    len: u64,
}

impl<R: ReadAt> Iterator for Chain<'_, R> {
    type Item = Result<i32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next < 0 {
            return None;
        }
        if self.len >= self.fs.max_chain_len() {
            self.next = repr::sentinel::END_OF_CHAIN;
            return Some(Err(ErrorInner::CyclicChain { start: self.start }.into()));
        }
        self.len += 1;
        let current = self.next;
        match self.fs.next_block(current) {
            Ok(next) => {
                self.next = next;
                Some(Ok(current))
            }
            Err(e) => {
                self.next = repr::sentinel::END_OF_CHAIN;
                Some(Err(e))
            }
        }
    }
}
