use crate::errors::*;
use repr::header::{Header, HEADER_BAT_LIMIT, MAGIC};
use slog::Logger;
use std::io;
use zerocopy::FromBytes;

/// The parsed first block of a compound file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    raw: Header,
}

impl HeaderBlock {
    /// Parse the header from (at least) the first 512 bytes of the file
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw = bytes
            .get(..repr::BLOCK_SIZE)
            .and_then(|bytes| Header::read_from(bytes))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("header needs {} bytes, got {}", repr::BLOCK_SIZE, bytes.len()),
                )
            })?;
        Ok(Self { raw })
    }

    pub fn raw(&self) -> &Header {
        &self.raw
    }

    pub fn magic(&self) -> [u8; 8] {
        self.raw.magic
    }

    pub fn has_valid_magic(&self) -> bool {
        self.raw.magic == MAGIC
    }

    pub fn bat_count(&self) -> i32 {
        self.raw.bat_count.get()
    }

    /// The first block of the directory entry chain
    pub fn entries_start(&self) -> i32 {
        self.raw.entries_start.get()
    }

    pub fn small_bat_start(&self) -> i32 {
        self.raw.small_bat_start.get()
    }

    pub fn small_bat_count(&self) -> i32 {
        self.raw.small_bat_count.get()
    }

    pub fn xbat_start(&self) -> i32 {
        self.raw.xbat_start.get()
    }

    pub fn xbat_count(&self) -> i32 {
        self.raw.xbat_count.get()
    }

    /// The block number of the `index`th BAT block, if it is stored in the header
    pub fn bat_block(&self, index: usize) -> Option<i32> {
        if index < HEADER_BAT_LIMIT {
            Some(self.raw.bat_blocks[index].get())
        } else {
            None
        }
    }

    pub(crate) fn log(&self, logger: &Logger) {
        let raw = &self.raw;
        slog::debug!(logger, "Read header";
            "magic" => ?raw.magic,
            "minor_version" => raw.minor_version.get(),
            "major_version" => raw.major_version.get(),
            "byte_order" => raw.byte_order.get(),
            "block_shift" => raw.block_shift.get(),
            "small_block_shift" => raw.small_block_shift.get(),
            "directory_block_count" => raw.directory_block_count.get(),
            "bat_count" => self.bat_count(),
            "entries_start" => self.entries_start(),
            "small_stream_cutoff" => raw.small_stream_cutoff.get(),
            "small_bat_start" => self.small_bat_start(),
            "small_bat_count" => self.small_bat_count(),
            "xbat_start" => self.xbat_start(),
            "xbat_count" => self.xbat_count()
        )
    }
}
