//! Text extraction from Word 97-2003 documents
//!
//! ```no_run
//! # fn main() -> olefs::Result<()> {
//! let mut text = olefs::doc::text("report.doc")?;
//! println!("{}", text.read_to_string()?);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::entry::{self, Entry};
use crate::errors::*;
use crate::fs::{default_logger, BlockFileSystem};
use crate::piece::PieceTable;
use crate::reader::PieceReader;
use crate::stream::BlockStream;
use byteorder::{LittleEndian, ReadBytesExt};
use positioned_io::{RandomAccessFile, ReadAt};
use repr::fib::{self, Flags};
use slog::Logger;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// A reader of a document's text
pub type DocumentText<R> = PieceReader<BlockStream<R>, BlockStream<R>>;

/// The fields of the File Information Block needed to find the text
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FileInformation {
    pub flags: Flags,
    pub fc_min: i32,
    pub fc_max: i32,
    pub ccp_text: i32,
    pub fc_clx: i32,
    pub lcb_clx: i32,
}

impl FileInformation {
    /// Read the FIB from the start of the main stream
    pub fn read<S: Read + Seek>(main: &mut S) -> Result<Self> {
        let flags = Flags::from_bits_truncate(read_at(main, fib::OFFSET_FLAGS, |s| {
            s.read_u16::<LittleEndian>()
        })?);
        let fc_min = read_at(main, fib::OFFSET_FC_MIN, |s| s.read_i32::<LittleEndian>())?;
        let fc_max = read_at(main, fib::OFFSET_FC_MAX, |s| s.read_i32::<LittleEndian>())?;
        let ccp_text = read_at(main, fib::OFFSET_CCP_TEXT, |s| s.read_i32::<LittleEndian>())?;
        let fc_clx = read_at(main, fib::OFFSET_FC_CLX, |s| s.read_i32::<LittleEndian>())?;
        let lcb_clx = read_at(main, fib::OFFSET_LCB_CLX, |s| s.read_i32::<LittleEndian>())?;
        Ok(Self {
            flags,
            fc_min,
            fc_max,
            ccp_text,
            fc_clx,
            lcb_clx,
        })
    }

    /// The name of the stream holding the piece table
    pub fn table_stream(&self) -> &'static str {
        self.flags.table_stream()
    }

    /// The number of characters of text, `fc_max - fc_min`
    pub fn char_count(&self) -> Result<u32> {
        let count = i64::from(self.fc_max) - i64::from(self.fc_min);
        if count < 0 || count > i64::from(u32::MAX) {
            return Err(ErrorInner::InvalidFib {
                err: format!("text ends at {} before it starts at {}", self.fc_max, self.fc_min),
            }
            .into());
        }
        Ok(count as u32)
    }

    /// The offset of the piece table in the table stream
    pub fn piece_table_offset(&self) -> Result<u64> {
        if self.fc_clx < 0 {
            return Err(ErrorInner::InvalidFib {
                err: format!("negative piece table offset {}", self.fc_clx),
            }
            .into());
        }
        Ok(self.fc_clx as u64)
    }
}

fn read_at<S, T, F>(stream: &mut S, offset: u64, f: F) -> Result<T>
where
    S: Read + Seek,
    F: FnOnce(&mut S) -> std::io::Result<T>,
{
    stream.seek(SeekFrom::Start(offset))?;
    Ok(f(stream)?)
}

/// Open the text of the document at `path`
pub fn text<P: AsRef<Path>>(path: P) -> Result<DocumentText<RandomAccessFile>> {
    text_with_logger(path, default_logger())
}

pub fn text_with_logger<P: AsRef<Path>>(
    path: P,
    logger: Logger,
) -> Result<DocumentText<RandomAccessFile>> {
    text_with_config(path, Config::default(), logger)
}

pub fn text_with_config<P: AsRef<Path>>(
    path: P,
    config: Config,
    logger: Logger,
) -> Result<DocumentText<RandomAccessFile>> {
    let piece_cache_size = config.get_piece_cache_size();
    let fs = BlockFileSystem::open_with_config(path, config, logger)?;
    text_from_fs(&fs, piece_cache_size)
}

/// Open the text of the document read by `reader`
pub fn text_from_reader<R: ReadAt>(reader: R) -> Result<DocumentText<R>> {
    let fs = BlockFileSystem::new(reader)?;
    text_from_fs(&fs, fs.config().get_piece_cache_size())
}

/// Open the text of the document stored in `fs`
///
/// `piece_cache_size` piece records are read from the table stream at a time.
pub fn text_from_fs<R: ReadAt>(
    fs: &BlockFileSystem<R>,
    piece_cache_size: usize,
) -> Result<DocumentText<R>> {
    let logger = fs.logger();
    let entries = fs.root()?.list()?;

    let main_entry = find_stream(&entries, fib::MAIN_STREAM)?;
    slog::trace!(logger, "Main stream"; "entry" => %main_entry);
    let mut main = main_entry.open();
    let info = FileInformation::read(&mut main)?;
    slog::debug!(logger, "Read file information block";
        "flags" => ?info.flags,
        "fc_min" => info.fc_min,
        "fc_max" => info.fc_max,
        "ccp_text" => info.ccp_text,
        "fc_clx" => info.fc_clx,
        "lcb_clx" => info.lcb_clx);
    if info.flags.contains(Flags::ENCRYPTED) {
        slog::warn!(logger, "Document is encrypted, its text will be unreadable");
    }

    let max_char_pos = info.char_count()?;
    let table_name = info.table_stream();
    let table_entry = find_stream(&entries, table_name)?;
    slog::trace!(logger, "Table stream"; "entry" => %table_entry);

    let table = PieceTable::new(
        table_entry.open(),
        info.piece_table_offset()?,
        max_char_pos,
        piece_cache_size,
        logger.new(slog::o!("stream" => table_name)),
    )?;
    Ok(PieceReader::new(table, main))
}

fn find_stream<'a, R>(entries: &'a [Entry<R>], name: &'static str) -> Result<&'a Entry<R>> {
    entry::find(entries, name).ok_or_else(|| ErrorInner::MissingStream { name }.into())
}
