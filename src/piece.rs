//! Piece table decoding
//!
//! A fast-saved document's text is not stored in order: the piece table maps ranges of
//! logical character positions to the byte ranges of the `WordDocument` stream holding
//! them, each range in one of two encodings. See [`repr::clx`] for the on-disk layout.

use crate::errors::*;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use repr::clx::{
    Descriptor, EncodedPosition, CHAR_POSITION_SIZE, DESCRIPTOR_SIZE, PIECE_TABLE_TAG,
    PROPERTY_TAG, RECORD_SIZE,
};
use slog::Logger;
use std::io;
use std::io::{Read, Seek, SeekFrom};
use zerocopy::FromBytes;

/// A contiguous run of the document's text
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    file_position: u32,
    start: u32,
    end: u32,
    two_byte: bool,
}

impl Piece {
    pub fn new(file_position: u32, start: u32, end: u32, two_byte: bool) -> Self {
        Self {
            file_position,
            start,
            end,
            two_byte,
        }
    }

    /// The byte offset of the first character in the `WordDocument` stream
    pub fn file_position(&self) -> u32 {
        self.file_position
    }

    /// The character position of the first character
    pub fn start(&self) -> u32 {
        self.start
    }

    /// The character position just past the last character
    pub fn end(&self) -> u32 {
        self.end
    }

    /// True for UTF-16LE text, false for Cp1252
    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    pub fn contains(&self, char_pos: u32) -> bool {
        self.start <= char_pos && char_pos < self.end
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The byte offset of the character at `char_pos`, which must be in this piece
    pub fn byte_offset(&self, char_pos: u32) -> u64 {
        debug_assert!(self.contains(char_pos));
        let chars = u64::from(char_pos - self.start);
        let width = if self.two_byte { 2 } else { 1 };
        u64::from(self.file_position) + chars * width
    }
}

/// A forward cursor over the pieces of a piece table
#[derive(Debug)]
pub struct PieceTable<S> {
    stream: S,
    count: usize,
    max_char_pos: u32,
    char_positions_start: u64,
    descriptors_start: u64,

    /// The index of the piece `next` will return
    current: usize,
    /// The piece most recently returned by `next`
    current_piece: Option<Piece>,

    /// Records `window_start..window_start + window.len()`: the end character position,
    /// and the encoded position of each
    window: Vec<(u32, EncodedPosition)>,
    window_start: usize,
    window_size: usize,

    logger: Logger,
}

impl<S: Read + Seek> PieceTable<S> {
    /// Read the piece table which starts at `offset` of `stream`
    ///
    /// `max_char_pos` is the number of characters of the document, and `cached_records` the
    /// number of piece records to read from `stream` at a time.
    pub fn new(
        mut stream: S,
        offset: u64,
        max_char_pos: u32,
        cached_records: usize,
        logger: Logger,
    ) -> Result<Self> {
        stream.seek(SeekFrom::Start(offset))?;
        skip_properties(&mut stream)?;

        let size = stream.read_u32::<LittleEndian>()?;
        if size < CHAR_POSITION_SIZE as u32 {
            return Err(ErrorInner::InvalidPieceTable {
                err: format!("size {} is too small", size),
            }
            .into());
        }
        let count = (size as usize - CHAR_POSITION_SIZE) / RECORD_SIZE;
        let char_positions_start = stream.stream_position()?;
        let descriptors_start =
            char_positions_start + ((count + 1) * CHAR_POSITION_SIZE) as u64;
        let window_size = cached_records.max(1).min(count.max(1));

        slog::debug!(logger, "Read piece table";
            "offset" => offset,
            "size" => size,
            "count" => count,
            "max_char_pos" => max_char_pos);

        Ok(Self {
            stream,
            count,
            max_char_pos,
            char_positions_start,
            descriptors_start,
            current: 0,
            current_piece: None,
            window: Vec::with_capacity(window_size),
            window_start: 0,
            window_size,
            logger,
        })
    }

    /// The number of pieces in the table
    pub fn count(&self) -> usize {
        self.count
    }

    /// The total number of characters in the document
    pub fn max_char_pos(&self) -> u32 {
        self.max_char_pos
    }

    /// Move the cursor back before the first piece
    pub fn reset(&mut self) {
        self.current = 0;
        self.current_piece = None;
    }

    /// Return the next piece, or `None` after the last
    pub fn next(&mut self) -> Result<Option<Piece>> {
        if self.current >= self.count {
            self.current_piece = None;
            return Ok(None);
        }

        let (end, position) = self.record(self.current)?;
        let end = if self.current == self.count - 1 {
            self.max_char_pos
        } else {
            end
        };
        let start = self.current_piece.map_or(0, |piece| piece.end);
        let piece = Piece::new(position.offset(), start, end, position.is_two_byte());
        slog::trace!(self.logger, "Decoded piece";
            "index" => self.current,
            "encoded" => format!("{:032b}", position.0),
            "piece" => ?piece);

        self.current += 1;
        self.current_piece = Some(piece);
        Ok(Some(piece))
    }

    /// Return the piece containing `char_pos`
    ///
    /// Returns `None` if `char_pos` is not less than `max_char_pos`, or no piece contains it.
    pub fn piece_for(&mut self, char_pos: u32) -> Result<Option<Piece>> {
        if char_pos >= self.max_char_pos {
            return Ok(None);
        }
        let current = self.current_piece;
        match current {
            Some(piece) if piece.contains(char_pos) => return Ok(Some(piece)),
            Some(piece) if char_pos >= piece.end => {}
            _ => self.reset(),
        }
        while let Some(piece) = self.next()? {
            if piece.contains(char_pos) {
                return Ok(Some(piece));
            }
        }
        Ok(None)
    }

    /// Every piece of the table, in order. Leaves the cursor before the first piece
    pub fn pieces(&mut self) -> Result<Vec<Piece>> {
        self.reset();
        let mut pieces = Vec::new();
        while let Some(piece) = self.next()? {
            pieces.push(piece);
        }
        self.reset();
        Ok(pieces)
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// The end character position and encoded position of record `index`
    fn record(&mut self, index: usize) -> Result<(u32, EncodedPosition)> {
        let window_end = self.window_start + self.window.len();
        if index < self.window_start || index >= window_end {
            self.load_window(index)?;
        }
        Ok(self.window[index - self.window_start])
    }

    fn load_window(&mut self, index: usize) -> Result<()> {
        let len = self.window_size.min(self.count - index);

        // Piece `i` ends where piece `i + 1` starts
        let mut char_positions = vec![0; len * CHAR_POSITION_SIZE];
        let pos = self.char_positions_start + ((index + 1) * CHAR_POSITION_SIZE) as u64;
        self.stream.seek(SeekFrom::Start(pos))?;
        self.stream.read_exact(&mut char_positions)?;

        let mut descriptors = vec![0; len * DESCRIPTOR_SIZE];
        let pos = self.descriptors_start + (index * DESCRIPTOR_SIZE) as u64;
        self.stream.seek(SeekFrom::Start(pos))?;
        self.stream.read_exact(&mut descriptors)?;

        self.window.clear();
        self.window_start = index;
        for (char_position, descriptor) in char_positions
            .chunks_exact(CHAR_POSITION_SIZE)
            .zip(descriptors.chunks_exact(DESCRIPTOR_SIZE))
        {
            let descriptor = Descriptor::read_from(descriptor).ok_or_else(|| {
                ErrorInner::InvalidPieceTable {
                    err: "truncated piece descriptor".to_string(),
                }
            })?;
            self.window.push((
                LittleEndian::read_u32(char_position),
                EncodedPosition(descriptor.file_position.get()),
            ));
        }
        Ok(())
    }
}

/// Skip the property records which may precede a piece table, and its tag
fn skip_properties<S: Read>(stream: &mut S) -> Result<()> {
    let mut tag = stream.read_u8()?;
    while tag == PROPERTY_TAG {
        let size = u64::from(stream.read_u16::<LittleEndian>()?);
        let skipped = io::copy(&mut stream.by_ref().take(size), &mut io::sink())?;
        if skipped != size {
            return Err(Error::from(io::Error::from(io::ErrorKind::UnexpectedEof)));
        }
        tag = stream.read_u8()?;
    }
    if tag != PIECE_TABLE_TAG {
        return Err(ErrorInner::InvalidPieceTableTag { tag }.into());
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    pub(crate) fn discard() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    /// Encode a piece table: `starts[i]` is the first character of piece `i`
    pub(crate) fn encode_table(prefix: &[u8], starts: &[u32], positions: &[EncodedPosition]) -> Vec<u8> {
        assert_eq!(starts.len(), positions.len());
        let count = starts.len();
        let mut table = prefix.to_vec();
        table.push(PIECE_TABLE_TAG);
        table
            .write_u32::<LittleEndian>((count * RECORD_SIZE + CHAR_POSITION_SIZE) as u32)
            .unwrap();
        for &start in starts {
            table.write_u32::<LittleEndian>(start).unwrap();
        }
        // The final boundary, ignored in favor of max_char_pos
        table.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap();
        for position in positions {
            table.write_u16::<LittleEndian>(0).unwrap();
            table.write_u32::<LittleEndian>(position.0).unwrap();
            table.write_u16::<LittleEndian>(0).unwrap();
        }
        table
    }

    fn three_pieces() -> Vec<u8> {
        encode_table(
            &[],
            &[0, 10, 25],
            &[
                EncodedPosition::single_byte(1000),
                EncodedPosition::two_byte(2000),
                EncodedPosition::single_byte(40),
            ],
        )
    }

    fn open(table: Vec<u8>, max: u32, cached: usize) -> PieceTable<Cursor<Vec<u8>>> {
        PieceTable::new(Cursor::new(table), 0, max, cached, discard()).unwrap()
    }

    #[test]
    fn sequential() {
        let mut table = open(three_pieces(), 30, 20);
        assert_eq!(table.count(), 3);
        assert_eq!(table.next().unwrap(), Some(Piece::new(1000, 0, 10, false)));
        assert_eq!(table.next().unwrap(), Some(Piece::new(2000, 10, 25, true)));
        assert_eq!(table.next().unwrap(), Some(Piece::new(40, 25, 30, false)));
        assert_eq!(table.next().unwrap(), None);
    }

    #[test]
    fn pieces_partition_positions() {
        for cached in 1..=4 {
            let mut table = open(three_pieces(), 30, cached);
            let pieces = table.pieces().unwrap();
            assert_eq!(pieces.first().unwrap().start(), 0);
            assert_eq!(pieces.last().unwrap().end(), 30);
            for pair in pieces.windows(2) {
                assert_eq!(pair[0].end(), pair[1].start());
            }
            for char_pos in 0..30 {
                let owners = pieces.iter().filter(|p| p.contains(char_pos)).count();
                assert_eq!(owners, 1, "position {}", char_pos);
            }
        }
    }

    #[test]
    fn piece_for() {
        let mut table = open(three_pieces(), 30, 2);
        assert_eq!(table.piece_for(12).unwrap().unwrap().start(), 10);
        assert_eq!(table.piece_for(24).unwrap().unwrap().start(), 10);
        assert_eq!(table.piece_for(29).unwrap().unwrap().start(), 25);
        assert_eq!(table.piece_for(0).unwrap().unwrap().start(), 0);
        assert_eq!(table.piece_for(30).unwrap(), None);
        assert_eq!(table.piece_for(1_000).unwrap(), None);
    }

    #[test]
    fn skips_properties() {
        let mut prefix = vec![PROPERTY_TAG, 3, 0, 0xAA, 0xBB, 0xCC];
        prefix.extend_from_slice(&[PROPERTY_TAG, 0, 0]);
        let bytes = encode_table(&prefix, &[0], &[EncodedPosition::single_byte(7)]);
        let mut table = open(bytes, 5, 20);
        assert_eq!(table.next().unwrap(), Some(Piece::new(7, 0, 5, false)));
    }

    #[test]
    fn starts_at_offset() {
        let mut bytes = vec![0xEE; 33];
        bytes.extend(three_pieces());
        let mut table = PieceTable::new(Cursor::new(bytes), 33, 30, 20, discard()).unwrap();
        assert_eq!(table.pieces().unwrap().len(), 3);
    }

    #[test]
    fn bad_tag() {
        let mut bytes = three_pieces();
        bytes[0] = 3;
        let err = PieceTable::new(Cursor::new(bytes), 0, 30, 20, discard()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn truncated_property() {
        let bytes = vec![PROPERTY_TAG, 10, 0, 1, 2];
        let err = PieceTable::new(Cursor::new(bytes), 0, 30, 20, discard()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn oversized_count_fails_on_read() {
        let mut bytes = vec![PIECE_TABLE_TAG];
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&[0; 16]);
        let mut table = PieceTable::new(Cursor::new(bytes), 0, 30, 20, discard()).unwrap();
        assert_eq!(table.count(), (u32::MAX as usize - 4) / 12);
        assert_eq!(table.pieces().unwrap_err().kind(), ErrorKind::Io);
    }

    #[test]
    fn byte_offsets() {
        let single = Piece::new(100, 10, 20, false);
        assert_eq!(single.byte_offset(10), 100);
        assert_eq!(single.byte_offset(15), 105);
        let double = Piece::new(100, 10, 20, true);
        assert_eq!(double.byte_offset(15), 110);
    }
}
