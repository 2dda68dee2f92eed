use crate::cp1252;
use crate::errors::*;
use crate::piece::{Piece, PieceTable};
use byteorder::{ByteOrder, LittleEndian};
use std::io;
use std::io::{Read, Seek, SeekFrom};

/// A seekable reader of a document's text, in logical character order
///
/// `T` is the table stream holding the piece table, `M` the main stream holding the text.
/// Characters are returned as UTF-16 code units: single byte pieces are translated from
/// Cp1252, two byte pieces are returned as stored.
#[derive(Debug)]
pub struct PieceReader<T, M> {
    table: PieceTable<T>,
    main: M,
    /// The logical position of the next character
    position: u32,
    /// The piece holding `position`, with `main` positioned at its byte
    piece: Option<Piece>,
}

impl<T: Read + Seek, M: Read + Seek> PieceReader<T, M> {
    pub fn new(table: PieceTable<T>, main: M) -> Self {
        Self {
            table,
            main,
            position: 0,
            piece: None,
        }
    }

    /// The number of characters in the document
    pub fn len(&self) -> u32 {
        self.table.max_char_pos()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The logical position of the next character
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Read the next character, `None` at the end of the text
    pub fn read_unit(&mut self) -> Result<Option<u16>> {
        if self.position >= self.len() {
            return Ok(None);
        }
        let position = self.position;
        let piece = match self.piece.filter(|piece| position < piece.end()) {
            Some(piece) => piece,
            None => match self.advance()? {
                Some(piece) => piece,
                None => return Ok(None),
            },
        };

        let unit = if piece.is_two_byte() {
            let mut buf = [0; 2];
            if !read_full(&mut self.main, &mut buf)? {
                return Ok(None);
            }
            LittleEndian::read_u16(&buf)
        } else {
            let mut buf = [0; 1];
            if !read_full(&mut self.main, &mut buf)? {
                return Ok(None);
            }
            cp1252::to_unicode(buf[0])
        };
        self.position += 1;
        Ok(Some(unit))
    }

    /// Move to the piece after the current one, skipping empty pieces
    fn advance(&mut self) -> Result<Option<Piece>> {
        loop {
            match self.table.next()? {
                Some(piece) if self.position < piece.end() => {
                    self.main
                        .seek(SeekFrom::Start(u64::from(piece.file_position())))?;
                    self.piece = Some(piece);
                    return Ok(Some(piece));
                }
                Some(_) => {}
                None => {
                    self.piece = None;
                    return Ok(None);
                }
            }
        }
    }

    /// Move to an absolute character position
    ///
    /// Positions at or past the end of the text are clamped to the end.
    pub fn seek(&mut self, char_pos: u32) -> Result<()> {
        if char_pos >= self.len() {
            self.position = self.len();
            self.piece = None;
            return Ok(());
        }
        match self.table.piece_for(char_pos)? {
            Some(piece) => {
                self.main.seek(SeekFrom::Start(piece.byte_offset(char_pos)))?;
                self.piece = Some(piece);
            }
            None => self.piece = None,
        }
        self.position = char_pos;
        Ok(())
    }

    /// Fill `buf` with characters, returning how many were read
    pub fn read_units(&mut self, buf: &mut [u16]) -> Result<usize> {
        let mut read = 0;
        for slot in buf.iter_mut() {
            match self.read_unit()? {
                Some(unit) => *slot = unit,
                None => break,
            }
            read += 1;
        }
        Ok(read)
    }

    /// Read the rest of the text
    ///
    /// Unpaired surrogates are replaced with U+FFFD.
    pub fn read_to_string(&mut self) -> Result<String> {
        let mut units = Vec::new();
        while let Some(unit) = self.read_unit()? {
            units.push(unit);
        }
        Ok(String::from_utf16_lossy(&units))
    }

    /// Iterate over the remaining characters
    pub fn units(&mut self) -> Units<'_, T, M> {
        Units { reader: self }
    }

    pub fn table(&self) -> &PieceTable<T> {
        &self.table
    }

    pub fn into_inner(self) -> (PieceTable<T>, M) {
        (self.table, self.main)
    }

    /// Release both streams
    pub fn close(self) {}
}

/// Returns false if the stream ended before `buf` was filled
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Iterator over characters, see [`PieceReader::units`](struct.PieceReader.html#method.units)
#[derive(Debug)]
pub struct Units<'a, T, M> {
    reader: &'a mut PieceReader<T, M>,
}

impl<T: Read + Seek, M: Read + Seek> Iterator for Units<'_, T, M> {
    type Item = Result<u16>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_unit().transpose()
    }
}
