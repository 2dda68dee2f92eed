use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(#[from] ErrorInner);

/// The broad category of an [`Error`](struct.Error.html)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The file is corrupt, or uses a feature which is not supported
    Malformed,
    /// A stream required for text extraction does not exist
    NotFound,
    /// The operation is not valid for the object it was called on
    IllegalState,
    /// Reading the underlying file failed
    Io,
}

#[derive(Debug, Error)]
pub(crate) enum ErrorInner {
    #[error("Magic mismatch: expected {:02x?}, got {:02x?}", repr::header::MAGIC, .magic)]
    BadMagic { magic: [u8; 8] },
    #[error("No root directory entry: directory chain starts at {start}")]
    MissingRoot { start: i32 },
    #[error("Invalid type {kind} for directory entry {index}")]
    InvalidEntryType { index: i32, kind: u8 },
    #[error("Directory entry {index} is reachable through more than one link")]
    CyclicDirectory { index: i32 },
    #[error("Block chain starting at {start} is longer than the BAT, it must loop")]
    CyclicChain { start: i32 },
    #[error("Invalid pointer to BAT block {bat_index}: {block}")]
    BadBatPointer { bat_index: usize, block: i32 },
    #[error("Invalid piece table tag {tag}, expected {}", repr::clx::PIECE_TABLE_TAG)]
    InvalidPieceTableTag { tag: u8 },
    #[error("Invalid piece table: {err}")]
    InvalidPieceTable { err: String },
    #[error("Invalid file information block: {err}")]
    InvalidFib { err: String },
    #[error("Stream {name:?} not found")]
    MissingStream { name: &'static str },
    #[error("Can't list non-directory {name:?}")]
    NotADirectory { name: String },
    #[error("Unable to open {}: {source}", .path.display())]
    UnableToOpen { path: PathBuf, source: io::Error },
    #[error("IO error: {source}")]
    Io { source: io::Error },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self.0 {
            ErrorInner::BadMagic { .. }
            | ErrorInner::MissingRoot { .. }
            | ErrorInner::InvalidEntryType { .. }
            | ErrorInner::CyclicDirectory { .. }
            | ErrorInner::CyclicChain { .. }
            | ErrorInner::BadBatPointer { .. }
            | ErrorInner::InvalidPieceTableTag { .. }
            | ErrorInner::InvalidPieceTable { .. }
            | ErrorInner::InvalidFib { .. } => ErrorKind::Malformed,
            ErrorInner::MissingStream { .. } => ErrorKind::NotFound,
            ErrorInner::NotADirectory { .. } => ErrorKind::IllegalState,
            ErrorInner::UnableToOpen { .. } | ErrorInner::Io { .. } => ErrorKind::Io,
        }
    }
}

impl From<io::Error> for ErrorInner {
    fn from(e: io::Error) -> Self {
        ErrorInner::Io { source: e }
    }
}

impl From<io::Error> for Error {
    /// Errors which passed through an `io::Read` or `io::Seek` impl of this crate are unwrapped
    fn from(e: io::Error) -> Self {
        if e.get_ref().map_or(false, |inner| inner.is::<Error>()) {
            match e.into_inner().map(|inner| inner.downcast::<Error>()) {
                Some(Ok(err)) => return *err,
                _ => unreachable!("checked that the io error wraps an Error"),
            }
        }
        Error(e.into())
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        let kind = match &e.0 {
            ErrorInner::Io { source } | ErrorInner::UnableToOpen { source, .. } => source.kind(),
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, e)
    }
}
