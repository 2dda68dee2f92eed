//! Read-only access to OLE2 compound files, and extraction of the text of Word documents
//! stored in them.
//!
//! A compound file is a small file system: the file is split into 512 byte blocks, linked into
//! chains by the block allocation table (BAT), and a directory of named entries points at the
//! first block of each chain.

pub mod bat;
pub mod cache;
pub mod config;
pub mod cp1252;
pub mod doc;
pub mod entry;
mod errors;
pub mod fs;
pub mod header;
pub mod piece;
pub mod reader;
pub mod stream;

pub use config::{Config, MagicPolicy};
pub use entry::{Entry, EntryType};
pub use errors::{Error, ErrorKind, Result};
pub use fs::BlockFileSystem;
pub use piece::{Piece, PieceTable};
pub use reader::PieceReader;
pub use stream::BlockStream;
