use crate::errors::*;
use crate::fs::BlockFileSystem;
use crate::stream::BlockStream;
use positioned_io::ReadAt;
use repr::entry::Kind;
use std::collections::HashSet;
use std::fmt;
use zerocopy::FromBytes;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntryType {
    Root,
    Directory,
    /// A stream of bytes
    File,
}

impl EntryType {
    fn from_kind(kind: Kind) -> Option<Self> {
        match kind {
            Kind::ROOT => Some(EntryType::Root),
            Kind::DIRECTORY => Some(EntryType::Directory),
            Kind::FILE => Some(EntryType::File),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryType::Root => "ROOT",
            EntryType::Directory => "DIRECTORY",
            EntryType::File => "FILE",
        };
        f.write_str(s)
    }
}

/// A directory entry
///
/// Entries are read on demand and never cached: fetching the same index twice reads it twice.
pub struct Entry<R> {
    fs: BlockFileSystem<R>,
    index: i32,
    name: String,
    kind: EntryType,
    previous: i32,
    next: i32,
    child: i32,
    start_block: i32,
    size: i32,
}

impl<R> Clone for Entry<R> {
    fn clone(&self) -> Self {
        Self {
            fs: self.fs.clone(),
            name: self.name.clone(),
            ..*self
        }
    }
}

impl<R> Entry<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryType {
        self.kind
    }

    /// The position of this entry in the directory
    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn start_block(&self) -> i32 {
        self.start_block
    }

    pub fn previous_index(&self) -> i32 {
        self.previous
    }

    pub fn next_index(&self) -> i32 {
        self.next
    }

    pub fn child_index(&self) -> i32 {
        self.child
    }
}

impl<R: ReadAt> Entry<R> {
    pub(crate) fn parse(fs: BlockFileSystem<R>, index: i32, bytes: &[u8]) -> Result<Self> {
        let raw = repr::entry::Entry::read_from(bytes).ok_or_else(|| ErrorInner::Io {
            source: std::io::ErrorKind::UnexpectedEof.into(),
        })?;
        let kind = match EntryType::from_kind(Kind(raw.kind)) {
            Some(kind) => kind,
            None => {
                return Err(ErrorInner::InvalidEntryType {
                    index,
                    kind: raw.kind,
                }
                .into())
            }
        };
        let name: Vec<u16> = raw.name_units().collect();

        Ok(Self {
            fs,
            index,
            name: String::from_utf16_lossy(&name),
            kind,
            previous: raw.previous.get(),
            next: raw.next.get(),
            child: raw.child.get(),
            start_block: raw.start_block.get(),
            size: raw.size.get(),
        })
    }

    pub fn previous(&self) -> Result<Option<Entry<R>>> {
        self.fs.entry(self.previous)
    }

    pub fn next(&self) -> Result<Option<Entry<R>>> {
        self.fs.entry(self.next)
    }

    pub fn child(&self) -> Result<Option<Entry<R>>> {
        self.fs.entry(self.child)
    }

    /// List the entries of this directory
    ///
    /// Entries are listed depth first starting at the child: each entry is followed by
    /// everything reachable through its previous link, then everything reachable through
    /// its next link.
    pub fn list(&self) -> Result<Vec<Entry<R>>> {
        if self.child < 0 || self.kind == EntryType::File {
            return Err(ErrorInner::NotADirectory {
                name: self.name.clone(),
            }
            .into());
        }

        let mut result = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(self.index);
        let mut pending = vec![self.child];
        while let Some(index) = pending.pop() {
            let entry = match self.fs.entry(index)? {
                Some(entry) => entry,
                None => continue,
            };
            if !seen.insert(index) {
                return Err(ErrorInner::CyclicDirectory { index }.into());
            }
            pending.push(entry.next);
            pending.push(entry.previous);
            result.push(entry);
        }
        Ok(result)
    }

    /// Find the entry of this directory with the given name
    pub fn find_child(&self, name: &str) -> Result<Option<Entry<R>>> {
        Ok(self.list()?.into_iter().find(|entry| entry.name == name))
    }

    /// Open the entry's stream
    ///
    /// The stream is not limited to the entry's size: it ends with the entry's last block.
    pub fn open(&self) -> BlockStream<R> {
        self.fs.open_stream(self.start_block)
    }
}

/// Find the entry with the given name
pub fn find<'a, R>(entries: &'a [Entry<R>], name: &str) -> Option<&'a Entry<R>> {
    entries.iter().find(|entry| entry.name == name)
}

impl<R> fmt::Display for Entry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entry{{name={} index={} type={} size={} prev={} next={} child={} startBlock={}}}",
            self.name,
            self.index,
            self.kind,
            self.size,
            self.previous,
            self.next,
            self.child,
            self.start_block
        )
    }
}

impl<R> fmt::Debug for Entry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("previous", &self.previous)
            .field("next", &self.next)
            .field("child", &self.child)
            .field("start_block", &self.start_block)
            .finish()
    }
}
