/// What to do when the header does not start with the compound file signature
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MagicPolicy {
    /// Log a warning, and read the file anyway
    Warn,
    /// Fail to open the file
    Reject,
}

impl Default for MagicPolicy {
    fn default() -> Self {
        MagicPolicy::Warn
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bat_cache_size: usize,
    piece_cache_size: usize,
    magic_policy: MagicPolicy,
}

impl Config {
    pub const DEFAULT_BAT_CACHE_SIZE: usize = 16;
    pub const DEFAULT_PIECE_CACHE_SIZE: usize = 20;

    pub fn new() -> Self {
        Self::default()
    }

    /// The number of BAT and XBAT blocks to keep in memory
    ///
    /// Values below 1 are treated as 1
    pub fn bat_cache_size(&mut self, size: usize) -> &mut Self {
        self.bat_cache_size = size.max(1);
        self
    }

    /// The number of piece table records to read at a time
    ///
    /// Most documents have a single piece; fast-saved documents may have several.
    /// Values below 1 are treated as 1
    pub fn piece_cache_size(&mut self, size: usize) -> &mut Self {
        self.piece_cache_size = size.max(1);
        self
    }

    pub fn magic_policy(&mut self, policy: MagicPolicy) -> &mut Self {
        self.magic_policy = policy;
        self
    }

    pub fn get_bat_cache_size(&self) -> usize {
        self.bat_cache_size
    }

    pub fn get_piece_cache_size(&self) -> usize {
        self.piece_cache_size
    }

    pub fn get_magic_policy(&self) -> MagicPolicy {
        self.magic_policy
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bat_cache_size: Self::DEFAULT_BAT_CACHE_SIZE,
            piece_cache_size: Self::DEFAULT_PIECE_CACHE_SIZE,
            magic_policy: MagicPolicy::default(),
        }
    }
}
