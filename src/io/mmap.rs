//! Memory-mapped input
//!
//! Opens a trie file as a read-only mapping and hands out the underlying
//! byte slice. The caller keeps the mapping alive for as long as any
//! `Trie` bound over it with [`Trie::map`](crate::Trie::map) is in use;
//! the borrow checker enforces this.
//!
//! # Examples
//!
//! ```rust,no_run
//! use nestrie::io::MemoryMappedInput;
//! use nestrie::Trie;
//!
//! let mapping = MemoryMappedInput::from_path("keys.nestrie")?;
//! let trie = Trie::map(mapping.as_bytes())?;
//! assert!(!trie.is_empty());
//! # Ok::<(), nestrie::NestrieError>(())
//! ```

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::Result;
use crate::io::SliceDataInput;

/// A read-only memory mapping of a file
#[derive(Debug)]
pub struct MemoryMappedInput {
    mmap: Mmap,
}

impl MemoryMappedInput {
    /// Map an already-open file
    pub fn new(file: File) -> Result<Self> {
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap })
    }

    /// Open and map the file at `path`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::open(path)?)
    }

    /// Size of the mapped region in bytes
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// True when the mapped region is empty
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// The mapped bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// A cursor over the mapped bytes
    pub fn input(&self) -> SliceDataInput<'_> {
        SliceDataInput::new(&self.mmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_map_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&0x0807_0605_0403_0201u64.to_le_bytes()).unwrap();
        file.flush().unwrap();

        let mapping = MemoryMappedInput::from_path(file.path()).unwrap();
        assert_eq!(mapping.len(), 8);
        use crate::io::DataInput;
        let mut input = mapping.input();
        assert_eq!(input.read_u64().unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MemoryMappedInput::from_path("/nonexistent/nestrie").unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
