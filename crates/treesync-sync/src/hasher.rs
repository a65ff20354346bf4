//! Streaming content digests

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use treesync_types::{BlockSize, ContentHash, Error, Result};

/// Computes a file's content digest by streaming fixed-size blocks through BLAKE3
#[derive(Debug, Clone)]
pub struct ContentHasher {
    block_size: BlockSize,
}

impl ContentHasher {
    /// Create a hasher reading `block_size` bytes at a time
    pub fn new(block_size: BlockSize) -> Self {
        Self { block_size }
    }

    /// Digest of the bytes of the file at `path`
    pub fn hash_file(&self, path: &Path) -> Result<ContentHash> {
        let mut file = File::open(path).map_err(|e| Error::hash(path, e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        let mut block = vec![0u8; self.block_size.get()];

        loop {
            let read = match file.read(&mut block) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::hash(path, e.to_string())),
            };
            hasher.update(&block[..read]);
        }

        Ok(ContentHash::new(hasher.finalize().to_hex().to_string()))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(BlockSize::default())
    }
}
