//! ContentHash: a BLAKE3 content hash truncated to 128 bits (32 hex chars).
//!
//! Files are hashed through a streaming reader, so large videos are never
//! held in memory.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// A content hash - 128 bits (16 bytes, 32 hex chars) of BLAKE3.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ContentHash(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum HashFormatError {
    #[error("invalid hash length: expected 32 hex chars, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character in hash")]
    InvalidHex,
}

impl ContentHash {
    fn from_hasher(hasher: &blake3::Hasher) -> Self {
        let hash = hasher.finalize();
        Self(hex::encode(&hash.as_bytes()[..16]))
    }

    #[cfg(test)]
    pub(crate) fn from_data(data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(data);
        Self::from_hasher(&hasher)
    }

    /// Hash everything the reader yields, in fixed-size chunks.
    pub(crate) fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = blake3::Hasher::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(Self::from_hasher(&hasher))
    }

    pub(crate) fn from_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::with_capacity(1 << 20, file))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentHash {
    type Err = HashFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(HashFormatError::InvalidLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HashFormatError::InvalidHex);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}
