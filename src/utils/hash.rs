use anyhow::Result;
use memmap2::MmapOptions;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use xxhash_rust::xxh3::{Xxh3, xxh3_128};

/// Checksum algorithms available for direct hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256, compatible with `sha256sum`
    #[default]
    Sha256,
    /// 128-bit xxHash3, fast but not cryptographic
    Xxh3,
}

impl HashAlgorithm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Xxh3 => "xxh3",
        }
    }

    /// Length of the hex digest produced by this algorithm
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Xxh3 => 32,
        }
    }

    #[must_use]
    pub fn hash_bytes(self, data: &[u8]) -> String {
        match self {
            Self::Sha256 => format!("{:x}", Sha256::digest(data)),
            Self::Xxh3 => format!("{:032x}", xxh3_128(data)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "xxh3" => Ok(Self::Xxh3),
            other => Err(anyhow::anyhow!(
                "Unknown hash algorithm '{other}' (expected sha256 or xxh3)"
            )),
        }
    }
}

/// Hash a file, memory-mapping it when it is at least `mmap_threshold` bytes
///
/// # Errors
///
/// Returns an error if the file cannot be opened, mapped or read.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm, mmap_threshold: u64) -> Result<String> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;

    if metadata.len() == 0 {
        return Ok(algorithm.hash_bytes(b""));
    }

    if metadata.len() >= mmap_threshold {
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        Ok(algorithm.hash_bytes(&mmap))
    } else {
        hash_reader(file, algorithm)
    }
}

/// Hash everything readable from `reader` in fixed-size chunks
///
/// # Errors
///
/// Returns an error if reading fails.
pub fn hash_reader<R: Read>(mut reader: R, algorithm: HashAlgorithm) -> Result<String> {
    let mut buffer = vec![0u8; 65536];

    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            Ok(format!("{:x}", hasher.finalize()))
        }
        HashAlgorithm::Xxh3 => {
            let mut hasher = Xxh3::new();
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            Ok(format!("{:032x}", hasher.digest128()))
        }
    }
}
