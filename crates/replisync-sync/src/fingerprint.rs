//! Streaming content fingerprints
//!
//! Files are hashed in fixed-size chunks so memory use stays bounded no matter
//! how large the file is. Two files are treated as equal iff their digests are
//! equal.

use md5::Md5;
use replisync_types::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Default read chunk size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Digest function used for fingerprints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    /// MD5, 128-bit
    Md5,
    /// SHA-256, 256-bit
    Sha256,
    /// BLAKE3, 256-bit
    #[default]
    Blake3,
}

impl FingerprintAlgorithm {
    /// Digest length in bytes
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha256 | Self::Blake3 => 32,
        }
    }

    fn hasher(self) -> StreamHasher {
        match self {
            Self::Md5 => StreamHasher::Md5(Md5::default()),
            Self::Sha256 => StreamHasher::Sha256(Sha256::default()),
            Self::Blake3 => StreamHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        })
    }
}

impl FromStr for FingerprintAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(Error::config(format!(
                "unknown fingerprint algorithm '{}' (expected md5, sha256 or blake3)",
                other
            ))),
        }
    }
}

enum StreamHasher {
    Md5(Md5),
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl StreamHasher {
    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Md5(hasher) => hasher.update(chunk),
            Self::Sha256(hasher) => hasher.update(chunk),
            Self::Blake3(hasher) => {
                hasher.update(chunk);
            }
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Md5(hasher) => hasher.finalize().to_vec(),
            Self::Sha256(hasher) => hasher.finalize().to_vec(),
            Self::Blake3(hasher) => hasher.finalize().as_bytes().to_vec(),
        }
    }
}

/// Fixed-length digest of a file's full content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: FingerprintAlgorithm,
    bytes: Vec<u8>,
}

impl Digest {
    /// Algorithm that produced this digest
    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Computes content fingerprints by streaming files in fixed-size chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprinter {
    algorithm: FingerprintAlgorithm,
    chunk_size: usize,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(FingerprintAlgorithm::default())
    }
}

impl Fingerprinter {
    /// Create a fingerprinter with the default chunk size
    pub fn new(algorithm: FingerprintAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the read chunk size (zero is clamped to one byte)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Configured algorithm
    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    /// Configured chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fingerprint the file at `path`
    pub fn fingerprint(&self, path: &Path) -> Result<Digest> {
        let file = File::open(path).map_err(|e| Error::io("open", path, e))?;
        self.fingerprint_reader(file)
            .map_err(|e| Error::io("read", path, e))
    }

    /// Fingerprint everything `reader` yields until end of stream
    pub fn fingerprint_reader<R: Read>(&self, mut reader: R) -> io::Result<Digest> {
        let mut hasher = self.algorithm.hasher();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(Digest {
            algorithm: self.algorithm,
            bytes: hasher.finalize(),
        })
    }

    /// Whether two files have identical content
    pub fn files_match(&self, a: &Path, b: &Path) -> Result<bool> {
        Ok(self.fingerprint(a)? == self.fingerprint(b)?)
    }
}
