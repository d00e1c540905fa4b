//! Content hashing, selectable by algorithm name.
//!
//! Serves two pipeline steps: verifying fetched bytes against a digest stored
//! in the shard, and computing a content hash persisted with accepted
//! samples. Digests are hex-encoded.

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    /// Parse an algorithm name (case-insensitive). Returns `None` for
    /// unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "md5" => Some(HashAlgorithm::Md5),
            "sha1" => Some(HashAlgorithm::Sha1),
            "sha256" => Some(HashAlgorithm::Sha256),
            "sha512" => Some(HashAlgorithm::Sha512),
            "blake3" => Some(HashAlgorithm::Blake3),
            _ => None,
        }
    }

    /// The canonical name, used as the metadata field name for computed
    /// hashes and as the verification column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    /// Hex-encoded digest of `data`.
    pub fn digest(&self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Md5 => hex::encode(Md5::digest(data)),
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
            HashAlgorithm::Blake3 => blake3::hash(data).to_hex().to_string(),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!(HashAlgorithm::parse("md5"), Some(HashAlgorithm::Md5));
        assert_eq!(HashAlgorithm::parse("SHA256"), Some(HashAlgorithm::Sha256));
        assert_eq!(HashAlgorithm::parse(" blake3 "), Some(HashAlgorithm::Blake3));
        assert_eq!(HashAlgorithm::parse("crc32"), None);
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            HashAlgorithm::Sha256.digest(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_md5_known_vector() {
        assert_eq!(
            HashAlgorithm::Md5.digest(b"hello"),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        for algo in [
            HashAlgorithm::Md5,
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha512,
            HashAlgorithm::Blake3,
        ] {
            assert_eq!(algo.digest(b"abc"), algo.digest(b"abc"));
            assert_ne!(algo.digest(b"abc"), algo.digest(b"abd"));
        }
    }
}
