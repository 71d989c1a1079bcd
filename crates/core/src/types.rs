//! Core types shared across the Cryptoplane workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an algorithm known to the service.
///
/// The numeric values are the stable wire identifiers used by the key
/// management layer; see [`AlgorithmId::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmId {
    /// RSA public-key family
    Rsa,
    /// DSA public-key family
    Dsa,
    /// SHA-1 (160-bit)
    Sha1,
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// BLAKE3 (256-bit output)
    Blake3,
}

impl AlgorithmId {
    /// All identifiers, in wire order.
    pub const ALL: [AlgorithmId; 8] = [
        AlgorithmId::Rsa,
        AlgorithmId::Dsa,
        AlgorithmId::Sha1,
        AlgorithmId::Sha224,
        AlgorithmId::Sha256,
        AlgorithmId::Sha384,
        AlgorithmId::Sha512,
        AlgorithmId::Blake3,
    ];

    /// Stable numeric identifier.
    pub fn raw(self) -> u32 {
        match self {
            AlgorithmId::Rsa => 1,
            AlgorithmId::Dsa => 2,
            AlgorithmId::Sha1 => 16,
            AlgorithmId::Sha224 => 17,
            AlgorithmId::Sha256 => 18,
            AlgorithmId::Sha384 => 19,
            AlgorithmId::Sha512 => 20,
            AlgorithmId::Blake3 => 32,
        }
    }

    /// Resolves a numeric identifier. Unknown values yield `None`.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.raw() == raw)
    }

    /// Lowercase name, matching the configuration spelling.
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmId::Rsa => "rsa",
            AlgorithmId::Dsa => "dsa",
            AlgorithmId::Sha1 => "sha1",
            AlgorithmId::Sha224 => "sha224",
            AlgorithmId::Sha256 => "sha256",
            AlgorithmId::Sha384 => "sha384",
            AlgorithmId::Sha512 => "sha512",
            AlgorithmId::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
