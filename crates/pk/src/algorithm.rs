//! Algorithm descriptor registry.
//!
//! Descriptors are immutable statics; a [`KeyItem`](crate::key::KeyItem) or a
//! cipher context holds a `&'static AlgorithmDescriptor` and compares
//! descriptors by id.

use cryptoplane_core::AlgorithmId;

use crate::error::{PkError, PkResult};

/// Family an algorithm belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    PublicKey,
    Hash,
}

/// Static metadata for one algorithm.
#[derive(Debug, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    pub id: AlgorithmId,
    pub name: &'static str,
    pub kind: AlgorithmKind,
    /// Output width in bytes (hashes only; zero otherwise)
    pub digest_size: usize,
    /// Whether the hash has an ASN.1 identifier usable in PKCS#1 padding
    pub pkcs1_identifier: bool,
    /// Hash associated with signing (public-key algorithms only)
    pub sign_hash: Option<AlgorithmId>,
}

impl AlgorithmDescriptor {
    pub fn is_public_key(&self) -> bool {
        self.kind == AlgorithmKind::PublicKey
    }

    pub fn is_hash(&self) -> bool {
        self.kind == AlgorithmKind::Hash
    }
}

const fn public_key(id: AlgorithmId, name: &'static str) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        id,
        name,
        kind: AlgorithmKind::PublicKey,
        digest_size: 0,
        pkcs1_identifier: false,
        sign_hash: Some(AlgorithmId::Sha1),
    }
}

const fn hash(
    id: AlgorithmId,
    name: &'static str,
    digest_size: usize,
    pkcs1_identifier: bool,
) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        id,
        name,
        kind: AlgorithmKind::Hash,
        digest_size,
        pkcs1_identifier,
        sign_hash: None,
    }
}

static REGISTRY: [AlgorithmDescriptor; 8] = [
    public_key(AlgorithmId::Rsa, "rsa"),
    public_key(AlgorithmId::Dsa, "dsa"),
    hash(AlgorithmId::Sha1, "sha1", 20, true),
    hash(AlgorithmId::Sha224, "sha224", 28, true),
    hash(AlgorithmId::Sha256, "sha256", 32, true),
    hash(AlgorithmId::Sha384, "sha384", 48, true),
    hash(AlgorithmId::Sha512, "sha512", 64, true),
    hash(AlgorithmId::Blake3, "blake3", 32, false),
];

/// Looks up the registered descriptor for `id`.
pub fn lookup(id: AlgorithmId) -> Option<&'static AlgorithmDescriptor> {
    REGISTRY.iter().find(|descriptor| descriptor.id == id)
}

/// Looks up a descriptor by its numeric wire identifier.
pub fn lookup_raw(raw: u32) -> Option<&'static AlgorithmDescriptor> {
    AlgorithmId::from_raw(raw).and_then(lookup)
}

/// Resolves `id` to a public-key descriptor.
pub fn public_key_descriptor(id: AlgorithmId) -> PkResult<&'static AlgorithmDescriptor> {
    lookup(id)
        .filter(|descriptor| descriptor.is_public_key())
        .ok_or_else(|| PkError::InvalidArgument(format!("{id} is not a public-key algorithm")))
}

/// Resolves `id` to a hash descriptor.
pub fn hash_descriptor(id: AlgorithmId) -> PkResult<&'static AlgorithmDescriptor> {
    lookup(id)
        .filter(|descriptor| descriptor.is_hash())
        .ok_or_else(|| PkError::InvalidArgument(format!("{id} is not a hash algorithm")))
}

/// Iterates over every registered descriptor.
pub fn all() -> impl Iterator<Item = &'static AlgorithmDescriptor> {
    REGISTRY.iter()
}
