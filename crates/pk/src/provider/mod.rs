//! Arithmetic provider binding.
//!
//! Thin adapters over the RustCrypto `rsa` and `dsa` key objects. Nothing in
//! here decides policy: every function either returns the provider's result or
//! a [`ProviderError`] status, which the engine normalizes in
//! [`crate::error`].

pub mod dsa;
pub mod rsa;

use cryptoplane_core::AlgorithmId;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::key::{KeyMaterial, KeyType};

/// Status reported by the arithmetic provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("buffer too small: {required} bytes required")]
    BufferTooSmall { required: usize },

    #[error("out of memory")]
    OutOfMemory,

    #[error("invalid key parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("arithmetic fault: {0}")]
    Arithmetic(String),

    #[error("invalid padding")]
    InvalidPadding,

    #[error("signature does not match")]
    BadSignature,

    #[error("unclassified provider status: {0}")]
    Other(String),
}

/// Exports one half of `material` in its native encoding.
///
/// Asking a public key for its private half fails with
/// [`ProviderError::InvalidKey`].
pub fn export(
    material: &KeyMaterial,
    which: KeyType,
) -> Result<Zeroizing<Vec<u8>>, ProviderError> {
    match material {
        KeyMaterial::Rsa(state) => rsa::export(state, which),
        KeyMaterial::Dsa(state) => dsa::export(state, which),
    }
}

/// Imports `bytes` as key material of the given public-key family.
pub fn import(algorithm: AlgorithmId, bytes: &[u8]) -> Result<KeyMaterial, ProviderError> {
    match algorithm {
        AlgorithmId::Rsa => rsa::import(bytes).map(KeyMaterial::Rsa),
        AlgorithmId::Dsa => dsa::import(bytes).map(KeyMaterial::Dsa),
        other => Err(ProviderError::InvalidParameters(format!(
            "{other} is not a public-key algorithm"
        ))),
    }
}
