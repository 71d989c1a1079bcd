//! DSA binding over the RustCrypto `dsa` crate.
//!
//! Native encoding is PKCS#8 DER for private halves and SubjectPublicKeyInfo
//! DER for public halves. Signatures are DER `(r, s)` sequences.

use ::dsa::{Components, KeySize, Signature, SigningKey, VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rand::rngs::OsRng;
use signature::hazmat::{PrehashSigner, PrehashVerifier};
use signature::SignatureEncoding;
use zeroize::Zeroizing;

use super::ProviderError;
use crate::key::KeyType;

/// DSA key state: exactly one half is held.
#[derive(Clone)]
pub enum DsaKeyState {
    Private(SigningKey),
    Public(VerifyingKey),
}

impl DsaKeyState {
    pub fn key_type(&self) -> KeyType {
        match self {
            DsaKeyState::Private(_) => KeyType::Private,
            DsaKeyState::Public(_) => KeyType::Public,
        }
    }

    fn verifying_key(&self) -> &VerifyingKey {
        match self {
            DsaKeyState::Private(key) => key.verifying_key(),
            DsaKeyState::Public(key) => key,
        }
    }
}

/// Maps `(q, p)` byte lengths onto a FIPS 186 domain size.
#[allow(deprecated)]
pub fn key_size(q_bytes: usize, p_bytes: usize) -> Result<KeySize, ProviderError> {
    match (p_bytes, q_bytes) {
        (128, 20) => Ok(KeySize::DSA_1024_160),
        (256, 28) => Ok(KeySize::DSA_2048_224),
        (256, 32) => Ok(KeySize::DSA_2048_256),
        (384, 32) => Ok(KeySize::DSA_3072_256),
        _ => Err(ProviderError::InvalidParameters(format!(
            "unsupported DSA domain size p={} q={} bits",
            p_bytes * 8,
            q_bytes * 8
        ))),
    }
}

/// Generates fresh domain parameters and a private key.
pub fn make_key(q_bytes: usize, p_bytes: usize) -> Result<SigningKey, ProviderError> {
    let size = key_size(q_bytes, p_bytes)?;
    let mut rng = OsRng;
    let components = Components::generate(&mut rng, size);
    Ok(SigningKey::generate(&mut rng, components))
}

pub fn export(state: &DsaKeyState, which: KeyType) -> Result<Zeroizing<Vec<u8>>, ProviderError> {
    let der = match (state, which) {
        (DsaKeyState::Private(key), KeyType::Private) => key
            .to_pkcs8_der()
            .map_err(|e| ProviderError::Encoding(e.to_string()))?
            .as_bytes()
            .to_vec(),
        (_, KeyType::Public) => state
            .verifying_key()
            .to_public_key_der()
            .map_err(|e| ProviderError::Encoding(e.to_string()))?
            .as_bytes()
            .to_vec(),
        (DsaKeyState::Public(_), KeyType::Private) => {
            return Err(ProviderError::InvalidKey(
                "DSA public key has no private half to export".to_string(),
            ))
        }
    };
    Ok(Zeroizing::new(der))
}

/// Imports a PKCS#8 private key, falling back to an SPKI public key.
pub fn import(bytes: &[u8]) -> Result<DsaKeyState, ProviderError> {
    if let Ok(key) = SigningKey::from_pkcs8_der(bytes) {
        return Ok(DsaKeyState::Private(key));
    }
    VerifyingKey::from_public_key_der(bytes)
        .map(DsaKeyState::Public)
        .map_err(|e| ProviderError::Encoding(format!("not a DSA key: {e}")))
}

/// Signs `digest` as given; no hash is applied.
pub fn sign(state: &DsaKeyState, digest: &[u8]) -> Result<Vec<u8>, ProviderError> {
    let key = match state {
        DsaKeyState::Private(key) => key,
        DsaKeyState::Public(_) => {
            return Err(ProviderError::InvalidKey(
                "operation requires a DSA private key".to_string(),
            ))
        }
    };
    let signature: Signature = key
        .sign_prehash(digest)
        .map_err(|e| ProviderError::Arithmetic(e.to_string()))?;
    Ok(signature.to_vec())
}

/// Verifies a DER signature over `digest`. Undecodable signatures are
/// malformed input; decodable ones that do not match are
/// [`ProviderError::BadSignature`].
pub fn verify(state: &DsaKeyState, digest: &[u8], signature: &[u8]) -> Result<(), ProviderError> {
    let signature = Signature::try_from(signature)
        .map_err(|e| ProviderError::InvalidInput(format!("malformed DSA signature: {e}")))?;
    state
        .verifying_key()
        .verify_prehash(digest, &signature)
        .map_err(|_| ProviderError::BadSignature)
}
