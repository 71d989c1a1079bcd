//! RSA binding over the RustCrypto `rsa` crate.
//!
//! Native encoding is PKCS#1 DER: `RSAPrivateKey` for private halves and
//! `RSAPublicKey` for public halves.

use std::borrow::Cow;

use ::rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey,
};
use ::rsa::traits::PublicKeyParts;
use ::rsa::{BigUint, Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use cryptoplane_core::AlgorithmId;
use rand::rngs::OsRng;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::ProviderError;
use crate::key::KeyType;

/// Largest public exponent the provider accepts (2^33 - 1).
const MAX_PUBLIC_EXPONENT: u64 = (1 << 33) - 1;

/// RSA key state: exactly one half is held.
#[derive(Clone)]
pub enum RsaKeyState {
    Private(RsaPrivateKey),
    Public(RsaPublicKey),
}

impl RsaKeyState {
    pub fn key_type(&self) -> KeyType {
        match self {
            RsaKeyState::Private(_) => KeyType::Private,
            RsaKeyState::Public(_) => KeyType::Public,
        }
    }

    fn public_key(&self) -> Cow<'_, RsaPublicKey> {
        match self {
            RsaKeyState::Private(key) => Cow::Owned(key.to_public_key()),
            RsaKeyState::Public(key) => Cow::Borrowed(key),
        }
    }

    fn private_key(&self) -> Result<&RsaPrivateKey, ProviderError> {
        match self {
            RsaKeyState::Private(key) => Ok(key),
            RsaKeyState::Public(_) => Err(ProviderError::InvalidKey(
                "operation requires an RSA private key".to_string(),
            )),
        }
    }
}

/// Encryption padding understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionPadding {
    Pkcs1V15,
    /// OAEP with the given hash for both label hashing and MGF1
    Oaep(AlgorithmId),
}

/// Signature padding understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePadding {
    /// PKCS#1 v1.5 with the DigestInfo prefix of the given hash
    Pkcs1V15(AlgorithmId),
    Pss { hash: AlgorithmId, salt_len: usize },
}

/// Rejects exponents the key search cannot satisfy.
pub fn check_exponent(exponent: u64) -> Result<(), ProviderError> {
    if exponent < 3 || exponent % 2 == 0 {
        return Err(ProviderError::InvalidParameters(format!(
            "public exponent {exponent} must be odd and at least 3"
        )));
    }
    if exponent > MAX_PUBLIC_EXPONENT {
        return Err(ProviderError::InvalidParameters(format!(
            "public exponent {exponent} exceeds {MAX_PUBLIC_EXPONENT}"
        )));
    }
    Ok(())
}

/// Generates a private key with a modulus of `modulus_bytes * 8` bits.
pub fn make_key(modulus_bytes: usize, exponent: u64) -> Result<RsaPrivateKey, ProviderError> {
    check_exponent(exponent)?;
    let mut rng = OsRng;
    RsaPrivateKey::new_with_exp(&mut rng, modulus_bytes * 8, &BigUint::from(exponent))
        .map_err(ProviderError::from)
}

pub fn export(state: &RsaKeyState, which: KeyType) -> Result<Zeroizing<Vec<u8>>, ProviderError> {
    let der = match (state, which) {
        (RsaKeyState::Private(key), KeyType::Private) => {
            key.to_pkcs1_der().map_err(encoding)?.as_bytes().to_vec()
        }
        (RsaKeyState::Private(key), KeyType::Public) => key
            .to_public_key()
            .to_pkcs1_der()
            .map_err(encoding)?
            .as_bytes()
            .to_vec(),
        (RsaKeyState::Public(key), KeyType::Public) => {
            key.to_pkcs1_der().map_err(encoding)?.as_bytes().to_vec()
        }
        (RsaKeyState::Public(_), KeyType::Private) => {
            return Err(ProviderError::InvalidKey(
                "RSA public key has no private half to export".to_string(),
            ))
        }
    };
    Ok(Zeroizing::new(der))
}

/// Imports a PKCS#1 private key, falling back to a PKCS#1 public key.
pub fn import(bytes: &[u8]) -> Result<RsaKeyState, ProviderError> {
    if let Ok(key) = RsaPrivateKey::from_pkcs1_der(bytes) {
        return Ok(RsaKeyState::Private(key));
    }
    RsaPublicKey::from_pkcs1_der(bytes)
        .map(RsaKeyState::Public)
        .map_err(|e| ProviderError::Encoding(format!("not a PKCS#1 RSA key: {e}")))
}

pub fn encrypt(
    state: &RsaKeyState,
    padding: EncryptionPadding,
    input: &[u8],
) -> Result<Vec<u8>, ProviderError> {
    let public = state.public_key();
    let mut rng = OsRng;
    match padding {
        EncryptionPadding::Pkcs1V15 => public.encrypt(&mut rng, Pkcs1v15Encrypt, input),
        EncryptionPadding::Oaep(hash) => public.encrypt(&mut rng, oaep_padding(hash)?, input),
    }
    .map_err(ProviderError::from)
}

/// Decrypts `input`; a padding or validity failure is reported as
/// [`ProviderError::InvalidPadding`]. Ciphertext that is not exactly one
/// modulus long is [`ProviderError::InvalidInput`].
pub fn decrypt(
    state: &RsaKeyState,
    padding: EncryptionPadding,
    input: &[u8],
) -> Result<Zeroizing<Vec<u8>>, ProviderError> {
    let key = state.private_key()?;
    check_block_len("ciphertext", input, key.size())?;
    match padding {
        EncryptionPadding::Pkcs1V15 => key.decrypt(Pkcs1v15Encrypt, input),
        EncryptionPadding::Oaep(hash) => key.decrypt(oaep_padding(hash)?, input),
    }
    .map(Zeroizing::new)
    .map_err(ProviderError::from)
}

pub fn sign(
    state: &RsaKeyState,
    padding: SignaturePadding,
    digest: &[u8],
) -> Result<Vec<u8>, ProviderError> {
    let key = state.private_key()?;
    let mut rng = OsRng;
    match padding {
        SignaturePadding::Pkcs1V15(hash) => {
            key.sign_with_rng(&mut rng, pkcs1v15_padding(hash)?, digest)
        }
        SignaturePadding::Pss { hash, salt_len } => {
            key.sign_with_rng(&mut rng, pss_padding(hash, salt_len)?, digest)
        }
    }
    .map_err(ProviderError::from)
}

/// Verifies `signature` over `digest`; a well-formed mismatch is reported as
/// [`ProviderError::BadSignature`]. A signature of the wrong length is
/// [`ProviderError::InvalidInput`].
pub fn verify(
    state: &RsaKeyState,
    padding: SignaturePadding,
    digest: &[u8],
    signature: &[u8],
) -> Result<(), ProviderError> {
    let public = state.public_key();
    check_block_len("signature", signature, public.size())?;
    match padding {
        SignaturePadding::Pkcs1V15(hash) => {
            public.verify(pkcs1v15_padding(hash)?, digest, signature)
        }
        SignaturePadding::Pss { hash, salt_len } => {
            public.verify(pss_padding(hash, salt_len)?, digest, signature)
        }
    }
    .map_err(ProviderError::from)
}

fn check_block_len(what: &str, input: &[u8], modulus_len: usize) -> Result<(), ProviderError> {
    if input.len() != modulus_len {
        return Err(ProviderError::InvalidInput(format!(
            "{what} is {} bytes, modulus is {modulus_len}",
            input.len()
        )));
    }
    Ok(())
}

fn unsupported_hash(hash: AlgorithmId, what: &str) -> ProviderError {
    ProviderError::InvalidParameters(format!("{hash} cannot be used for {what}"))
}

fn oaep_padding(hash: AlgorithmId) -> Result<Oaep, ProviderError> {
    Ok(match hash {
        AlgorithmId::Sha1 => Oaep::new::<Sha1>(),
        AlgorithmId::Sha224 => Oaep::new::<Sha224>(),
        AlgorithmId::Sha256 => Oaep::new::<Sha256>(),
        AlgorithmId::Sha384 => Oaep::new::<Sha384>(),
        AlgorithmId::Sha512 => Oaep::new::<Sha512>(),
        other => return Err(unsupported_hash(other, "OAEP")),
    })
}

fn pkcs1v15_padding(hash: AlgorithmId) -> Result<Pkcs1v15Sign, ProviderError> {
    Ok(match hash {
        AlgorithmId::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        AlgorithmId::Sha224 => Pkcs1v15Sign::new::<Sha224>(),
        AlgorithmId::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        AlgorithmId::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        AlgorithmId::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        other => return Err(unsupported_hash(other, "PKCS#1 v1.5 signatures")),
    })
}

fn pss_padding(hash: AlgorithmId, salt_len: usize) -> Result<Pss, ProviderError> {
    Ok(match hash {
        AlgorithmId::Sha1 => Pss::new_with_salt::<Sha1>(salt_len),
        AlgorithmId::Sha224 => Pss::new_with_salt::<Sha224>(salt_len),
        AlgorithmId::Sha256 => Pss::new_with_salt::<Sha256>(salt_len),
        AlgorithmId::Sha384 => Pss::new_with_salt::<Sha384>(salt_len),
        AlgorithmId::Sha512 => Pss::new_with_salt::<Sha512>(salt_len),
        other => return Err(unsupported_hash(other, "PSS signatures")),
    })
}

fn encoding(err: ::rsa::pkcs1::Error) -> ProviderError {
    ProviderError::Encoding(err.to_string())
}

impl From<::rsa::Error> for ProviderError {
    fn from(err: ::rsa::Error) -> Self {
        use ::rsa::Error;
        match err {
            Error::Decryption => ProviderError::InvalidPadding,
            Error::Verification => ProviderError::BadSignature,
            Error::MessageTooLong | Error::InputNotHashed | Error::LabelTooLong => {
                ProviderError::InvalidInput(err.to_string())
            }
            Error::Pkcs1(_) | Error::Pkcs8(_) => ProviderError::Encoding(err.to_string()),
            Error::NprimesTooSmall
            | Error::InvalidModulus
            | Error::InvalidExponent
            | Error::ModulusTooLarge
            | Error::PublicExponentTooSmall
            | Error::PublicExponentTooLarge => ProviderError::InvalidParameters(err.to_string()),
            Error::Internal => ProviderError::Arithmetic(err.to_string()),
            other => ProviderError::Other(other.to_string()),
        }
    }
}
