//! Asymmetric-key engine for the Cryptoplane service.
//!
//! This crate generates RSA and DSA key pairs, packs and unpacks their
//! native encodings, and performs encrypt/decrypt/sign/verify over a bound
//! key. It sits below the key-store layer and never persists anything.
//!
//! # Core Capabilities
//!
//! - **Key Generation**: prime searches run on a single background worker;
//!   callers block or await a one-shot completion
//! - **Public Derivation**: the public half is rebuilt from the exported public
//!   encoding, and the same bytes are hashed into the key id
//! - **Serialization**: PKCS#1 DER for RSA, PKCS#8 / SPKI DER for DSA
//! - **Operations**: RSA PKCS#1 v1.5, OAEP and PSS; DSA over a precomputed digest
//!
//! # Supported Algorithms
//!
//! - **Public key**: RSA (512 to 4096 bit moduli), DSA (FIPS 186 domains)
//! - **Hashing**: SHA-1, SHA-2 family, BLAKE3 (key ids only)
//!
//! # Security Principles
//!
//! - All arithmetic is delegated to the RustCrypto `rsa` and `dsa` crates
//! - Exported private encodings and decrypted plaintexts are zeroized on drop
//! - Secrets are never logged; traces carry key ids and lengths only

pub mod algorithm;
pub mod cipher;
pub mod error;
pub mod fingerprint;
pub mod hash;
pub mod key;
pub mod keygen;
pub mod provider;
pub mod queue;
pub mod serialize;

pub use algorithm::{AlgorithmDescriptor, AlgorithmKind};

pub use cipher::{
    CipherParams, DsaCipherParams, PkCipherContext, RsaCipherParams, RsaScheme, VerifyOutcome,
};

pub use error::{PkError, PkResult};

pub use fingerprint::{derive_public, fingerprint, KEY_DATA_MAX_SIZE};

pub use key::{KeyId, KeyItem, KeyMaterial, KeyType, MAX_KEY_ID_SIZE};

pub use keygen::{
    KeyGenParams, KeygenService, DEFAULT_DSA_P_BITS, DEFAULT_DSA_Q_BITS, DEFAULT_RSA_EXPONENT,
};

pub use queue::{JobHandle, KeygenQueue, QueueMetrics};

pub use serialize::{pack, pack_to_vec, packed_len, unpack};

pub use cryptoplane_core::{AlgorithmId, EngineConfig};
