//! Key pair generation.
//!
//! Prime searches run on the [`KeygenQueue`] worker; the submitting call waits
//! for the private material and then derives the public half and key id in
//! its own context.

use std::sync::Arc;

use cryptoplane_core::{AlgorithmId, EngineConfig};
use tracing::{info, warn};

use crate::error::{PkError, PkResult};
use crate::fingerprint::derive_public;
use crate::key::{KeyItem, KeyMaterial};
use crate::provider;
use crate::provider::dsa::DsaKeyState;
use crate::provider::rsa::RsaKeyState;
use crate::queue::{JobHandle, KeygenQueue};

pub const DEFAULT_RSA_EXPONENT: u64 = 65537;
pub const DEFAULT_DSA_P_BITS: u32 = 1024;
pub const DEFAULT_DSA_Q_BITS: u32 = 160;

/// FIPS 186 `(p, q)` domain sizes, in bits.
const DSA_DOMAIN_SIZES: [(u32, u32); 4] = [(1024, 160), (2048, 224), (2048, 256), (3072, 256)];

/// Generation parameters. Zero fields take the family default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGenParams {
    Rsa { bits: u32, e: u64 },
    Dsa { p_bits: u32, q_bits: u32 },
}

impl KeyGenParams {
    /// RSA with the default public exponent.
    pub fn rsa(bits: u32) -> Self {
        KeyGenParams::Rsa { bits, e: 0 }
    }

    /// DSA with the default 1024/160 domain.
    pub fn dsa() -> Self {
        KeyGenParams::Dsa {
            p_bits: 0,
            q_bits: 0,
        }
    }

    pub fn algorithm(&self) -> AlgorithmId {
        match self {
            KeyGenParams::Rsa { .. } => AlgorithmId::Rsa,
            KeyGenParams::Dsa { .. } => AlgorithmId::Dsa,
        }
    }

    /// Substitutes defaults for zero fields.
    pub fn resolved(self) -> Self {
        match self {
            KeyGenParams::Rsa { bits, e } => KeyGenParams::Rsa {
                bits,
                e: if e == 0 { DEFAULT_RSA_EXPONENT } else { e },
            },
            KeyGenParams::Dsa { p_bits, q_bits } => KeyGenParams::Dsa {
                p_bits: if p_bits == 0 { DEFAULT_DSA_P_BITS } else { p_bits },
                q_bits: if q_bits == 0 { DEFAULT_DSA_Q_BITS } else { q_bits },
            },
        }
    }
}

/// Body of a generation job. Runs on the worker.
fn generate_material(params: KeyGenParams) -> PkResult<KeyMaterial> {
    match params.resolved() {
        KeyGenParams::Rsa { bits, e } => {
            let key = provider::rsa::make_key(bits as usize / 8, e)?;
            Ok(KeyMaterial::Rsa(RsaKeyState::Private(key)))
        }
        KeyGenParams::Dsa { p_bits, q_bits } => {
            let key = provider::dsa::make_key(q_bits as usize / 8, p_bits as usize / 8)?;
            Ok(KeyMaterial::Dsa(DsaKeyState::Private(key)))
        }
    }
}

/// Front end for key pair generation over an injected queue.
pub struct KeygenService {
    queue: Arc<KeygenQueue>,
    config: EngineConfig,
}

impl KeygenService {
    pub fn new(queue: Arc<KeygenQueue>, config: EngineConfig) -> PkResult<Self> {
        config
            .validate()
            .map_err(|e| PkError::InvalidArgument(e.to_string()))?;
        Ok(Self { queue, config })
    }

    /// Validates `config` and starts a dedicated queue for it.
    pub fn start(config: EngineConfig) -> PkResult<Self> {
        config
            .validate()
            .map_err(|e| PkError::InvalidArgument(e.to_string()))?;
        let queue = Arc::new(KeygenQueue::from_config(&config.keygen)?);
        Ok(Self { queue, config })
    }

    pub fn queue(&self) -> &Arc<KeygenQueue> {
        &self.queue
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generates a key pair into `private` and `public`, blocking until the
    /// worker finishes.
    ///
    /// Both items must be uninitialized and owned by the descriptor of the
    /// family named in `params`. Must not be called from inside an async
    /// runtime; use [`KeygenService::generate_async`] there.
    pub fn generate(
        &self,
        params: KeyGenParams,
        private: &mut KeyItem,
        public: &mut KeyItem,
    ) -> PkResult<()> {
        let handle = self.submit(params, private, public)?;
        let material = handle.wait()?;
        self.finish(material, private, public)
    }

    /// Async variant of [`KeygenService::generate`]; suspends only while the
    /// worker runs.
    pub async fn generate_async(
        &self,
        params: KeyGenParams,
        private: &mut KeyItem,
        public: &mut KeyItem,
    ) -> PkResult<()> {
        let handle = self.submit(params, private, public)?;
        let material = handle.wait_async().await?;
        self.finish(material, private, public)
    }

    fn submit(
        &self,
        params: KeyGenParams,
        private: &KeyItem,
        public: &KeyItem,
    ) -> PkResult<JobHandle<KeyMaterial>> {
        self.check(params, private, public)?;
        self.queue.submit(move || generate_material(params))
    }

    fn check(&self, params: KeyGenParams, private: &KeyItem, public: &KeyItem) -> PkResult<()> {
        let family = params.algorithm();
        for item in [private, public] {
            if item.algorithm().id != family {
                return Err(PkError::InvalidArgument(format!(
                    "{family} parameters given for a {} key item",
                    item.algorithm().name
                )));
            }
            item.ensure_uninitialized()?;
        }

        match params.resolved() {
            KeyGenParams::Rsa { bits, e } => {
                let keygen = &self.config.keygen;
                if bits < keygen.min_rsa_bits || bits > keygen.max_rsa_bits {
                    return Err(PkError::InvalidArgument(format!(
                        "RSA modulus of {bits} bits outside [{}, {}]",
                        keygen.min_rsa_bits, keygen.max_rsa_bits
                    )));
                }
                if bits % 8 != 0 {
                    return Err(PkError::InvalidArgument(format!(
                        "RSA modulus of {bits} bits is not a whole number of bytes"
                    )));
                }
                provider::rsa::check_exponent(e)?;
            }
            KeyGenParams::Dsa { p_bits, q_bits } => {
                if !DSA_DOMAIN_SIZES.contains(&(p_bits, q_bits)) {
                    return Err(PkError::InvalidArgument(format!(
                        "unsupported DSA domain size {p_bits}/{q_bits}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn finish(
        &self,
        material: KeyMaterial,
        private: &mut KeyItem,
        public: &mut KeyItem,
    ) -> PkResult<()> {
        private.install(material)?;
        if let Err(e) = derive_public(private, public, self.config.fingerprint.key_id_hash) {
            warn!(
                algorithm = %private.algorithm().name,
                error = %e,
                "public derivation failed after generation"
            );
            return Err(e);
        }
        info!(
            algorithm = %private.algorithm().name,
            key_id = %private.key_id(),
            "generated key pair"
        );
        Ok(())
    }
}
