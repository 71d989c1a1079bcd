//! Configuration management for the public-key engine.

use serde::{Deserialize, Serialize};
#[cfg(feature = "toml")]
use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::types::AlgorithmId;

/// Smallest RSA modulus the engine will ever accept, regardless of configuration.
pub const RSA_MODULUS_FLOOR_BITS: u32 = 512;

/// Largest RSA modulus whose public half the provider will import.
pub const RSA_MODULUS_CEILING_BITS: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub keygen: KeygenConfig,
    pub fingerprint: FingerprintConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeygenConfig {
    /// Thread name of the key-generation worker
    pub worker_name: String,
    pub min_rsa_bits: u32,
    pub max_rsa_bits: u32,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            worker_name: "pk-keygen".to_string(),
            min_rsa_bits: RSA_MODULUS_FLOOR_BITS,
            max_rsa_bits: RSA_MODULUS_CEILING_BITS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Hash used to derive key identifiers from exported public material
    pub key_id_hash: AlgorithmId,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            key_id_hash: AlgorithmId::Sha1,
        }
    }
}

impl EngineConfig {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let keygen = &self.keygen;
        if keygen.worker_name.trim().is_empty() {
            return Err(CoreError::Config(
                "keygen.worker_name must not be empty".to_string(),
            ));
        }
        if keygen.min_rsa_bits < RSA_MODULUS_FLOOR_BITS {
            return Err(CoreError::Config(format!(
                "keygen.min_rsa_bits {} is below the floor of {}",
                keygen.min_rsa_bits, RSA_MODULUS_FLOOR_BITS
            )));
        }
        if keygen.min_rsa_bits > keygen.max_rsa_bits {
            return Err(CoreError::Config(format!(
                "keygen.min_rsa_bits {} exceeds keygen.max_rsa_bits {}",
                keygen.min_rsa_bits, keygen.max_rsa_bits
            )));
        }
        if keygen.max_rsa_bits > RSA_MODULUS_CEILING_BITS {
            return Err(CoreError::Config(format!(
                "keygen.max_rsa_bits {} is above the ceiling of {}",
                keygen.max_rsa_bits, RSA_MODULUS_CEILING_BITS
            )));
        }
        match self.fingerprint.key_id_hash {
            AlgorithmId::Rsa | AlgorithmId::Dsa => Err(CoreError::Config(format!(
                "fingerprint.key_id_hash must name a hash algorithm, got {}",
                self.fingerprint.key_id_hash
            ))),
            _ => Ok(()),
        }
    }
}
