//! Core functionality shared by the Cryptoplane public-key service.
//!
//! This crate provides the algorithm identifiers, engine configuration,
//! error types and logging setup used across the workspace.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{
    EngineConfig, FingerprintConfig, KeygenConfig, RSA_MODULUS_CEILING_BITS, RSA_MODULUS_FLOOR_BITS,
};
pub use error::{CoreError, CoreResult};
pub use types::AlgorithmId;
