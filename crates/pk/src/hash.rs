//! One-shot hashing primitive used for key identifiers.

use cryptoplane_core::AlgorithmId;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::{PkError, PkResult};

/// Hashes `data` with the hash named by `id`.
pub fn hash_memory(id: AlgorithmId, data: &[u8]) -> PkResult<Vec<u8>> {
    let digest = match id {
        AlgorithmId::Sha1 => Sha1::digest(data).to_vec(),
        AlgorithmId::Sha224 => Sha224::digest(data).to_vec(),
        AlgorithmId::Sha256 => Sha256::digest(data).to_vec(),
        AlgorithmId::Sha384 => Sha384::digest(data).to_vec(),
        AlgorithmId::Sha512 => Sha512::digest(data).to_vec(),
        AlgorithmId::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        AlgorithmId::Rsa | AlgorithmId::Dsa => {
            return Err(PkError::InvalidArgument(format!(
                "{id} is not a hash algorithm"
            )))
        }
    };
    Ok(digest)
}
