//! Public-key derivation and key identifiers.
//!
//! The public half of a fresh key pair is rebuilt from the exported public
//! encoding rather than cloned from the private object, so it never carries
//! private state. The same encoding is hashed into the key id.

use cryptoplane_core::AlgorithmId;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::algorithm;
use crate::error::{PkError, PkResult};
use crate::hash;
use crate::key::{KeyId, KeyItem, KeyMaterial, KeyType};
use crate::provider;

/// Upper bound on an exported key encoding.
pub const KEY_DATA_MAX_SIZE: usize = 16 * 1024;

/// Exports one half of `material` into a bounded, zeroizing scratch buffer.
pub(crate) fn export_bounded(
    material: &KeyMaterial,
    which: KeyType,
) -> PkResult<Zeroizing<Vec<u8>>> {
    let encoded = provider::export(material, which)?;
    if encoded.len() > KEY_DATA_MAX_SIZE {
        return Err(PkError::OutOfSpace {
            required: encoded.len(),
        });
    }
    let mut scratch = Zeroizing::new(Vec::new());
    scratch
        .try_reserve_exact(encoded.len())
        .map_err(|_| PkError::OutOfMemory)?;
    scratch.extend_from_slice(&encoded);
    Ok(scratch)
}

fn key_id_for(encoding: &[u8], id_hash: AlgorithmId) -> PkResult<KeyId> {
    let descriptor = algorithm::hash_descriptor(id_hash)?;
    let digest = hash::hash_memory(descriptor.id, encoding)?;
    KeyId::from_digest(&digest)
}

/// Computes the key id of any initialized key from its public encoding.
pub fn fingerprint(key: &KeyItem, id_hash: AlgorithmId) -> PkResult<KeyId> {
    let material = key.require_material()?;
    let scratch = export_bounded(material, KeyType::Public)?;
    key_id_for(&scratch, id_hash)
}

/// Builds `public` from the public half of `private` and assigns both the
/// same key id.
///
/// `private` must hold a private key; `public` must be an uninitialized item
/// of the same algorithm. Neither item is modified unless every step
/// succeeds.
pub fn derive_public(
    private: &mut KeyItem,
    public: &mut KeyItem,
    id_hash: AlgorithmId,
) -> PkResult<()> {
    if private.algorithm().id != public.algorithm().id {
        return Err(PkError::InvalidArgument(format!(
            "cannot derive a {} public key from a {} private key",
            public.algorithm().name,
            private.algorithm().name
        )));
    }
    public.ensure_uninitialized()?;

    let material = private.require_material()?;
    if material.key_type() != KeyType::Private {
        return Err(PkError::InvalidArgument(
            "public derivation requires a private key".to_string(),
        ));
    }

    let scratch = export_bounded(material, KeyType::Public)?;
    let public_material =
        provider::import(private.algorithm().id, &scratch).map_err(|e| {
            warn!(error = %e, "re-import of exported public key failed");
            PkError::from(e)
        })?;
    if public_material.key_type() != KeyType::Public {
        return Err(PkError::OperationFailed(
            "exported public encoding imported as a private key".to_string(),
        ));
    }
    let key_id = key_id_for(&scratch, id_hash)?;
    drop(scratch);

    public.install(public_material)?;
    public.set_key_id(key_id);
    private.set_key_id(key_id);
    debug!(
        algorithm = %private.algorithm().name,
        key_id = %key_id,
        "derived public key"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::dsa::DsaKeyState;
    use crate::provider::rsa::RsaKeyState;

    fn rsa_private() -> KeyItem {
        let mut item = KeyItem::for_algorithm(AlgorithmId::Rsa).unwrap();
        let key = provider::rsa::make_key(64, 65537).unwrap();
        item.install(KeyMaterial::Rsa(RsaKeyState::Private(key)))
            .unwrap();
        item
    }

    #[test]
    fn test_derive_assigns_identical_key_ids() {
        let mut private = rsa_private();
        let mut public = KeyItem::for_algorithm(AlgorithmId::Rsa).unwrap();
        derive_public(&mut private, &mut public, AlgorithmId::Sha1).unwrap();

        assert_eq!(public.key_type(), Some(KeyType::Public));
        assert_eq!(private.key_id(), public.key_id());
        assert_eq!(private.key_id().len(), 20);
        assert_eq!(
            fingerprint(&public, AlgorithmId::Sha1).unwrap(),
            *public.key_id()
        );
    }

    #[test]
    fn test_key_id_hash_is_configurable() {
        let mut private = rsa_private();
        let mut public = KeyItem::for_algorithm(AlgorithmId::Rsa).unwrap();
        derive_public(&mut private, &mut public, AlgorithmId::Blake3).unwrap();
        assert_eq!(public.key_id().len(), 32);
    }

    #[test]
    fn test_non_hash_id_leaves_items_untouched() {
        let mut private = rsa_private();
        let mut public = KeyItem::for_algorithm(AlgorithmId::Rsa).unwrap();
        let result = derive_public(&mut private, &mut public, AlgorithmId::Dsa);
        assert!(matches!(result, Err(PkError::InvalidArgument(_))));
        assert!(!public.is_initialized());
        assert!(private.key_id().is_empty());
    }

    #[test]
    fn test_family_mismatch_is_rejected() {
        let mut private = rsa_private();
        let mut public = KeyItem::for_algorithm(AlgorithmId::Dsa).unwrap();
        assert!(derive_public(&mut private, &mut public, AlgorithmId::Sha1).is_err());
    }

    #[test]
    fn test_public_source_is_rejected() {
        let key = provider::dsa::make_key(20, 128).unwrap();
        let mut source = KeyItem::for_algorithm(AlgorithmId::Dsa).unwrap();
        source
            .install(KeyMaterial::Dsa(DsaKeyState::Public(
                key.verifying_key().clone(),
            )))
            .unwrap();
        let mut public = KeyItem::for_algorithm(AlgorithmId::Dsa).unwrap();
        assert!(matches!(
            derive_public(&mut source, &mut public, AlgorithmId::Sha1),
            Err(PkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_fingerprint_requires_material() {
        let item = KeyItem::for_algorithm(AlgorithmId::Rsa).unwrap();
        assert!(fingerprint(&item, AlgorithmId::Sha1).is_err());
    }
}
