//! Key pack/unpack.
//!
//! The packed form is the provider's native DER encoding of whichever half
//! the item holds; nothing is prepended.

use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{PkError, PkResult};
use crate::fingerprint::export_bounded;
use crate::key::KeyItem;
use crate::provider;

/// Size of the buffer a [`pack`] of `key` needs.
pub fn packed_len(key: &KeyItem) -> PkResult<usize> {
    let material = key.require_material()?;
    Ok(export_bounded(material, material.key_type())?.len())
}

/// Writes the native encoding of `key` into `buf` and returns the number of
/// bytes written.
///
/// A short buffer fails with [`PkError::OutOfSpace`] carrying the exact size
/// required; `buf` is left untouched in that case.
pub fn pack(key: &KeyItem, buf: &mut [u8]) -> PkResult<usize> {
    let material = key.require_material()?;
    let encoded = export_bounded(material, material.key_type())?;
    if buf.len() < encoded.len() {
        return Err(PkError::OutOfSpace {
            required: encoded.len(),
        });
    }
    buf[..encoded.len()].copy_from_slice(&encoded);
    Ok(encoded.len())
}

/// Packs `key` into an exactly-sized, zeroizing buffer.
pub fn pack_to_vec(key: &KeyItem) -> PkResult<Zeroizing<Vec<u8>>> {
    let material = key.require_material()?;
    export_bounded(material, material.key_type())
}

/// Imports `bytes` into the uninitialized `key`, trying the private encoding
/// first and the public encoding second.
pub fn unpack(key: &mut KeyItem, bytes: &[u8]) -> PkResult<()> {
    key.ensure_uninitialized()?;
    if bytes.is_empty() {
        return Err(PkError::InvalidArgument("no key data to unpack".to_string()));
    }
    let material = provider::import(key.algorithm().id, bytes)?;
    debug!(
        algorithm = %key.algorithm().name,
        key_type = ?material.key_type(),
        len = bytes.len(),
        "unpacked key"
    );
    key.install(material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyMaterial, KeyType};
    use crate::provider::rsa::RsaKeyState;
    use cryptoplane_core::AlgorithmId;

    fn rsa_private() -> KeyItem {
        let mut item = KeyItem::for_algorithm(AlgorithmId::Rsa).unwrap();
        let key = provider::rsa::make_key(64, 65537).unwrap();
        item.install(KeyMaterial::Rsa(RsaKeyState::Private(key)))
            .unwrap();
        item
    }

    #[test]
    fn test_out_of_space_reports_required_and_retry_succeeds() {
        let key = rsa_private();
        let mut small = [0u8; 8];
        let required = match pack(&key, &mut small) {
            Err(PkError::OutOfSpace { required }) => required,
            other => panic!("expected OutOfSpace, got {other:?}"),
        };
        assert_eq!(small, [0u8; 8]);
        assert_eq!(required, packed_len(&key).unwrap());

        let mut buf = vec![0u8; required];
        assert_eq!(pack(&key, &mut buf).unwrap(), required);
        assert_eq!(buf.as_slice(), pack_to_vec(&key).unwrap().as_slice());
    }

    #[test]
    fn test_unpack_restores_private_key() {
        let key = rsa_private();
        let packed = pack_to_vec(&key).unwrap();
        let mut restored = KeyItem::for_algorithm(AlgorithmId::Rsa).unwrap();
        unpack(&mut restored, &packed).unwrap();
        assert_eq!(restored.key_type(), Some(KeyType::Private));
        assert_eq!(pack_to_vec(&restored).unwrap().as_slice(), packed.as_slice());
    }

    #[test]
    fn test_unpack_rejects_empty_and_garbage() {
        let mut item = KeyItem::for_algorithm(AlgorithmId::Rsa).unwrap();
        assert!(matches!(
            unpack(&mut item, &[]),
            Err(PkError::InvalidArgument(_))
        ));
        assert!(matches!(
            unpack(&mut item, b"definitely not der"),
            Err(PkError::OperationFailed(_))
        ));
        assert!(!item.is_initialized());
    }

    #[test]
    fn test_unpack_into_initialized_item_is_rejected() {
        let mut key = rsa_private();
        let packed = pack_to_vec(&key).unwrap();
        assert!(matches!(
            unpack(&mut key, &packed),
            Err(PkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_pack_uninitialized_is_rejected() {
        let item = KeyItem::for_algorithm(AlgorithmId::Dsa).unwrap();
        assert!(matches!(
            pack(&item, &mut [0u8; 64]),
            Err(PkError::InvalidArgument(_))
        ));
    }
}
