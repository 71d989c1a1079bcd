//! Key items and their material.

use std::fmt;

use cryptoplane_core::AlgorithmId;

use crate::algorithm::{self, AlgorithmDescriptor};
use crate::error::{PkError, PkResult};
use crate::provider::dsa::DsaKeyState;
use crate::provider::rsa::RsaKeyState;

/// Largest key identifier a [`KeyItem`] can hold, in bytes.
pub const MAX_KEY_ID_SIZE: usize = 64;

/// Which half of a key pair an item holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Private,
    Public,
}

/// Provider key object, tagged by family.
#[derive(Clone)]
pub enum KeyMaterial {
    Rsa(RsaKeyState),
    Dsa(DsaKeyState),
}

impl KeyMaterial {
    pub fn algorithm(&self) -> AlgorithmId {
        match self {
            KeyMaterial::Rsa(_) => AlgorithmId::Rsa,
            KeyMaterial::Dsa(_) => AlgorithmId::Dsa,
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            KeyMaterial::Rsa(state) => state.key_type(),
            KeyMaterial::Dsa(state) => state.key_type(),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &self.algorithm())
            .field("key_type", &self.key_type())
            .finish_non_exhaustive()
    }
}

/// Digest of a public key's native encoding.
#[derive(Clone, Copy)]
pub struct KeyId {
    bytes: [u8; MAX_KEY_ID_SIZE],
    len: usize,
}

impl KeyId {
    pub const fn empty() -> Self {
        Self {
            bytes: [0u8; MAX_KEY_ID_SIZE],
            len: 0,
        }
    }

    /// Builds an identifier from a hash output.
    pub fn from_digest(digest: &[u8]) -> PkResult<Self> {
        if digest.len() > MAX_KEY_ID_SIZE {
            return Err(PkError::InvalidArgument(format!(
                "key id of {} bytes exceeds {MAX_KEY_ID_SIZE}",
                digest.len()
            )));
        }
        let mut id = Self::empty();
        id.bytes[..digest.len()].copy_from_slice(digest);
        id.len = digest.len();
        Ok(id)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl Default for KeyId {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for KeyId {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for KeyId {}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.to_hex())
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A public-key object of one algorithm family.
///
/// The descriptor is fixed at construction. The item is initialized once it
/// holds material; [`KeyItem::clear`] releases the material and leaves the
/// item inert.
pub struct KeyItem {
    descriptor: &'static AlgorithmDescriptor,
    material: Option<KeyMaterial>,
    key_id: KeyId,
}

impl KeyItem {
    /// Creates an uninitialized item owned by `descriptor`.
    pub fn new(descriptor: &'static AlgorithmDescriptor) -> PkResult<Self> {
        if !descriptor.is_public_key() {
            return Err(PkError::InvalidArgument(format!(
                "{} cannot own key material",
                descriptor.name
            )));
        }
        Ok(Self {
            descriptor,
            material: None,
            key_id: KeyId::empty(),
        })
    }

    pub fn for_algorithm(id: AlgorithmId) -> PkResult<Self> {
        Self::new(algorithm::public_key_descriptor(id)?)
    }

    pub fn algorithm(&self) -> &'static AlgorithmDescriptor {
        self.descriptor
    }

    pub fn is_initialized(&self) -> bool {
        self.material.is_some()
    }

    /// Private or public, once initialized.
    pub fn key_type(&self) -> Option<KeyType> {
        self.material.as_ref().map(KeyMaterial::key_type)
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    /// Releases the material and the key id. Safe on an uninitialized item.
    pub fn clear(&mut self) {
        self.material = None;
        self.key_id = KeyId::empty();
    }

    pub(crate) fn require_material(&self) -> PkResult<&KeyMaterial> {
        self.material.as_ref().ok_or_else(|| {
            PkError::InvalidArgument(format!("{} key item is not initialized", self.descriptor.name))
        })
    }

    pub(crate) fn ensure_uninitialized(&self) -> PkResult<()> {
        if self.is_initialized() {
            return Err(PkError::InvalidArgument(format!(
                "{} key item is already initialized",
                self.descriptor.name
            )));
        }
        Ok(())
    }

    /// Installs material into an uninitialized item.
    pub(crate) fn install(&mut self, material: KeyMaterial) -> PkResult<()> {
        self.ensure_uninitialized()?;
        debug_assert_eq!(
            material.algorithm(),
            self.descriptor.id,
            "material family must match the owning descriptor"
        );
        if material.algorithm() != self.descriptor.id {
            return Err(PkError::InvalidArgument(format!(
                "{} material cannot be installed into a {} key item",
                material.algorithm(),
                self.descriptor.name
            )));
        }
        self.material = Some(material);
        Ok(())
    }

    pub(crate) fn set_key_id(&mut self, key_id: KeyId) {
        self.key_id = key_id;
    }
}

impl fmt::Debug for KeyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyItem")
            .field("algorithm", &self.descriptor.name)
            .field("key_type", &self.key_type())
            .field("key_id", &self.key_id)
            .finish()
    }
}
