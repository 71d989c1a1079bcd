//! Encrypt, decrypt, sign and verify over a bound key.
//!
//! A [`PkCipherContext`] borrows one initialized [`KeyItem`] for its lifetime
//! and dispatches to the provider family of that key. Operations take `&self`
//! and never touch the key, so several contexts may share one key.

use cryptoplane_core::AlgorithmId;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::algorithm::{self, AlgorithmDescriptor};
use crate::error::{PkError, PkResult};
use crate::key::{KeyItem, KeyMaterial};
use crate::provider::rsa::{EncryptionPadding, SignaturePadding};
use crate::provider::{self, ProviderError};

/// RSA padding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RsaScheme {
    #[default]
    Pkcs1V15,
    Oaep,
    Pss,
}

/// RSA operation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaCipherParams {
    pub scheme: RsaScheme,
    /// Mask and label hash; required for OAEP
    pub oaep_hash: Option<AlgorithmId>,
    /// Hash the signed digest was produced with; required for sign/verify
    pub sign_hash: Option<AlgorithmId>,
    pub pss_salt_len: usize,
}

impl RsaCipherParams {
    pub fn pkcs1v15(sign_hash: AlgorithmId) -> Self {
        Self {
            scheme: RsaScheme::Pkcs1V15,
            oaep_hash: None,
            sign_hash: Some(sign_hash),
            pss_salt_len: 0,
        }
    }

    pub fn oaep(oaep_hash: AlgorithmId) -> Self {
        Self {
            scheme: RsaScheme::Oaep,
            oaep_hash: Some(oaep_hash),
            sign_hash: None,
            pss_salt_len: 0,
        }
    }

    pub fn pss(sign_hash: AlgorithmId, salt_len: usize) -> Self {
        Self {
            scheme: RsaScheme::Pss,
            oaep_hash: None,
            sign_hash: Some(sign_hash),
            pss_salt_len: salt_len,
        }
    }
}

/// DSA operation parameters. The hash is recorded but DSA signs the digest
/// it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DsaCipherParams {
    pub sign_hash: Option<AlgorithmId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherParams {
    Rsa(RsaCipherParams),
    Dsa(DsaCipherParams),
}

impl CipherParams {
    /// Default parameters for `descriptor`: PKCS#1 v1.5 for RSA, and the
    /// descriptor's sign hash for both families.
    pub fn for_algorithm(descriptor: &AlgorithmDescriptor) -> PkResult<Self> {
        match descriptor.id {
            AlgorithmId::Rsa => Ok(CipherParams::Rsa(RsaCipherParams {
                scheme: RsaScheme::Pkcs1V15,
                oaep_hash: None,
                sign_hash: descriptor.sign_hash,
                pss_salt_len: 0,
            })),
            AlgorithmId::Dsa => Ok(CipherParams::Dsa(DsaCipherParams {
                sign_hash: descriptor.sign_hash,
            })),
            other => Err(PkError::InvalidArgument(format!(
                "{other} has no cipher operations"
            ))),
        }
    }

    pub fn algorithm(&self) -> AlgorithmId {
        match self {
            CipherParams::Rsa(_) => AlgorithmId::Rsa,
            CipherParams::Dsa(_) => AlgorithmId::Dsa,
        }
    }

    fn sign_hash(&self) -> Option<AlgorithmId> {
        match self {
            CipherParams::Rsa(params) => params.sign_hash,
            CipherParams::Dsa(params) => params.sign_hash,
        }
    }
}

/// Result of a well-formed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Valid,
    Failed,
}

impl VerifyOutcome {
    pub fn is_valid(self) -> bool {
        self == VerifyOutcome::Valid
    }

    /// Turns [`VerifyOutcome::Failed`] into [`PkError::VerificationFailed`].
    pub fn into_result(self) -> PkResult<()> {
        match self {
            VerifyOutcome::Valid => Ok(()),
            VerifyOutcome::Failed => Err(PkError::VerificationFailed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SchemeBinding {
    Rsa {
        scheme: RsaScheme,
        oaep_hash: Option<&'static AlgorithmDescriptor>,
        salt_len: usize,
    },
    Dsa,
}

struct Binding<'k> {
    descriptor: &'static AlgorithmDescriptor,
    key: &'k KeyItem,
    scheme: SchemeBinding,
    sign_hash: Option<&'static AlgorithmDescriptor>,
}

/// Operation context bound to one key.
#[derive(Default)]
pub struct PkCipherContext<'k> {
    binding: Option<Binding<'k>>,
}

impl<'k> PkCipherContext<'k> {
    /// Creates an unbound context.
    pub fn new() -> Self {
        Self { binding: None }
    }

    /// Creates a context already bound to `key`.
    pub fn bind(
        descriptor: &'static AlgorithmDescriptor,
        key: &'k KeyItem,
        params: &CipherParams,
    ) -> PkResult<Self> {
        let mut ctx = Self::new();
        ctx.init(descriptor, key, params)?;
        Ok(ctx)
    }

    /// Binds the context to `key` under `descriptor`.
    ///
    /// The key must be initialized and owned by `descriptor`, and `params`
    /// must be of the same family. A bound context must be
    /// [`deinit`](Self::deinit)ed before it can be bound again.
    pub fn init(
        &mut self,
        descriptor: &'static AlgorithmDescriptor,
        key: &'k KeyItem,
        params: &CipherParams,
    ) -> PkResult<()> {
        if self.binding.is_some() {
            return Err(PkError::InvalidArgument(
                "cipher context is already bound".to_string(),
            ));
        }
        if key.algorithm().id != descriptor.id {
            return Err(PkError::InvalidArgument(format!(
                "{} key cannot be used with {}",
                key.algorithm().name,
                descriptor.name
            )));
        }
        key.require_material()?;
        if params.algorithm() != descriptor.id {
            return Err(PkError::InvalidArgument(format!(
                "{} parameters given for {}",
                params.algorithm(),
                descriptor.name
            )));
        }

        let sign_hash = params.sign_hash().map(algorithm::hash_descriptor).transpose()?;
        let scheme = match params {
            CipherParams::Rsa(rsa) => {
                if let Some(hash) = sign_hash {
                    require_pkcs1_identifier(hash)?;
                }
                let oaep_hash = match rsa.scheme {
                    RsaScheme::Oaep => {
                        let id = rsa.oaep_hash.ok_or_else(|| {
                            PkError::InvalidArgument("OAEP requires a mask hash".to_string())
                        })?;
                        let hash = algorithm::hash_descriptor(id)?;
                        require_pkcs1_identifier(hash)?;
                        Some(hash)
                    }
                    RsaScheme::Pkcs1V15 | RsaScheme::Pss => None,
                };
                SchemeBinding::Rsa {
                    scheme: rsa.scheme,
                    oaep_hash,
                    salt_len: rsa.pss_salt_len,
                }
            }
            CipherParams::Dsa(_) => SchemeBinding::Dsa,
        };

        debug!(
            algorithm = %descriptor.name,
            scheme = ?scheme,
            sign_hash = ?sign_hash.map(|h| h.name),
            key_id = %key.key_id(),
            "cipher context bound"
        );
        self.binding = Some(Binding {
            descriptor,
            key,
            scheme,
            sign_hash,
        });
        Ok(())
    }

    /// Releases the key reference. Harmless on an unbound context.
    pub fn deinit(&mut self) {
        if let Some(binding) = self.binding.take() {
            debug!(algorithm = %binding.descriptor.name, "cipher context released");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn algorithm(&self) -> Option<&'static AlgorithmDescriptor> {
        self.binding.as_ref().map(|b| b.descriptor)
    }

    pub fn encrypt(&self, input: &[u8]) -> PkResult<Vec<u8>> {
        let (binding, material) = self.bound()?;
        match (material, binding.scheme) {
            (KeyMaterial::Rsa(state), SchemeBinding::Rsa { scheme, oaep_hash, .. }) => {
                let padding = encryption_padding(scheme, oaep_hash)?;
                debug!(len = input.len(), ?padding, "rsa encrypt");
                Ok(provider::rsa::encrypt(state, padding, input)?)
            }
            _ => Err(no_encryption(binding.descriptor)),
        }
    }

    /// Decrypts with the bound private key. A padding check failure is
    /// reported as [`PkError::DecryptionFailed`].
    pub fn decrypt(&self, input: &[u8]) -> PkResult<Zeroizing<Vec<u8>>> {
        let (binding, material) = self.bound()?;
        match (material, binding.scheme) {
            (KeyMaterial::Rsa(state), SchemeBinding::Rsa { scheme, oaep_hash, .. }) => {
                let padding = encryption_padding(scheme, oaep_hash)?;
                debug!(len = input.len(), ?padding, "rsa decrypt");
                provider::rsa::decrypt(state, padding, input).map_err(|e| match e {
                    ProviderError::InvalidPadding => {
                        warn!("rsa decryption rejected ciphertext");
                        PkError::DecryptionFailed
                    }
                    other => other.into(),
                })
            }
            _ => Err(no_encryption(binding.descriptor)),
        }
    }

    /// Signs a precomputed digest.
    pub fn sign(&self, digest: &[u8]) -> PkResult<Vec<u8>> {
        let (binding, material) = self.bound()?;
        match (material, binding.scheme) {
            (KeyMaterial::Rsa(state), SchemeBinding::Rsa { scheme, salt_len, .. }) => {
                let padding = signature_padding(scheme, binding.sign_hash, salt_len, digest)?;
                debug!(len = digest.len(), ?padding, "rsa sign");
                Ok(provider::rsa::sign(state, padding, digest)?)
            }
            (KeyMaterial::Dsa(state), SchemeBinding::Dsa) => {
                require_digest(digest)?;
                debug!(len = digest.len(), "dsa sign");
                Ok(provider::dsa::sign(state, digest)?)
            }
            _ => Err(family_mismatch(binding.descriptor)),
        }
    }

    /// Checks `signature` over `digest`.
    ///
    /// A well-formed signature that does not match yields
    /// `Ok(VerifyOutcome::Failed)`; malformed input is an error.
    pub fn verify(&self, signature: &[u8], digest: &[u8]) -> PkResult<VerifyOutcome> {
        let (binding, material) = self.bound()?;
        let result = match (material, binding.scheme) {
            (KeyMaterial::Rsa(state), SchemeBinding::Rsa { scheme, salt_len, .. }) => {
                let padding = signature_padding(scheme, binding.sign_hash, salt_len, digest)?;
                debug!(len = digest.len(), ?padding, "rsa verify");
                provider::rsa::verify(state, padding, digest, signature)
            }
            (KeyMaterial::Dsa(state), SchemeBinding::Dsa) => {
                require_digest(digest)?;
                debug!(len = digest.len(), "dsa verify");
                provider::dsa::verify(state, digest, signature)
            }
            _ => return Err(family_mismatch(binding.descriptor)),
        };
        match result {
            Ok(()) => Ok(VerifyOutcome::Valid),
            Err(ProviderError::BadSignature) => {
                debug!(algorithm = %binding.descriptor.name, "signature did not verify");
                Ok(VerifyOutcome::Failed)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn bound(&self) -> PkResult<(&Binding<'k>, &'k KeyMaterial)> {
        let binding = self.binding.as_ref().ok_or_else(|| {
            PkError::InvalidArgument("cipher context is not initialized".to_string())
        })?;
        let material = binding.key.require_material()?;
        Ok((binding, material))
    }
}

fn require_pkcs1_identifier(hash: &AlgorithmDescriptor) -> PkResult<()> {
    if !hash.pkcs1_identifier {
        return Err(PkError::InvalidArgument(format!(
            "{} cannot be used with RSA padding",
            hash.name
        )));
    }
    Ok(())
}

fn require_digest(digest: &[u8]) -> PkResult<()> {
    if digest.is_empty() {
        return Err(PkError::InvalidArgument("empty digest".to_string()));
    }
    Ok(())
}

fn encryption_padding(
    scheme: RsaScheme,
    oaep_hash: Option<&'static AlgorithmDescriptor>,
) -> PkResult<EncryptionPadding> {
    match (scheme, oaep_hash) {
        (RsaScheme::Pkcs1V15, _) => Ok(EncryptionPadding::Pkcs1V15),
        (RsaScheme::Oaep, Some(hash)) => Ok(EncryptionPadding::Oaep(hash.id)),
        (RsaScheme::Oaep, None) => Err(PkError::InvalidArgument(
            "OAEP requires a mask hash".to_string(),
        )),
        (RsaScheme::Pss, _) => Err(PkError::InvalidArgument(
            "PSS is a signature scheme".to_string(),
        )),
    }
}

fn signature_padding(
    scheme: RsaScheme,
    sign_hash: Option<&'static AlgorithmDescriptor>,
    salt_len: usize,
    digest: &[u8],
) -> PkResult<SignaturePadding> {
    let hash = sign_hash.ok_or_else(|| {
        PkError::InvalidArgument("RSA signatures require a sign hash".to_string())
    })?;
    if digest.len() != hash.digest_size {
        return Err(PkError::InvalidArgument(format!(
            "digest of {} bytes does not match {} ({} bytes)",
            digest.len(),
            hash.name,
            hash.digest_size
        )));
    }
    match scheme {
        RsaScheme::Pkcs1V15 => Ok(SignaturePadding::Pkcs1V15(hash.id)),
        RsaScheme::Pss => Ok(SignaturePadding::Pss {
            hash: hash.id,
            salt_len,
        }),
        RsaScheme::Oaep => Err(PkError::InvalidArgument(
            "OAEP is an encryption scheme".to_string(),
        )),
    }
}

fn no_encryption(descriptor: &AlgorithmDescriptor) -> PkError {
    PkError::InvalidArgument(format!("{} does not support encryption", descriptor.name))
}

fn family_mismatch(descriptor: &AlgorithmDescriptor) -> PkError {
    PkError::InvalidArgument(format!(
        "key material does not match {}",
        descriptor.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_memory;
    use crate::key::KeyType;
    use crate::provider::rsa::RsaKeyState;
    use std::sync::OnceLock;

    fn rsa_key() -> &'static KeyItem {
        static KEY: OnceLock<KeyItem> = OnceLock::new();
        KEY.get_or_init(|| {
            let mut item = KeyItem::for_algorithm(AlgorithmId::Rsa).unwrap();
            let key = provider::rsa::make_key(64, 65537).unwrap();
            item.install(KeyMaterial::Rsa(RsaKeyState::Private(key)))
                .unwrap();
            item
        })
    }

    fn rsa() -> &'static AlgorithmDescriptor {
        algorithm::lookup(AlgorithmId::Rsa).unwrap()
    }

    #[test]
    fn test_unbound_context_rejects_operations() {
        let ctx = PkCipherContext::new();
        assert!(!ctx.is_bound());
        assert!(matches!(ctx.encrypt(b"x"), Err(PkError::InvalidArgument(_))));
        assert!(matches!(ctx.sign(&[0u8; 20]), Err(PkError::InvalidArgument(_))));
    }

    #[test]
    fn test_default_params_sign_and_verify() {
        let key = rsa_key();
        let params = CipherParams::for_algorithm(rsa()).unwrap();
        let ctx = PkCipherContext::bind(rsa(), key, &params).unwrap();
        let digest = hash_memory(AlgorithmId::Sha1, b"hello").unwrap();

        let signature = ctx.sign(&digest).unwrap();
        assert_eq!(ctx.verify(&signature, &digest).unwrap(), VerifyOutcome::Valid);

        let mut tampered = digest.clone();
        tampered[0] ^= 0x80;
        let outcome = ctx.verify(&signature, &tampered).unwrap();
        assert_eq!(outcome, VerifyOutcome::Failed);
        assert_eq!(outcome.into_result(), Err(PkError::VerificationFailed));
    }

    #[test]
    fn test_digest_width_must_match_sign_hash() {
        let key = rsa_key();
        let params = CipherParams::Rsa(RsaCipherParams::pkcs1v15(AlgorithmId::Sha256));
        let ctx = PkCipherContext::bind(rsa(), key, &params).unwrap();
        assert!(matches!(ctx.sign(&[0u8; 20]), Err(PkError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_sign_hash_is_rejected_at_sign() {
        let key = rsa_key();
        let params = CipherParams::Rsa(RsaCipherParams::oaep(AlgorithmId::Sha1));
        let ctx = PkCipherContext::bind(rsa(), key, &params).unwrap();
        assert!(matches!(ctx.sign(&[0u8; 20]), Err(PkError::InvalidArgument(_))));
    }

    #[test]
    fn test_oaep_round_trip_and_corruption() {
        let key = rsa_key();
        let params = CipherParams::Rsa(RsaCipherParams::oaep(AlgorithmId::Sha1));
        let ctx = PkCipherContext::bind(rsa(), key, &params).unwrap();
        let mut ciphertext = ctx.encrypt(b"wrapped").unwrap();
        assert_eq!(ctx.decrypt(&ciphertext).unwrap().as_slice(), b"wrapped");

        ciphertext[5] ^= 0x01;
        assert!(matches!(
            ctx.decrypt(&ciphertext),
            Err(PkError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_wrong_length_input_is_an_operation_error() {
        let key = rsa_key();
        let params = CipherParams::for_algorithm(rsa()).unwrap();
        let ctx = PkCipherContext::bind(rsa(), key, &params).unwrap();
        let digest = hash_memory(AlgorithmId::Sha1, b"hello").unwrap();

        assert!(matches!(
            ctx.verify(&[0x01, 0x02, 0x03], &digest),
            Err(PkError::OperationFailed(_))
        ));
        assert!(matches!(
            ctx.decrypt(&[0x01, 0x02, 0x03]),
            Err(PkError::OperationFailed(_))
        ));
    }

    #[test]
    fn test_init_checks() {
        let key = rsa_key();
        let dsa = algorithm::lookup(AlgorithmId::Dsa).unwrap();
        let rsa_params = CipherParams::for_algorithm(rsa()).unwrap();
        let dsa_params = CipherParams::for_algorithm(dsa).unwrap();

        assert!(PkCipherContext::bind(dsa, key, &dsa_params).is_err());
        assert!(PkCipherContext::bind(rsa(), key, &dsa_params).is_err());

        let empty = KeyItem::for_algorithm(AlgorithmId::Rsa).unwrap();
        assert!(PkCipherContext::bind(rsa(), &empty, &rsa_params).is_err());

        let no_mask = CipherParams::Rsa(RsaCipherParams {
            scheme: RsaScheme::Oaep,
            oaep_hash: None,
            sign_hash: None,
            pss_salt_len: 0,
        });
        assert!(PkCipherContext::bind(rsa(), key, &no_mask).is_err());

        let blake = CipherParams::Rsa(RsaCipherParams::pkcs1v15(AlgorithmId::Blake3));
        assert!(PkCipherContext::bind(rsa(), key, &blake).is_err());

        let not_a_hash = CipherParams::Rsa(RsaCipherParams::pkcs1v15(AlgorithmId::Dsa));
        assert!(PkCipherContext::bind(rsa(), key, &not_a_hash).is_err());
    }

    #[test]
    fn test_rebind_requires_deinit() {
        let key = rsa_key();
        let params = CipherParams::for_algorithm(rsa()).unwrap();
        let mut ctx = PkCipherContext::bind(rsa(), key, &params).unwrap();
        assert!(ctx.init(rsa(), key, &params).is_err());

        ctx.deinit();
        ctx.deinit();
        assert!(!ctx.is_bound());
        ctx.init(rsa(), key, &params).unwrap();
        assert_eq!(ctx.algorithm().map(|d| d.id), Some(AlgorithmId::Rsa));
    }

    #[test]
    fn test_pss_is_not_an_encryption_scheme() {
        let key = rsa_key();
        let params = CipherParams::Rsa(RsaCipherParams::pss(AlgorithmId::Sha1, 20));
        let ctx = PkCipherContext::bind(rsa(), key, &params).unwrap();
        assert!(matches!(ctx.encrypt(b"x"), Err(PkError::InvalidArgument(_))));
        assert_eq!(key.key_type(), Some(KeyType::Private));
    }
}
