//! Engine error type and the provider-status mapping.

use thiserror::Error;

use crate::provider::ProviderError;

/// Errors surfaced by the public-key engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PkError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("output buffer too small: {required} bytes required")]
    OutOfSpace { required: usize },

    #[error("out of memory")]
    OutOfMemory,

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("key generation submission failed: {0}")]
    SubmissionFailed(String),
}

pub type PkResult<T> = Result<T, PkError>;

/// Normalizes a provider status.
///
/// Statuses without a dedicated mapping, including anything the provider
/// reports as [`ProviderError::Other`], become [`PkError::InvalidArgument`].
/// Decrypt and verify call sites intercept `InvalidPadding` and
/// `BadSignature` before reaching this conversion.
impl From<ProviderError> for PkError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::BufferTooSmall { required } => PkError::OutOfSpace { required },
            ProviderError::OutOfMemory => PkError::OutOfMemory,
            ProviderError::Encoding(_)
            | ProviderError::Arithmetic(_)
            | ProviderError::InvalidInput(_) => PkError::OperationFailed(err.to_string()),
            ProviderError::InvalidParameters(_)
            | ProviderError::InvalidKey(_)
            | ProviderError::InvalidPadding
            | ProviderError::BadSignature
            | ProviderError::Other(_) => PkError::InvalidArgument(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_too_small_keeps_required_size() {
        let err: PkError = ProviderError::BufferTooSmall { required: 270 }.into();
        assert_eq!(err, PkError::OutOfSpace { required: 270 });
    }

    #[test]
    fn test_out_of_memory() {
        assert_eq!(PkError::from(ProviderError::OutOfMemory), PkError::OutOfMemory);
    }

    #[test]
    fn test_malformed_input_is_operation_failed() {
        for status in [
            ProviderError::Encoding("der".into()),
            ProviderError::Arithmetic("modexp".into()),
            ProviderError::InvalidInput("too long".into()),
        ] {
            assert!(matches!(
                PkError::from(status),
                PkError::OperationFailed(_)
            ));
        }
    }

    #[test]
    fn test_unclassified_status_defaults_to_invalid_argument() {
        let err = PkError::from(ProviderError::Other("status 0x7f".into()));
        assert!(matches!(err, PkError::InvalidArgument(ref m) if m.contains("0x7f")));
    }

    #[test]
    fn test_parameter_and_key_faults_are_invalid_argument() {
        assert!(matches!(
            PkError::from(ProviderError::InvalidParameters("bits".into())),
            PkError::InvalidArgument(_)
        ));
        assert!(matches!(
            PkError::from(ProviderError::InvalidKey("public".into())),
            PkError::InvalidArgument(_)
        ));
    }
}
