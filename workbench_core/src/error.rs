// course_site/workbench_core/src/error.rs

use thiserror::Error;

use crate::session::{KeyField, Operation};

/// Failure reported by a [`CryptoProvider`](crate::provider::CryptoProvider).
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("key export failed: {0}")]
    Export(String),

    #[error("invalid JWK: {0}")]
    InvalidJwk(String),

    #[error("key algorithm mismatch: expected {expected}, found {found}")]
    AlgorithmMismatch { expected: String, found: String },

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error("signing failed: {0}")]
    Sign(String),
}

/// Error returned by a [`Session`](crate::session::Session) command.
///
/// Validation variants display the exact text shown to the user. Provider
/// failures display a generic message; the underlying cause only goes to the
/// operation log and to `tracing`.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error("Please enter a message")]
    EmptyMessage,

    #[error("Message must not exceed {max} characters")]
    MessageTooLong { len: usize, max: usize },

    #[error("Please generate keys first")]
    KeysMissing,

    #[error("Please provide encrypted message and signature")]
    MissingCiphertext,

    #[error("Please fill in all fields")]
    ImportFieldsMissing,

    #[error("Invalid JSON format for {field}")]
    InvalidImportJson { field: KeyField },

    #[error("Invalid key material for {field}")]
    InvalidImportKey {
        field: KeyField,
        #[source]
        source: CryptoError,
    },

    #[error("Failed to {}. See the operation log for details.", .op.verb())]
    Provider {
        op: Operation,
        #[source]
        source: CryptoError,
    },

    #[error("Failed to {}. See the operation log for details.", .op.verb())]
    Encoding { op: Operation, cause: String },
}

impl WorkbenchError {
    /// True for input problems caught before any provider call.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Provider { .. } | Self::Encoding { .. })
    }
}
