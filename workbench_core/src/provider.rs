// course_site/workbench_core/src/provider.rs

use std::fmt;

use crate::config::KeySpec;
use crate::error::CryptoError;

/// The two RSA schemes a session works with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// RSA-OAEP with SHA-256, for encrypt/decrypt.
    RsaOaep,
    /// RSA-PSS with SHA-256, for sign/verify.
    RsaPss,
}

impl KeyAlgorithm {
    /// Value of the JWK `alg` member for this scheme.
    pub fn jwk_alg(self) -> &'static str {
        match self {
            Self::RsaOaep => "RSA-OAEP-256",
            Self::RsaPss => "PS256",
        }
    }

    /// JWK `key_ops` for the public and private half.
    pub fn key_ops(self, private: bool) -> &'static [&'static str] {
        match (self, private) {
            (Self::RsaOaep, false) => &["encrypt"],
            (Self::RsaOaep, true) => &["decrypt"],
            (Self::RsaPss, false) => &["verify"],
            (Self::RsaPss, true) => &["sign"],
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RsaOaep => "RSA-OAEP",
            Self::RsaPss => "RSA-PSS",
        })
    }
}

/// Asymmetric primitives a [`Session`](crate::session::Session) orchestrates.
///
/// Key handles are provider-native; the session only ever stores the
/// textual export and re-imports it for each operation.
pub trait CryptoProvider {
    type PublicKey;
    type PrivateKey;

    fn generate_key_pair(
        &self,
        algorithm: KeyAlgorithm,
        spec: &KeySpec,
    ) -> Result<(Self::PublicKey, Self::PrivateKey), CryptoError>;

    fn export_public_key(
        &self,
        key: &Self::PublicKey,
        algorithm: KeyAlgorithm,
    ) -> Result<String, CryptoError>;

    fn export_private_key(
        &self,
        key: &Self::PrivateKey,
        algorithm: KeyAlgorithm,
    ) -> Result<String, CryptoError>;

    fn import_public_key(
        &self,
        text: &str,
        algorithm: KeyAlgorithm,
    ) -> Result<Self::PublicKey, CryptoError>;

    fn import_private_key(
        &self,
        text: &str,
        algorithm: KeyAlgorithm,
    ) -> Result<Self::PrivateKey, CryptoError>;

    fn encrypt_oaep(&self, key: &Self::PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn decrypt_oaep(&self, key: &Self::PrivateKey, ciphertext: &[u8])
        -> Result<Vec<u8>, CryptoError>;

    fn sign_pss(
        &self,
        key: &Self::PrivateKey,
        salt_len: usize,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Returns `Ok(false)` for a signature that does not verify; `Err` is
    /// reserved for the provider itself failing.
    fn verify_pss(
        &self,
        key: &Self::PublicKey,
        salt_len: usize,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool, CryptoError>;
}
