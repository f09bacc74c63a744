// course_site/workbench_core/src/session.rs

//! Encrypt-then-sign workbench session.
//!
//! A [`Session`] owns every piece of workbench state and exposes a fixed set
//! of commands. Ciphertext is produced with RSA-OAEP under the encryption key
//! pair and then signed with RSA-PSS under the separate signing key pair, so
//! the signature authenticates the ciphertext. Verification always runs
//! before decryption and a failed verification never reaches the decryptor.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::WorkbenchConfig;
use crate::error::{CryptoError, WorkbenchError};
use crate::oplog::{OperationLog, Severity};
use crate::provider::{CryptoProvider, KeyAlgorithm};

const PREVIEW_CHARS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Initialization,
    KeyGeneration,
    EncryptAndSign,
    VerifyAndDecrypt,
    KeyImport,
}

impl Operation {
    /// Label used in operation log entries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Initialization => "Initialization",
            Self::KeyGeneration => "Key Generation",
            Self::EncryptAndSign => "Encrypt and Sign",
            Self::VerifyAndDecrypt => "Verify and Decrypt",
            Self::KeyImport => "Key Import",
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Self::Initialization => "initialize",
            Self::KeyGeneration => "generate keys",
            Self::EncryptAndSign => "encrypt and sign",
            Self::VerifyAndDecrypt => "verify and decrypt",
            Self::KeyImport => "import keys",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the four key documents a session holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    EncryptionPublic,
    EncryptionPrivate,
    SigningPublic,
    SigningPrivate,
}

impl KeyField {
    pub const ALL: [KeyField; 4] = [
        Self::EncryptionPublic,
        Self::EncryptionPrivate,
        Self::SigningPublic,
        Self::SigningPrivate,
    ];

    pub fn algorithm(self) -> KeyAlgorithm {
        match self {
            Self::EncryptionPublic | Self::EncryptionPrivate => KeyAlgorithm::RsaOaep,
            Self::SigningPublic | Self::SigningPrivate => KeyAlgorithm::RsaPss,
        }
    }

    pub fn is_private(self) -> bool {
        matches!(self, Self::EncryptionPrivate | Self::SigningPrivate)
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EncryptionPublic => "encryption public key",
            Self::EncryptionPrivate => "encryption private key",
            Self::SigningPublic => "signing public key",
            Self::SigningPrivate => "signing private key",
        })
    }
}

/// Exported key material (JWK text) for one algorithm.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

/// Key documents staged while the user composes an import.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingImport {
    pub encryption_public: Option<String>,
    pub encryption_private: Option<String>,
    pub signing_public: Option<String>,
    pub signing_private: Option<String>,
}

impl PendingImport {
    pub fn get(&self, field: KeyField) -> Option<&str> {
        match field {
            KeyField::EncryptionPublic => self.encryption_public.as_deref(),
            KeyField::EncryptionPrivate => self.encryption_private.as_deref(),
            KeyField::SigningPublic => self.signing_public.as_deref(),
            KeyField::SigningPrivate => self.signing_private.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: KeyField) -> &mut Option<String> {
        match field {
            KeyField::EncryptionPublic => &mut self.encryption_public,
            KeyField::EncryptionPrivate => &mut self.encryption_private,
            KeyField::SigningPublic => &mut self.signing_public,
            KeyField::SigningPrivate => &mut self.signing_private,
        }
    }

    pub fn is_complete(&self) -> bool {
        KeyField::ALL
            .iter()
            .all(|f| self.get(*f).is_some_and(|text| !text.is_empty()))
    }
}

/// All four key documents supplied at once. Missing members read as empty
/// and are reported by the import itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMaterial {
    pub encryption_public: String,
    pub encryption_private: String,
    pub signing_public: String,
    pub signing_private: String,
}

impl From<KeyMaterial> for PendingImport {
    fn from(material: KeyMaterial) -> Self {
        let keep = |text: String| (!text.is_empty()).then_some(text);
        Self {
            encryption_public: keep(material.encryption_public),
            encryption_private: keep(material.encryption_private),
            signing_public: keep(material.signing_public),
            signing_private: keep(material.signing_private),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub encryption_keys: Option<KeyPair>,
    pub signing_keys: Option<KeyPair>,
    pub message: String,
    pub encrypted_message: Option<String>,
    pub signature: Option<String>,
    pub decrypted_message: Option<String>,
    /// `None` until a verification has run.
    pub verification: Option<bool>,
    pub error: Option<String>,
    pub key_import_error: Option<String>,
    pub pending_import: PendingImport,
    pub log: OperationLog,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Signature verified; carries the decrypted message.
    Verified(String),
    /// Signature did not verify; nothing was decrypted.
    Rejected,
}

#[derive(Clone, Copy)]
enum Source {
    Manual,
    Generated,
}

impl Source {
    fn describe(self) -> &'static str {
        match self {
            Self::Manual => "manually entered",
            Self::Generated => "generated",
        }
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

fn decode_base64(op: Operation, what: &str, text: &str) -> Result<Vec<u8>, WorkbenchError> {
    let compact: String = text.split_whitespace().collect();
    STANDARD
        .decode(compact)
        .map_err(|e| WorkbenchError::Encoding {
            op,
            cause: format!("{what} is not valid base64: {e}"),
        })
}

fn provider_failure(op: Operation) -> impl Fn(CryptoError) -> WorkbenchError {
    move |source| WorkbenchError::Provider { op, source }
}

/// Workbench session controller.
pub struct Session<P: CryptoProvider> {
    provider: P,
    config: WorkbenchConfig,
    state: SessionState,
}

impl<P: CryptoProvider> Session<P> {
    pub fn new(provider: P, config: WorkbenchConfig) -> Self {
        let mut session = Self {
            provider,
            config,
            state: SessionState::default(),
        };
        session.reset();
        session
    }

    /// Clears every field, including the log, and records the
    /// initialization.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
        self.log(
            Operation::Initialization,
            "Application initialized",
            Severity::Info,
        );
        info!("workbench session initialized");
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn log_entries(&self) -> &OperationLog {
        &self.state.log
    }

    pub fn has_keys(&self) -> bool {
        self.state.encryption_keys.is_some() && self.state.signing_keys.is_some()
    }

    pub fn clear_log(&mut self) {
        self.state.log.clear();
        debug!("operation log cleared");
    }

    fn log(&mut self, op: Operation, details: impl Into<String>, severity: Severity) {
        self.state.log.push(op.label(), details, severity);
    }

    /// Input rejected before any provider call.
    fn reject(&mut self, op: Operation, err: WorkbenchError, detail: &str) -> WorkbenchError {
        warn!(operation = op.label(), "{detail}");
        if op == Operation::KeyImport {
            self.state.key_import_error = Some(err.to_string());
        } else {
            self.state.error = Some(err.to_string());
        }
        self.log(op, format!("Error: {detail}"), Severity::Error);
        err
    }

    /// Provider or decoding failure: generic message to the user, full cause
    /// to the log.
    fn fail(&mut self, op: Operation, err: WorkbenchError) -> WorkbenchError {
        let cause = match &err {
            WorkbenchError::Provider { source, .. } => source.to_string(),
            WorkbenchError::Encoding { cause, .. } => cause.clone(),
            other => other.to_string(),
        };
        error!(operation = op.label(), %cause, "workbench operation failed");
        self.state.error = Some(err.to_string());
        self.log(op, format!("Error: {cause}"), Severity::Error);
        err
    }

    /// Generates fresh OAEP and PSS key pairs and exports them as JWK text.
    ///
    /// Both pairs are replaced together; on any failure neither changes.
    pub fn generate_key_pairs(&mut self) -> Result<(), WorkbenchError> {
        let op = Operation::KeyGeneration;
        self.state.error = None;
        info!(bits = self.config.key_spec.modulus_bits, "generating key pairs");
        self.log(op, "Starting key generation process", Severity::Info);

        match self.create_key_pairs() {
            Ok((encryption, signing)) => {
                self.state.encryption_keys = Some(encryption);
                self.state.signing_keys = Some(signing);
                self.log(op, "Key generation completed successfully", Severity::Success);
                Ok(())
            }
            Err(err) => Err(self.fail(op, err)),
        }
    }

    fn create_key_pairs(&mut self) -> Result<(KeyPair, KeyPair), WorkbenchError> {
        let op = Operation::KeyGeneration;
        let spec = self.config.key_spec;
        let to_err = provider_failure(op);

        self.log(
            op,
            format!(
                "Generating RSA-OAEP encryption key pair ({} bits)",
                spec.modulus_bits
            ),
            Severity::Info,
        );
        let (enc_public, enc_private) = self
            .provider
            .generate_key_pair(KeyAlgorithm::RsaOaep, &spec)
            .map_err(&to_err)?;

        self.log(
            op,
            format!("Generating RSA-PSS signing key pair ({} bits)", spec.modulus_bits),
            Severity::Info,
        );
        let (sig_public, sig_private) = self
            .provider
            .generate_key_pair(KeyAlgorithm::RsaPss, &spec)
            .map_err(&to_err)?;

        self.log(op, "Exporting keys to JWK format", Severity::Info);
        let encryption = KeyPair {
            public_key: self
                .provider
                .export_public_key(&enc_public, KeyAlgorithm::RsaOaep)
                .map_err(&to_err)?,
            private_key: self
                .provider
                .export_private_key(&enc_private, KeyAlgorithm::RsaOaep)
                .map_err(&to_err)?,
        };
        let signing = KeyPair {
            public_key: self
                .provider
                .export_public_key(&sig_public, KeyAlgorithm::RsaPss)
                .map_err(&to_err)?,
            private_key: self
                .provider
                .export_private_key(&sig_private, KeyAlgorithm::RsaPss)
                .map_err(&to_err)?,
        };
        Ok((encryption, signing))
    }

    /// Encrypts `message` under OAEP, then signs the ciphertext under PSS.
    pub fn encrypt_and_sign(&mut self, message: &str) -> Result<(), WorkbenchError> {
        let op = Operation::EncryptAndSign;
        self.state.message = message.to_string();

        if message.is_empty() {
            return Err(self.reject(op, WorkbenchError::EmptyMessage, "No message provided"));
        }
        let (Some(encryption), Some(signing)) = (
            self.state.encryption_keys.clone(),
            self.state.signing_keys.clone(),
        ) else {
            return Err(self.reject(op, WorkbenchError::KeysMissing, "Keys not generated"));
        };
        let max = self.config.max_message_chars;
        let len = message.chars().count();
        if len > max {
            let detail = format!("Message exceeds {max} characters");
            return Err(self.reject(op, WorkbenchError::MessageTooLong { len, max }, &detail));
        }

        self.state.error = None;
        info!(chars = len, "encrypt-then-sign");
        self.log(
            op,
            format!(
                "Starting encrypt-then-sign process for message: \"{}\"",
                preview(message)
            ),
            Severity::Info,
        );

        match self.seal(message, &encryption, &signing) {
            Ok((encrypted, signature)) => {
                self.state.encrypted_message = Some(encrypted);
                self.state.signature = Some(signature);
                self.state.decrypted_message = None;
                self.state.verification = None;
                self.log(op, "Encrypt-then-sign process completed", Severity::Success);
                Ok(())
            }
            Err(err) => Err(self.fail(op, err)),
        }
    }

    fn seal(
        &mut self,
        message: &str,
        encryption: &KeyPair,
        signing: &KeyPair,
    ) -> Result<(String, String), WorkbenchError> {
        let op = Operation::EncryptAndSign;
        let to_err = provider_failure(op);

        self.log(op, "Importing encryption public key from JWK format", Severity::Info);
        let public = self
            .provider
            .import_public_key(&encryption.public_key, KeyAlgorithm::RsaOaep)
            .map_err(&to_err)?;

        self.log(op, "Importing signing private key from JWK format", Severity::Info);
        let private = self
            .provider
            .import_private_key(&signing.private_key, KeyAlgorithm::RsaPss)
            .map_err(&to_err)?;

        self.log(op, "Converting plaintext message to UTF-8 bytes", Severity::Info);
        let plaintext = message.as_bytes();
        self.log(
            op,
            format!("Message encoded to {} bytes", plaintext.len()),
            Severity::Info,
        );

        self.log(op, "Encrypting message with RSA-OAEP", Severity::Info);
        let ciphertext = self
            .provider
            .encrypt_oaep(&public, plaintext)
            .map_err(&to_err)?;
        self.log(
            op,
            format!("Message encrypted successfully ({} bytes)", ciphertext.len()),
            Severity::Success,
        );

        self.log(op, "Converting encrypted data to base64 format", Severity::Info);
        let encrypted = STANDARD.encode(&ciphertext);
        self.log(
            op,
            format!("Base64 encoding complete ({} characters)", encrypted.len()),
            Severity::Info,
        );

        self.log(op, "Signing the encrypted data with RSA-PSS", Severity::Info);
        let signature = self
            .provider
            .sign_pss(&private, self.config.pss_salt_len, &ciphertext)
            .map_err(&to_err)?;
        self.log(
            op,
            format!("Message signed successfully ({} bytes)", signature.len()),
            Severity::Success,
        );

        self.log(op, "Converting signature to base64 format", Severity::Info);
        let signature = STANDARD.encode(&signature);
        self.log(
            op,
            format!("Base64 encoding complete ({} characters)", signature.len()),
            Severity::Info,
        );

        Ok((encrypted, signature))
    }

    /// Verifies the signature over the ciphertext and, only if it holds,
    /// decrypts.
    ///
    /// Each non-empty manual value replaces the matching session output.
    pub fn verify_and_decrypt(
        &mut self,
        manual_ciphertext: Option<&str>,
        manual_signature: Option<&str>,
    ) -> Result<VerifyOutcome, WorkbenchError> {
        let op = Operation::VerifyAndDecrypt;

        let manual_ciphertext = non_empty(manual_ciphertext).map(str::to_string);
        let manual_signature = non_empty(manual_signature).map(str::to_string);
        let generated_ciphertext =
            non_empty(self.state.encrypted_message.as_deref()).map(str::to_string);
        let generated_signature = non_empty(self.state.signature.as_deref()).map(str::to_string);

        let generated_ready = generated_ciphertext.is_some() && generated_signature.is_some();
        let manual_ready = manual_ciphertext.is_some() && manual_signature.is_some();
        if !generated_ready && !manual_ready {
            return Err(self.reject(
                op,
                WorkbenchError::MissingCiphertext,
                "Missing encrypted message or signature",
            ));
        }
        let (Some(encryption), Some(signing)) = (
            self.state.encryption_keys.clone(),
            self.state.signing_keys.clone(),
        ) else {
            return Err(self.reject(op, WorkbenchError::KeysMissing, "Keys not generated"));
        };

        let pick = |manual: Option<String>, generated: Option<String>| match manual {
            Some(text) => Some((text, Source::Manual)),
            None => generated.map(|text| (text, Source::Generated)),
        };
        let (Some((ciphertext, ct_source)), Some((signature, sig_source))) = (
            pick(manual_ciphertext, generated_ciphertext),
            pick(manual_signature, generated_signature),
        ) else {
            return Err(self.reject(
                op,
                WorkbenchError::MissingCiphertext,
                "Missing encrypted message or signature",
            ));
        };

        self.state.error = None;
        info!("verify-then-decrypt");
        self.log(op, "Starting verify-then-decrypt process", Severity::Info);
        self.log(
            op,
            format!("Using {} encrypted message", ct_source.describe()),
            Severity::Info,
        );
        self.log(
            op,
            format!("Using {} signature", sig_source.describe()),
            Severity::Info,
        );

        match self.open(&ciphertext, &signature, &encryption, &signing) {
            Ok(Some(plaintext)) => {
                self.state.decrypted_message = Some(plaintext.clone());
                self.log(
                    op,
                    format!("Message decrypted successfully: \"{}\"", preview(&plaintext)),
                    Severity::Success,
                );
                Ok(VerifyOutcome::Verified(plaintext))
            }
            Ok(None) => {
                self.state.verification = Some(false);
                self.state.decrypted_message = None;
                self.state.error = Some("Signature verification failed".to_string());
                warn!("signature verification failed");
                self.log(
                    op,
                    "Signature verification failed - cannot decrypt message",
                    Severity::Error,
                );
                Ok(VerifyOutcome::Rejected)
            }
            Err(err) => {
                self.state.verification = Some(false);
                self.state.decrypted_message = None;
                Err(self.fail(op, err))
            }
        }
    }

    /// `Ok(None)` means the signature did not verify.
    fn open(
        &mut self,
        ciphertext: &str,
        signature: &str,
        encryption: &KeyPair,
        signing: &KeyPair,
    ) -> Result<Option<String>, WorkbenchError> {
        let op = Operation::VerifyAndDecrypt;
        let to_err = provider_failure(op);

        self.log(op, "Importing encryption private key from JWK format", Severity::Info);
        let private = self
            .provider
            .import_private_key(&encryption.private_key, KeyAlgorithm::RsaOaep)
            .map_err(&to_err)?;

        self.log(op, "Importing signing public key from JWK format", Severity::Info);
        let public = self
            .provider
            .import_public_key(&signing.public_key, KeyAlgorithm::RsaPss)
            .map_err(&to_err)?;

        self.log(
            op,
            "Converting base64 encrypted message to binary format",
            Severity::Info,
        );
        let ciphertext = decode_base64(op, "encrypted message", ciphertext)?;
        self.log(
            op,
            format!("Encrypted data decoded ({} bytes)", ciphertext.len()),
            Severity::Info,
        );

        self.log(op, "Converting base64 signature to binary format", Severity::Info);
        let signature = decode_base64(op, "signature", signature)?;
        self.log(
            op,
            format!("Signature decoded ({} bytes)", signature.len()),
            Severity::Info,
        );

        self.log(op, "Verifying signature with RSA-PSS", Severity::Info);
        let verified = self
            .provider
            .verify_pss(&public, self.config.pss_salt_len, &signature, &ciphertext)
            .map_err(&to_err)?;
        if !verified {
            return Ok(None);
        }
        self.state.verification = Some(true);
        self.log(op, "Signature verification successful", Severity::Success);

        self.log(op, "Decrypting message with RSA-OAEP", Severity::Info);
        let plaintext = self
            .provider
            .decrypt_oaep(&private, &ciphertext)
            .map_err(&to_err)?;

        self.log(op, "Converting decrypted data to text", Severity::Info);
        Ok(Some(String::from_utf8_lossy(&plaintext).into_owned()))
    }

    /// Stages one key document for a later [`import_staged_keys`].
    ///
    /// Only checks that non-empty text is JSON. Invalid text leaves the
    /// staged value untouched; empty text clears it.
    ///
    /// [`import_staged_keys`]: Session::import_staged_keys
    pub fn stage_import_field(&mut self, field: KeyField, text: &str) -> Result<(), WorkbenchError> {
        if !text.is_empty() && serde_json::from_str::<serde_json::Value>(text).is_err() {
            let err = WorkbenchError::InvalidImportJson { field };
            debug!(%field, "staged key is not JSON");
            self.state.key_import_error = Some(err.to_string());
            return Err(err);
        }
        *self.state.pending_import.slot_mut(field) = (!text.is_empty()).then(|| text.to_string());
        self.state.key_import_error = None;
        Ok(())
    }

    pub fn import_staged_keys(&mut self) -> Result<(), WorkbenchError> {
        let staged = self.state.pending_import.clone();
        self.import(staged)
    }

    pub fn import_keys(&mut self, material: KeyMaterial) -> Result<(), WorkbenchError> {
        self.import(material.into())
    }

    fn import(&mut self, staged: PendingImport) -> Result<(), WorkbenchError> {
        let op = Operation::KeyImport;
        if !staged.is_complete() {
            return Err(self.reject(op, WorkbenchError::ImportFieldsMissing, "Missing fields"));
        }

        for field in KeyField::ALL {
            let text = staged.get(field).unwrap_or_default();
            let parsed = if field.is_private() {
                self.provider
                    .import_private_key(text, field.algorithm())
                    .map(drop)
            } else {
                self.provider
                    .import_public_key(text, field.algorithm())
                    .map(drop)
            };
            if let Err(source) = parsed {
                let detail = format!("{field}: {source}");
                return Err(self.reject(op, WorkbenchError::InvalidImportKey { field, source }, &detail));
            }
        }

        let PendingImport {
            encryption_public: Some(encryption_public),
            encryption_private: Some(encryption_private),
            signing_public: Some(signing_public),
            signing_private: Some(signing_private),
        } = staged
        else {
            return Err(self.reject(op, WorkbenchError::ImportFieldsMissing, "Missing fields"));
        };

        self.state.encryption_keys = Some(KeyPair {
            public_key: encryption_public,
            private_key: encryption_private,
        });
        self.state.signing_keys = Some(KeyPair {
            public_key: signing_public,
            private_key: signing_private,
        });
        self.state.pending_import = PendingImport::default();
        self.state.key_import_error = None;
        info!("keys imported");
        self.log(op, "Keys imported successfully", Severity::Success);
        Ok(())
    }
}
