// course_site/workbench_core/src/rsa_provider.rs

use rand::rngs::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Oaep, Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::KeySpec;
use crate::error::CryptoError;
use crate::jwk::{self, Jwk};
use crate::provider::{CryptoProvider, KeyAlgorithm};

/// [`CryptoProvider`] backed by the RustCrypto `rsa` crate.
///
/// OAEP and PSS both use SHA-256 (the PSS mask generation function too).
#[derive(Clone, Copy, Debug, Default)]
pub struct RsaProvider;

impl RsaProvider {
    pub fn new() -> Self {
        Self
    }
}

fn uint(member: &str, value: &str) -> Result<BigUint, CryptoError> {
    Ok(BigUint::from_bytes_be(&jwk::decode_uint(member, value)?))
}

fn private_to_jwk(key: &RsaPrivateKey, algorithm: KeyAlgorithm) -> Result<Jwk, CryptoError> {
    let [p, q] = key.primes() else {
        return Err(CryptoError::Export(format!(
            "expected two prime factors, key has {}",
            key.primes().len()
        )));
    };
    let one = BigUint::from(1u32);
    let dp = key.d() % (p - &one);
    let dq = key.d() % (q - &one);
    let qi = key
        .crt_coefficient()
        .ok_or_else(|| CryptoError::Export("CRT coefficient does not exist".to_string()))?;

    let mut out = Jwk::public(algorithm, &key.n().to_bytes_be(), &key.e().to_bytes_be())
        .with_private_ops(algorithm);
    out.d = Some(jwk::encode_uint(&key.d().to_bytes_be()));
    out.p = Some(jwk::encode_uint(&p.to_bytes_be()));
    out.q = Some(jwk::encode_uint(&q.to_bytes_be()));
    out.dp = Some(jwk::encode_uint(&dp.to_bytes_be()));
    out.dq = Some(jwk::encode_uint(&dq.to_bytes_be()));
    out.qi = Some(jwk::encode_uint(&qi.to_bytes_be()));
    Ok(out)
}

impl CryptoProvider for RsaProvider {
    type PublicKey = RsaPublicKey;
    type PrivateKey = RsaPrivateKey;

    fn generate_key_pair(
        &self,
        algorithm: KeyAlgorithm,
        spec: &KeySpec,
    ) -> Result<(RsaPublicKey, RsaPrivateKey), CryptoError> {
        debug!(%algorithm, bits = spec.modulus_bits, "generating RSA key pair");
        let exponent = BigUint::from(spec.public_exponent);
        let private = RsaPrivateKey::new_with_exp(&mut OsRng, spec.modulus_bits, &exponent)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = private.to_public_key();
        Ok((public, private))
    }

    fn export_public_key(
        &self,
        key: &RsaPublicKey,
        algorithm: KeyAlgorithm,
    ) -> Result<String, CryptoError> {
        Jwk::public(algorithm, &key.n().to_bytes_be(), &key.e().to_bytes_be()).to_pretty_json()
    }

    fn export_private_key(
        &self,
        key: &RsaPrivateKey,
        algorithm: KeyAlgorithm,
    ) -> Result<String, CryptoError> {
        private_to_jwk(key, algorithm)?.to_pretty_json()
    }

    fn import_public_key(
        &self,
        text: &str,
        algorithm: KeyAlgorithm,
    ) -> Result<RsaPublicKey, CryptoError> {
        let parsed = Jwk::parse(text)?;
        parsed.check_algorithm(algorithm)?;
        RsaPublicKey::new(uint("n", &parsed.n)?, uint("e", &parsed.e)?)
            .map_err(|e| CryptoError::InvalidJwk(e.to_string()))
    }

    fn import_private_key(
        &self,
        text: &str,
        algorithm: KeyAlgorithm,
    ) -> Result<RsaPrivateKey, CryptoError> {
        let parsed = Jwk::parse(text)?;
        parsed.check_algorithm(algorithm)?;

        let n = uint("n", &parsed.n)?;
        let e = uint("e", &parsed.e)?;
        let d = uint("d", jwk::require("d", &parsed.d)?)?;
        let p = uint("p", jwk::require("p", &parsed.p)?)?;
        let q = uint("q", jwk::require("q", &parsed.q)?)?;

        let key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
            .map_err(|e| CryptoError::InvalidJwk(e.to_string()))?;
        key.validate()
            .map_err(|e| CryptoError::InvalidJwk(e.to_string()))?;
        Ok(key)
    }

    fn encrypt_oaep(&self, key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        key.encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|e| CryptoError::Encrypt(e.to_string()))
    }

    fn decrypt_oaep(&self, key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        key.decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map_err(|e| CryptoError::Decrypt(e.to_string()))
    }

    fn sign_pss(
        &self,
        key: &RsaPrivateKey,
        salt_len: usize,
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let digest = Sha256::digest(data);
        key.sign_with_rng(&mut OsRng, Pss::new_with_salt::<Sha256>(salt_len), &digest)
            .map_err(|e| CryptoError::Sign(e.to_string()))
    }

    fn verify_pss(
        &self,
        key: &RsaPublicKey,
        salt_len: usize,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool, CryptoError> {
        let digest = Sha256::digest(data);
        match key.verify(Pss::new_with_salt::<Sha256>(salt_len), &digest, signature) {
            Ok(()) => Ok(true),
            Err(e) => {
                debug!(error = %e, "PSS signature rejected");
                Ok(false)
            }
        }
    }
}
