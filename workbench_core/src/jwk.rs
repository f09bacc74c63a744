// course_site/workbench_core/src/jwk.rs

//! JSON Web Key documents for RSA keys (RFC 7517 / RFC 7518 §6.3).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::provider::KeyAlgorithm;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<bool>,

    pub n: String,
    pub e: String,

    // Private members; all present or all absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

impl Jwk {
    /// Public JWK from big-endian modulus and exponent bytes.
    pub fn public(algorithm: KeyAlgorithm, n: &[u8], e: &[u8]) -> Self {
        Self {
            kty: "RSA".to_string(),
            alg: Some(algorithm.jwk_alg().to_string()),
            key_ops: Some(ops(algorithm, false)),
            ext: Some(true),
            n: encode_uint(n),
            e: encode_uint(e),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
        }
    }

    pub fn parse(text: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(text).map_err(|e| CryptoError::InvalidJwk(e.to_string()))
    }

    pub fn to_pretty_json(&self) -> Result<String, CryptoError> {
        serde_json::to_string_pretty(self).map_err(|e| CryptoError::Export(e.to_string()))
    }

    /// Rejects keys that are not RSA or whose `alg` names another scheme.
    /// A missing `alg` is accepted.
    pub fn check_algorithm(&self, algorithm: KeyAlgorithm) -> Result<(), CryptoError> {
        if self.kty != "RSA" {
            return Err(CryptoError::InvalidJwk(format!(
                "unsupported kty \"{}\"",
                self.kty
            )));
        }
        match &self.alg {
            Some(alg) if alg != algorithm.jwk_alg() => Err(CryptoError::AlgorithmMismatch {
                expected: algorithm.jwk_alg().to_string(),
                found: alg.clone(),
            }),
            _ => Ok(()),
        }
    }

    pub fn with_private_ops(mut self, algorithm: KeyAlgorithm) -> Self {
        self.key_ops = Some(ops(algorithm, true));
        self
    }
}

fn ops(algorithm: KeyAlgorithm, private: bool) -> Vec<String> {
    algorithm
        .key_ops(private)
        .iter()
        .map(|op| op.to_string())
        .collect()
}

/// Base64url without padding, leading zero bytes stripped (RFC 7518 §2).
pub fn encode_uint(bytes: &[u8]) -> String {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let trimmed = &bytes[first..];
    if trimmed.is_empty() {
        URL_SAFE_NO_PAD.encode([0u8])
    } else {
        URL_SAFE_NO_PAD.encode(trimmed)
    }
}

pub fn decode_uint(member: &str, value: &str) -> Result<Vec<u8>, CryptoError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| CryptoError::InvalidJwk(format!("member \"{member}\": {e}")))?;
    if bytes.is_empty() {
        return Err(CryptoError::InvalidJwk(format!("member \"{member}\" is empty")));
    }
    Ok(bytes)
}

/// Looks up a required private member.
pub fn require<'a>(member: &str, value: &'a Option<String>) -> Result<&'a str, CryptoError> {
    value
        .as_deref()
        .ok_or_else(|| CryptoError::InvalidJwk(format!("missing private member \"{member}\"")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponent_65537_encodes_as_aqab() {
        assert_eq!(encode_uint(&[0x01, 0x00, 0x01]), "AQAB");
        assert_eq!(encode_uint(&[0x00, 0x01, 0x00, 0x01]), "AQAB");
        assert_eq!(decode_uint("e", "AQAB").unwrap(), vec![0x01, 0x00, 0x01]);
    }

    #[test]
    fn public_jwk_skips_private_members() {
        let jwk = Jwk::public(KeyAlgorithm::RsaPss, &[0xC5; 4], &[1, 0, 1]);
        let text = jwk.to_pretty_json().unwrap();
        assert!(text.contains("\"alg\": \"PS256\""));
        assert!(text.contains("\"verify\""));
        assert!(!text.contains("\"d\""));
        assert!(Jwk::parse(&text).unwrap().d.is_none());
    }

    #[test]
    fn algorithm_mismatch_is_rejected() {
        let jwk = Jwk::public(KeyAlgorithm::RsaOaep, &[0xC5; 4], &[1, 0, 1]);
        assert!(jwk.check_algorithm(KeyAlgorithm::RsaOaep).is_ok());
        assert!(matches!(
            jwk.check_algorithm(KeyAlgorithm::RsaPss),
            Err(CryptoError::AlgorithmMismatch { .. })
        ));
    }

    #[test]
    fn missing_alg_is_accepted_but_wrong_kty_is_not() {
        let mut jwk = Jwk::public(KeyAlgorithm::RsaOaep, &[0xC5; 4], &[1, 0, 1]);
        jwk.alg = None;
        assert!(jwk.check_algorithm(KeyAlgorithm::RsaPss).is_ok());
        jwk.kty = "EC".to_string();
        assert!(jwk.check_algorithm(KeyAlgorithm::RsaPss).is_err());
    }

    #[test]
    fn non_json_is_invalid_jwk() {
        assert!(matches!(Jwk::parse("{not json"), Err(CryptoError::InvalidJwk(_))));
        assert!(matches!(Jwk::parse("{\"kty\":\"RSA\"}"), Err(CryptoError::InvalidJwk(_))));
    }
}
