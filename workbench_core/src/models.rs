// course_site/workbench_core/src/models.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which URL of a writeup link record is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    Web3,
    Documentation,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web3 => "web3",
            Self::Documentation => "documentation",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web3" => Ok(Self::Web3),
            "documentation" => Ok(Self::Documentation),
            _ => Err(()),
        }
    }
}

/// Successful `GET /api/links` body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LinkResponse {
    pub url: String,
}

/// Error body shared by every endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// `POST /api/rsa/encrypt` body. A missing message reads as empty.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EncryptRequest {
    #[serde(default)]
    pub message: String,
}

/// `POST /api/rsa/verify` body. Absent fields fall back to the session's
/// own ciphertext and signature.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct VerifyRequest {
    #[serde(default)]
    pub encrypted_message: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_kind_parses_only_known_values() {
        assert_eq!("web3".parse::<LinkKind>(), Ok(LinkKind::Web3));
        assert_eq!("documentation".parse::<LinkKind>(), Ok(LinkKind::Documentation));
        assert!("Web3".parse::<LinkKind>().is_err());
        assert!("bogus".parse::<LinkKind>().is_err());
    }

    #[test]
    fn encrypt_request_message_defaults_to_empty() {
        let req: EncryptRequest = serde_json::from_str("{}").unwrap();
        assert!(req.message.is_empty());
    }

    #[test]
    fn verify_request_fields_are_optional() {
        let req: VerifyRequest = serde_json::from_str("{}").unwrap();
        assert!(req.encrypted_message.is_none());
        assert!(req.signature.is_none());
    }
}
