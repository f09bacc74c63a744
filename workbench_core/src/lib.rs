// course_site/workbench_core/src/lib.rs

pub mod config;
pub mod error;
pub mod jwk;
pub mod models;
pub mod oplog;
pub mod provider;
pub mod rsa_provider;
pub mod session;

pub use config::{KeySpec, WorkbenchConfig};
pub use error::{CryptoError, WorkbenchError};
pub use models::{EncryptRequest, ErrorBody, LinkKind, LinkResponse, VerifyRequest};
pub use oplog::{LogEntry, OperationLog, Severity};
pub use provider::{CryptoProvider, KeyAlgorithm};
pub use rsa_provider::RsaProvider;
pub use session::{KeyField, KeyMaterial, KeyPair, Session, SessionState, VerifyOutcome};
