// course_site/workbench_core/src/config.rs

/// Largest message accepted by encrypt-and-sign, counted in characters.
pub const MAX_MESSAGE_CHARS: usize = 140;

/// PSS salt length in bytes, shared by signing and verification.
pub const PSS_SALT_LEN: usize = 32;

pub const DEFAULT_MODULUS_BITS: usize = 2048;
pub const DEFAULT_PUBLIC_EXPONENT: u32 = 65537;

/// RSA key generation parameters. The digest is always SHA-256.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeySpec {
    pub modulus_bits: usize,
    pub public_exponent: u32,
}

impl Default for KeySpec {
    fn default() -> Self {
        Self {
            modulus_bits: DEFAULT_MODULUS_BITS,
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkbenchConfig {
    pub key_spec: KeySpec,
    pub max_message_chars: usize,
    pub pss_salt_len: usize,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            key_spec: KeySpec::default(),
            max_message_chars: MAX_MESSAGE_CHARS,
            pss_salt_len: PSS_SALT_LEN,
        }
    }
}
