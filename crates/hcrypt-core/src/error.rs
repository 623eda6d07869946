use std::path::PathBuf;
use thiserror::Error;

pub type HcryptResult<T> = Result<T, HcryptError>;

#[derive(Debug, Error)]
pub enum HcryptError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encryption/decryption attempted before key generation.
    #[error("keys not found: {} does not exist (run key generation first)", path.display())]
    KeysNotFound { path: PathBuf },

    /// Key file exists but cannot be parsed.
    #[error("key material error: {0}")]
    KeyMaterial(String),

    #[error("symmetric key is {found} bytes but {expected} bytes are configured (regenerate keys)")]
    KeySizeMismatch { expected: usize, found: usize },

    #[error("key unwrap failed: {0}")]
    Unwrap(String),

    #[error("message too long for RSA-OAEP: {len} bytes (max {max})")]
    MessageTooLong { len: usize, max: usize },

    #[error("invalid padding: wrong key or tampered ciphertext")]
    Padding,

    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("unsupported key size: {0} bytes (expected 8, 16 or 24)")]
    InvalidKeySize(usize),

    #[error("config error: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(String),
}

/// Coarse error taxonomy, for callers that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    KeyState,
    Unwrap,
    Padding,
    InvalidConfig,
    Crypto,
}

impl HcryptError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::KeysNotFound { .. } | Self::KeyMaterial(_) | Self::KeySizeMismatch { .. } => {
                ErrorKind::KeyState
            }
            Self::Unwrap(_) | Self::MessageTooLong { .. } => ErrorKind::Unwrap,
            Self::Padding | Self::MalformedCiphertext(_) => ErrorKind::Padding,
            Self::InvalidKeySize(_) | Self::Config(_) => ErrorKind::InvalidConfig,
            Self::Crypto(_) => ErrorKind::Crypto,
        }
    }
}
