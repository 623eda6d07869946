use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HcryptError;

/// Symmetric key length. Only 8, 16 and 24 byte keys exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum KeySize {
    /// 8 bytes: single-key Triple-DES (equivalent to DES)
    Single,
    /// 16 bytes: two-key Triple-DES (EDE2)
    #[default]
    Double,
    /// 24 bytes: three-key Triple-DES (EDE3)
    Triple,
}

impl KeySize {
    pub const ALL: [KeySize; 3] = [KeySize::Single, KeySize::Double, KeySize::Triple];

    pub fn bytes(self) -> usize {
        match self {
            KeySize::Single => 8,
            KeySize::Double => 16,
            KeySize::Triple => 24,
        }
    }
}

impl TryFrom<usize> for KeySize {
    type Error = HcryptError;

    fn try_from(bytes: usize) -> Result<Self, Self::Error> {
        match bytes {
            8 => Ok(KeySize::Single),
            16 => Ok(KeySize::Double),
            24 => Ok(KeySize::Triple),
            other => Err(HcryptError::InvalidKeySize(other)),
        }
    }
}

impl From<KeySize> for usize {
    fn from(size: KeySize) -> usize {
        size.bytes()
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

/// Length of the IV field that prefixes every ciphertext file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IvLength {
    /// IV field as long as the symmetric key (8, 16 or 24 bytes)
    #[default]
    KeySize,
    /// IV field exactly one cipher block (8 bytes)
    BlockSize,
}

impl fmt::Display for IvLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IvLength::KeySize => f.write_str("key-size"),
            IvLength::BlockSize => f.write_str("block-size"),
        }
    }
}

/// Direction of a bulk file transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Encrypt,
    Decrypt,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Encrypt => f.write_str("encrypt"),
            Action::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// Lifecycle state of a key set on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// No keys generated yet: encryption and decryption are invalid
    Uninitialized,
    /// Wrapped symmetric key and private key both present
    Initialized,
}
