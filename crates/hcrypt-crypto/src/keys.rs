//! Symmetric key material

use hcrypt_core::{HcryptError, HcryptResult, KeySize};
use rand::RngCore;
use zeroize::Zeroize;

/// A Triple-DES key of 8, 16 or 24 bytes. Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
    size: KeySize,
}

impl SymmetricKey {
    /// Take ownership of raw key bytes. Lengths other than 8, 16 or 24 are
    /// rejected and the rejected bytes are zeroized.
    pub fn from_bytes(mut bytes: Vec<u8>) -> HcryptResult<Self> {
        match KeySize::try_from(bytes.len()) {
            Ok(size) => Ok(Self { bytes, size }),
            Err(e) => {
                bytes.zeroize();
                Err(e)
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> KeySize {
        self.size
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("size", &self.size.bytes())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random symmetric key of the given size.
pub fn generate_symmetric_key(size: KeySize) -> SymmetricKey {
    let mut bytes = vec![0u8; size.bytes()];
    rand::thread_rng().fill_bytes(&mut bytes);
    SymmetricKey { bytes, size }
}

/// Unwrapped keys must match the configured size.
pub(crate) fn ensure_size(key: &SymmetricKey, expected: KeySize) -> HcryptResult<()> {
    if key.size() != expected {
        return Err(HcryptError::KeySizeMismatch {
            expected: expected.bytes(),
            found: key.size().bytes(),
        });
    }
    Ok(())
}
