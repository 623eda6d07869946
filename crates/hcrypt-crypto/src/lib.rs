//! hcrypt-crypto: Hybrid RSA + Triple-DES file encryption
//!
//! Architecture: RSA-OAEP wraps a random symmetric key; Triple-DES-CBC encrypts file content
//!
//! Key artifacts:
//! ```text
//! RSA-2048 keypair (e = 65537)
//!   ├── public key   (SPKI PEM)       wraps the symmetric key at generation time
//!   ├── private key  (PKCS#1 PEM)     unwraps the symmetric key before every operation
//!   └── wrapped key  (raw OAEP-SHA256 ciphertext, 256 bytes)
//!       └── symmetric key (8 | 16 | 24 bytes) → DES | TDES-EDE2 | TDES-EDE3 in CBC mode
//! ```
//!
//! Ciphertext file: `[IV field][CBC ciphertext of PKCS#7-padded plaintext]`, no header.

pub mod cipher;
pub mod hybrid;
pub mod keys;
pub mod wrap;

pub use cipher::CbcCodec;
pub use hybrid::{key_paths_in, HybridCryptosystem};
pub use keys::{generate_symmetric_key, SymmetricKey};
pub use wrap::{unwrap_key, wrap_key, KeyPair};

/// Triple-DES block size in bytes
pub const BLOCK_SIZE: usize = 8;

/// RSA modulus size in bits
pub const RSA_BITS: usize = 2048;

/// RSA public exponent
pub const RSA_EXPONENT: u32 = 65537;

/// SHA-256 output size, used by OAEP for both the label hash and MGF1
pub const OAEP_HASH_SIZE: usize = 32;
