//! Triple-DES-CBC with PKCS#7 padding
//!
//! Sealed format (binary):
//! ```text
//! [iv_len bytes: random IV field][N * 8 bytes: CBC ciphertext]
//! ```
//!
//! `iv_len` is the key length (8, 16 or 24) with [`IvLength::KeySize`], or one
//! cipher block with [`IvLength::BlockSize`]. CBC always chains from the first
//! block-size bytes of the IV field; the remaining bytes are random filler.
//! Padding is to the Triple-DES block size, independent of key length.
//!
//! CBC + PKCS#7 does not authenticate. A flipped ciphertext byte is detected
//! only when it breaks the final padding; otherwise decryption returns
//! altered plaintext.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::{Des, TdesEde2, TdesEde3};
use hcrypt_core::{HcryptError, HcryptResult, IvLength, KeySize};
use rand::RngCore;

use crate::keys::SymmetricKey;
use crate::BLOCK_SIZE;

/// Block-cipher codec for bulk file content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CbcCodec {
    iv_length: IvLength,
}

impl CbcCodec {
    pub fn new(iv_length: IvLength) -> Self {
        Self { iv_length }
    }

    pub fn iv_length(&self) -> IvLength {
        self.iv_length
    }

    /// Length of the IV field for a key of `size`.
    pub fn iv_len(&self, size: KeySize) -> usize {
        match self.iv_length {
            IvLength::KeySize => size.bytes(),
            IvLength::BlockSize => BLOCK_SIZE,
        }
    }

    /// Exact length of `seal` output for a plaintext of `plaintext_len` bytes.
    pub fn ciphertext_len(&self, size: KeySize, plaintext_len: usize) -> usize {
        self.iv_len(size) + (plaintext_len / BLOCK_SIZE + 1) * BLOCK_SIZE
    }

    /// Encrypt `plaintext` under a fresh random IV.
    ///
    /// Returns: `[IV field][ciphertext]`
    pub fn seal(&self, key: &SymmetricKey, plaintext: &[u8]) -> HcryptResult<Vec<u8>> {
        let mut iv_field = vec![0u8; self.iv_len(key.size())];
        rand::thread_rng().fill_bytes(&mut iv_field);
        self.seal_with_iv(key, iv_field, plaintext)
    }

    fn seal_with_iv(
        &self,
        key: &SymmetricKey,
        iv_field: Vec<u8>,
        plaintext: &[u8],
    ) -> HcryptResult<Vec<u8>> {
        let iv = &iv_field[..BLOCK_SIZE];
        let body = match key.size() {
            KeySize::Single => cbc_encrypt::<Des>(key.as_bytes(), iv, plaintext)?,
            KeySize::Double => cbc_encrypt::<TdesEde2>(key.as_bytes(), iv, plaintext)?,
            KeySize::Triple => cbc_encrypt::<TdesEde3>(key.as_bytes(), iv, plaintext)?,
        };

        let mut sealed = iv_field;
        sealed.reserve_exact(body.len());
        sealed.extend_from_slice(&body);
        Ok(sealed)
    }

    /// Decrypt the output of [`seal`](Self::seal).
    ///
    /// Input: `[IV field][ciphertext]`
    pub fn open(&self, key: &SymmetricKey, sealed: &[u8]) -> HcryptResult<Vec<u8>> {
        let iv_len = self.iv_len(key.size());
        if sealed.len() < iv_len + BLOCK_SIZE {
            return Err(HcryptError::MalformedCiphertext(format!(
                "{} bytes is shorter than IV ({iv_len}) plus one block ({BLOCK_SIZE})",
                sealed.len()
            )));
        }

        let (iv_field, body) = sealed.split_at(iv_len);
        if body.len() % BLOCK_SIZE != 0 {
            return Err(HcryptError::MalformedCiphertext(format!(
                "ciphertext body of {} bytes is not a multiple of the {BLOCK_SIZE}-byte block",
                body.len()
            )));
        }

        let iv = &iv_field[..BLOCK_SIZE];
        match key.size() {
            KeySize::Single => cbc_decrypt::<Des>(key.as_bytes(), iv, body),
            KeySize::Double => cbc_decrypt::<TdesEde2>(key.as_bytes(), iv, body),
            KeySize::Triple => cbc_decrypt::<TdesEde3>(key.as_bytes(), iv, body),
        }
    }
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> HcryptResult<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher,
    cbc::Encryptor<C>: KeyIvInit + BlockEncryptMut,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| HcryptError::Crypto(format!("CBC encryptor init failed: {e}")))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], body: &[u8]) -> HcryptResult<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher,
    cbc::Decryptor<C>: KeyIvInit + BlockDecryptMut,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| HcryptError::Crypto(format!("CBC decryptor init failed: {e}")))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(body)
        .map_err(|_| HcryptError::Padding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_symmetric_key;
    use proptest::prelude::*;

    fn key_of(size: KeySize) -> SymmetricKey {
        generate_symmetric_key(size)
    }

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let codec = CbcCodec::default();
        for size in KeySize::ALL {
            let key = key_of(size);
            let plaintext = b"hello, encrypted world!";

            let sealed = codec.seal(&key, plaintext).unwrap();
            let opened = codec.open(&key, &sealed).unwrap();

            assert_eq!(&opened, plaintext);
        }
    }

    #[test]
    fn test_seal_open_empty() {
        let codec = CbcCodec::default();
        let key = key_of(KeySize::Single);

        let sealed = codec.seal(&key, b"").unwrap();
        assert_eq!(sealed.len(), 8 + BLOCK_SIZE, "empty input pads to one block");
        assert_eq!(codec.open(&key, &sealed).unwrap(), b"");
    }

    #[test]
    fn test_hello_world_sizes() {
        let codec = CbcCodec::default();
        let key = key_of(KeySize::Double);

        let sealed = codec.seal(&key, b"hello world").unwrap();

        // IV (16) + one padded block (11 -> 16)
        assert_eq!(sealed.len(), 32);
        assert_eq!(codec.ciphertext_len(KeySize::Double, 11), 32);
        assert_eq!(codec.open(&key, &sealed).unwrap(), b"hello world");
    }

    #[test]
    fn test_iv_field_follows_layout() {
        let key_sized = CbcCodec::new(IvLength::KeySize);
        let block_sized = CbcCodec::new(IvLength::BlockSize);
        for size in KeySize::ALL {
            assert_eq!(key_sized.iv_len(size), size.bytes());
            assert_eq!(block_sized.iv_len(size), BLOCK_SIZE);

            let key = key_of(size);
            let sealed = block_sized.seal(&key, &[0x5A; 20]).unwrap();
            assert_eq!(sealed.len(), 8 + 24);
            assert_eq!(block_sized.open(&key, &sealed).unwrap(), vec![0x5A; 20]);
        }
    }

    #[test]
    fn test_block_aligned_plaintext_gets_full_pad_block() {
        let codec = CbcCodec::default();
        let key = key_of(KeySize::Triple);
        let sealed = codec.seal(&key, &[1u8; 16]).unwrap();
        assert_eq!(sealed.len(), 24 + 24);
    }

    #[test]
    fn test_seal_is_randomized() {
        let codec = CbcCodec::default();
        let key = key_of(KeySize::Double);

        let a = codec.seal(&key, b"same input").unwrap();
        let b = codec.seal(&key, b"same input").unwrap();

        assert_ne!(a, b, "fresh IV per call");
        assert_ne!(a[..16], b[..16]);
        assert_eq!(codec.open(&key, &a).unwrap(), codec.open(&key, &b).unwrap());
    }

    #[test]
    fn test_des_known_answer() {
        // FIPS 46 worked example: K=133457799BBCDFF1, P=0123456789ABCDEF -> C=85E813540F0AB405.
        // With a zero IV the first CBC block equals the ECB block. Repeating K
        // for two- and three-key Triple-DES degenerates to single DES.
        let codec = CbcCodec::new(IvLength::BlockSize);
        let k = hex("133457799BBCDFF1");
        let expected = hex("85E813540F0AB405");

        for repeats in [1usize, 2, 3] {
            let key = SymmetricKey::from_bytes(k.repeat(repeats)).unwrap();
            let sealed = codec
                .seal_with_iv(&key, vec![0u8; 8], &hex("0123456789ABCDEF"))
                .unwrap();
            assert_eq!(&sealed[8..16], expected.as_slice(), "{repeats}-key");
        }
    }

    #[test]
    fn test_open_wrong_key() {
        let codec = CbcCodec::default();
        let plaintext = b"secret data that spans several blocks";
        let sealed = codec.seal(&key_of(KeySize::Double), plaintext).unwrap();

        match codec.open(&key_of(KeySize::Double), &sealed) {
            Err(e) => assert!(matches!(e, HcryptError::Padding)),
            Ok(garbage) => assert_ne!(garbage, plaintext),
        }
    }

    #[test]
    fn test_tampered_last_byte() {
        let codec = CbcCodec::default();
        let key = key_of(KeySize::Single);
        let plaintext = b"secret data";

        let mut sealed = codec.seal(&key, plaintext).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;

        match codec.open(&key, &sealed) {
            Err(e) => assert!(matches!(e, HcryptError::Padding)),
            Ok(altered) => assert_ne!(altered, plaintext),
        }
    }

    #[test]
    fn test_tampered_body_never_returns_original() {
        let codec = CbcCodec::default();
        let key = key_of(KeySize::Triple);
        let plaintext = vec![0x42u8; 40];
        let sealed = codec.seal(&key, &plaintext).unwrap();

        for i in 24..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            if let Ok(out) = codec.open(&key, &tampered) {
                assert_ne!(out, plaintext, "flip at {i} went unnoticed");
            }
        }
    }

    #[test]
    fn test_open_too_short() {
        let codec = CbcCodec::default();
        let key = key_of(KeySize::Triple);
        let err = codec.open(&key, &[0u8; 24]).unwrap_err();
        assert!(matches!(err, HcryptError::MalformedCiphertext(_)));
    }

    #[test]
    fn test_open_partial_block() {
        let codec = CbcCodec::default();
        let key = key_of(KeySize::Single);
        let mut sealed = codec.seal(&key, b"twelve bytes").unwrap();
        sealed.pop();
        let err = codec.open(&key, &sealed).unwrap_err();
        assert!(matches!(err, HcryptError::MalformedCiphertext(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn seal_open_roundtrip(
            data in proptest::collection::vec(any::<u8>(), 0..=2048),
            size_idx in 0usize..3,
            block_sized in any::<bool>(),
        ) {
            let size = KeySize::ALL[size_idx];
            let codec = CbcCodec::new(if block_sized { IvLength::BlockSize } else { IvLength::KeySize });
            let key = key_of(size);

            let sealed = codec.seal(&key, &data).unwrap();
            prop_assert_eq!(sealed.len(), codec.ciphertext_len(size, data.len()));
            prop_assert_eq!(codec.open(&key, &sealed).unwrap(), data);
        }
    }
}
