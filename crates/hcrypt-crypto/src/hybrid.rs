//! Hybrid cryptosystem: key lifecycle plus file encryption/decryption
//!
//! Nothing is cached between calls. Every encryption and decryption re-reads
//! the wrapped symmetric key and the private key from disk, so re-running
//! [`HybridCryptosystem::key_generation`] takes effect immediately and
//! invalidates ciphertexts produced under the previous key.
//!
//! Key files are a single unversioned resource: callers that share one key
//! set across threads must serialize all operations on it.

use std::path::{Path, PathBuf};

use hcrypt_core::{
    Action, HcryptConfig, HcryptError, HcryptResult, IvLength, KeyPaths, KeySize, KeyState,
};
use hcrypt_store::FileStore;
use tracing::{debug, info};

use crate::cipher::CbcCodec;
use crate::keys::{ensure_size, generate_symmetric_key, SymmetricKey};
use crate::wrap::{
    private_key_from_pem, private_key_to_pem, public_key_to_pem, unwrap_key, wrap_key, KeyPair,
};

#[derive(Debug, Clone)]
pub struct HybridCryptosystem {
    paths: KeyPaths,
    key_size: KeySize,
    codec: CbcCodec,
    store: FileStore,
}

impl HybridCryptosystem {
    pub fn new(paths: KeyPaths, key_size: KeySize, iv_length: IvLength) -> HcryptResult<Self> {
        paths.validate()?;
        Ok(Self {
            paths,
            key_size,
            codec: CbcCodec::new(iv_length),
            store: FileStore::new(),
        })
    }

    pub fn from_config(config: &HcryptConfig) -> HcryptResult<Self> {
        Self::new(config.keys.expanded(), config.key_size, config.iv_length)
    }

    /// Replace the default (fsyncing) file store.
    pub fn with_store(mut self, store: FileStore) -> Self {
        self.store = store;
        self
    }

    pub fn paths(&self) -> &KeyPaths {
        &self.paths
    }

    pub fn key_size(&self) -> KeySize {
        self.key_size
    }

    pub fn codec(&self) -> &CbcCodec {
        &self.codec
    }

    pub fn state(&self) -> KeyState {
        if self.store.exists(&self.paths.symmetric_key) && self.store.exists(&self.paths.private_key)
        {
            KeyState::Initialized
        } else {
            KeyState::Uninitialized
        }
    }

    /// Generate a fresh symmetric key and RSA keypair and persist the public
    /// key, private key and wrapped symmetric key. All three files are
    /// replaced together or not at all.
    pub fn key_generation(&self) -> HcryptResult<()> {
        info!(key_size = self.key_size.bytes(), "generating keys");

        let symmetric = generate_symmetric_key(self.key_size);
        let keypair = KeyPair::generate()?;
        let public_pem = public_key_to_pem(&keypair.public)?;
        let private_pem = private_key_to_pem(&keypair.private)?;
        let wrapped = wrap_key(&keypair.public, &symmetric)?;
        debug!(wrapped_len = wrapped.len(), "symmetric key wrapped");

        let mut batch = self.store.batch();
        batch.stage(&self.paths.public_key, public_pem.as_bytes())?;
        batch.stage(&self.paths.private_key, private_pem.as_bytes())?;
        batch.stage(&self.paths.symmetric_key, &wrapped)?;
        batch.commit()?;

        info!(
            public_key = %self.paths.public_key.display(),
            private_key = %self.paths.private_key.display(),
            symmetric_key = %self.paths.symmetric_key.display(),
            "keys generated"
        );
        Ok(())
    }

    /// Encrypt the file at `src` into `dst`.
    pub fn encryption(&self, src: &Path, dst: &Path) -> HcryptResult<()> {
        self.run(Action::Encrypt, src, dst)
    }

    /// Decrypt the file at `src` into `dst`.
    pub fn decryption(&self, src: &Path, dst: &Path) -> HcryptResult<()> {
        self.run(Action::Decrypt, src, dst)
    }

    /// Transform `src` into `dst`. `dst` is only replaced on success.
    pub fn run(&self, action: Action, src: &Path, dst: &Path) -> HcryptResult<()> {
        let key = self.load_symmetric_key()?;
        let input = self.store.read(src)?;

        let output = match action {
            Action::Encrypt => self.codec.seal(&key, &input)?,
            Action::Decrypt => self.codec.open(&key, &input)?,
        };
        self.store.write(dst, &output)?;

        info!(
            %action,
            src = %src.display(),
            dst = %dst.display(),
            input_bytes = input.len(),
            output_bytes = output.len(),
            "file processed"
        );
        Ok(())
    }

    fn load_symmetric_key(&self) -> HcryptResult<SymmetricKey> {
        let wrapped = self.read_key_artifact(&self.paths.symmetric_key)?;
        let private_pem = zeroize::Zeroizing::new(self.read_key_artifact(&self.paths.private_key)?);
        let private = private_key_from_pem(&private_pem)?;

        let key = unwrap_key(&private, &wrapped)?;
        ensure_size(&key, self.key_size)?;
        Ok(key)
    }

    /// Read a key file, reporting a missing file as a key-state error.
    fn read_key_artifact(&self, path: &Path) -> HcryptResult<Vec<u8>> {
        self.store.read(path).map_err(|e| match e {
            HcryptError::Io { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
                HcryptError::KeysNotFound { path }
            }
            other => other,
        })
    }
}

/// Default key paths rooted in `dir`, as laid out by `hcrypt generate-keys`.
pub fn key_paths_in(dir: &Path) -> KeyPaths {
    let defaults = KeyPaths::default();
    let file_name = |p: &PathBuf| dir.join(p.file_name().unwrap_or(p.as_os_str()));
    KeyPaths {
        symmetric_key: file_name(&defaults.symmetric_key),
        private_key: file_name(&defaults.private_key),
        public_key: file_name(&defaults.public_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcrypt_core::ErrorKind;
    use tempfile::TempDir;

    fn system(dir: &Path, size: KeySize) -> HybridCryptosystem {
        HybridCryptosystem::new(key_paths_in(dir), size, IvLength::KeySize)
            .unwrap()
            .with_store(FileStore::without_fsync())
    }

    #[test]
    fn test_key_paths_in() {
        let paths = key_paths_in(Path::new("/srv/keys"));
        assert_eq!(paths.symmetric_key, PathBuf::from("/srv/keys/symmetric.key"));
        assert_eq!(paths.private_key, PathBuf::from("/srv/keys/private.pem"));
        assert_eq!(paths.public_key, PathBuf::from("/srv/keys/public.pem"));
    }

    #[test]
    fn test_new_rejects_invalid_paths() {
        let mut paths = key_paths_in(Path::new("/srv/keys"));
        paths.public_key = PathBuf::new();
        let err = HybridCryptosystem::new(paths, KeySize::Double, IvLength::KeySize).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_uninitialized_state() {
        let tmp = TempDir::new().unwrap();
        let hc = system(tmp.path(), KeySize::Double);
        assert_eq!(hc.state(), KeyState::Uninitialized);

        let src = tmp.path().join("plain.txt");
        std::fs::write(&src, b"data").unwrap();
        let err = hc.encryption(&src, &tmp.path().join("out.bin")).unwrap_err();
        assert!(matches!(err, HcryptError::KeysNotFound { .. }), "{err}");
    }

    #[test]
    fn test_from_config_uses_config_values() {
        let config = HcryptConfig {
            key_size: KeySize::Triple,
            iv_length: IvLength::BlockSize,
            ..HcryptConfig::default()
        };
        let hc = HybridCryptosystem::from_config(&config).unwrap();
        assert_eq!(hc.key_size(), KeySize::Triple);
        assert_eq!(hc.codec().iv_length(), IvLength::BlockSize);
        assert_eq!(hc.paths().private_key, PathBuf::from("keys/private.pem"));
    }
}
