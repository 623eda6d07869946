use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HcryptError, HcryptResult};
use crate::types::{IvLength, KeySize};

/// Top-level configuration (loaded from hcrypt.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HcryptConfig {
    /// Symmetric key length in bytes: 8, 16 or 24
    pub key_size: KeySize,
    /// Length of the IV field prefixing each ciphertext
    pub iv_length: IvLength,
    pub keys: KeyPaths,
    pub log: LogConfig,
}

/// Locations of the three key artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPaths {
    /// RSA-wrapped symmetric key (raw OAEP ciphertext)
    pub symmetric_key: PathBuf,
    /// Unencrypted PKCS#1 PEM private key
    pub private_key: PathBuf,
    /// SubjectPublicKeyInfo PEM public key
    pub public_key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for KeyPaths {
    fn default() -> Self {
        Self {
            symmetric_key: PathBuf::from("keys/symmetric.key"),
            private_key: PathBuf::from("keys/private.pem"),
            public_key: PathBuf::from("keys/public.pem"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl KeyPaths {
    /// Same paths with a leading `~/` replaced by `$HOME`.
    pub fn expanded(&self) -> Self {
        Self {
            symmetric_key: expand_tilde(&self.symmetric_key),
            private_key: expand_tilde(&self.private_key),
            public_key: expand_tilde(&self.public_key),
        }
    }

    fn named(&self) -> [(&'static str, &Path); 3] {
        [
            ("symmetric_key", self.symmetric_key.as_path()),
            ("private_key", self.private_key.as_path()),
            ("public_key", self.public_key.as_path()),
        ]
    }

    pub fn validate(&self) -> HcryptResult<()> {
        for (name, path) in self.named() {
            if path.as_os_str().is_empty() {
                return Err(HcryptError::Config(format!("keys.{name} path is empty")));
            }
        }
        let [(_, a), (_, b), (_, c)] = self.named();
        if a == b || a == c || b == c {
            return Err(HcryptError::Config(
                "key artifact paths must be distinct".into(),
            ));
        }
        Ok(())
    }
}

impl HcryptConfig {
    pub fn from_toml_str(content: &str) -> HcryptResult<Self> {
        let config: HcryptConfig =
            toml::from_str(content).map_err(|e| HcryptError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> HcryptResult<Self> {
        if !path.exists() {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| HcryptError::io(path, e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            HcryptError::Config(msg) => {
                HcryptError::Config(format!("parsing config {}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn validate(&self) -> HcryptResult<()> {
        self.keys.validate()
    }

    pub fn to_toml_string(&self) -> HcryptResult<String> {
        toml::to_string_pretty(self).map_err(|e| HcryptError::Config(e.to_string()))
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
