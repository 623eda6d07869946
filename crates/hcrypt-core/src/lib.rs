pub mod config;
pub mod error;
pub mod types;

pub use config::{HcryptConfig, KeyPaths, LogConfig};
pub use error::{ErrorKind, HcryptError, HcryptResult};
pub use types::{Action, IvLength, KeySize, KeyState};
