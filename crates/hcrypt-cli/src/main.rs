//! hcrypt: hybrid RSA + Triple-DES file encryption
//!
//! Commands:
//!   generate-keys          - create an RSA keypair and a wrapped symmetric key
//!   encrypt <src> <dst>    - encrypt a file with the stored symmetric key
//!   decrypt <src> <dst>    - decrypt a file produced by `encrypt`
//!   status                 - show whether key material exists
//!   config show            - display the effective configuration

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use hcrypt_core::{Action, ErrorKind, HcryptConfig, HcryptError, IvLength, KeySize, KeyState};
use hcrypt_crypto::{key_paths_in, HybridCryptosystem};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "hcrypt",
    version,
    about = "Hybrid RSA + Triple-DES file encryption",
    long_about = "hcrypt: generate an RSA keypair protecting a Triple-DES key, then encrypt and decrypt files with it"
)]
struct Cli {
    /// Path to hcrypt.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "HCRYPT_CONFIG",
        default_value = "hcrypt.toml",
        global = true
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "HCRYPT_LOG", global = true)]
    log: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "HCRYPT_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(flatten)]
    keys: KeyOverrides,

    #[command(subcommand)]
    command: Commands,
}

/// Per-invocation overrides of the `[keys]` section and key settings
#[derive(Args, Debug, Default)]
struct KeyOverrides {
    /// Symmetric key size in bytes: 8, 16 or 24
    #[arg(long, short = 'k', global = true, value_parser = parse_key_size)]
    key_size: Option<KeySize>,

    /// Length of the IV field prefixing ciphertext files
    #[arg(long, global = true)]
    iv_length: Option<IvLengthArg>,

    /// Directory holding symmetric.key, private.pem and public.pem
    #[arg(long, global = true)]
    key_dir: Option<PathBuf>,

    /// Wrapped symmetric key file (overrides --key-dir)
    #[arg(long, global = true)]
    symmetric_key: Option<PathBuf>,

    /// Private key PEM file (overrides --key-dir)
    #[arg(long, global = true)]
    private_key: Option<PathBuf>,

    /// Public key PEM file (overrides --key-dir)
    #[arg(long, global = true)]
    public_key: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new RSA-2048 keypair and a wrapped symmetric key
    ///
    /// Overwrites existing key material: files encrypted under the previous
    /// key can no longer be decrypted.
    #[command(name = "generate-keys")]
    GenerateKeys,

    /// Encrypt a file
    Encrypt {
        /// Plaintext input file
        src: PathBuf,
        /// Ciphertext output file
        dst: PathBuf,
    },

    /// Decrypt a file
    Decrypt {
        /// Ciphertext input file
        src: PathBuf,
        /// Plaintext output file
        dst: PathBuf,
    },

    /// Show key lifecycle state and key file locations
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file + flags)
    Show,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn from_config(format: &str) -> Self {
        if format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum IvLengthArg {
    /// IV as long as the key (8, 16 or 24 bytes)
    KeySize,
    /// IV of one 8-byte cipher block
    BlockSize,
}

impl From<IvLengthArg> for IvLength {
    fn from(arg: IvLengthArg) -> Self {
        match arg {
            IvLengthArg::KeySize => IvLength::KeySize,
            IvLengthArg::BlockSize => IvLength::BlockSize,
        }
    }
}

fn parse_key_size(s: &str) -> std::result::Result<KeySize, String> {
    let bytes: usize = s
        .parse()
        .map_err(|e| format!("'{s}' is not a byte count: {e}"))?;
    KeySize::try_from(bytes).map_err(|e| e.to_string())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_exists = cli.config.exists();
    let mut config = if config_exists {
        HcryptConfig::load(&cli.config)
            .with_context(|| format!("loading config: {}", cli.config.display()))?
    } else {
        HcryptConfig::default()
    };

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| LogFormat::from_config(&config.log.format));
    init_logging(&level, &format);

    if !config_exists {
        warn!(
            "config file not found: {}  (using defaults)",
            cli.config.display()
        );
    }

    apply_overrides(&mut config, &cli.keys)?;

    let result = run(&cli.command, &config, &cli.config, config_exists);
    if let Err(e) = &result {
        print_hint(e);
    }
    result
}

fn run(
    command: &Commands,
    config: &HcryptConfig,
    config_path: &Path,
    config_exists: bool,
) -> Result<()> {
    let system = || HybridCryptosystem::from_config(config).context("invalid key configuration");

    match command {
        Commands::GenerateKeys => cmd_generate_keys(&system()?),
        Commands::Encrypt { src, dst } => cmd_transform(&system()?, Action::Encrypt, src, dst),
        Commands::Decrypt { src, dst } => cmd_transform(&system()?, Action::Decrypt, src, dst),
        Commands::Status => cmd_status(&system()?),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(config, config_path, config_exists),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Config overrides ──────────────────────────────────────────────────────────

/// Apply command-line overrides on top of the loaded configuration.
///
/// `--key-dir` relocates all three key files; the individual path flags win
/// over it.
fn apply_overrides(config: &mut HcryptConfig, overrides: &KeyOverrides) -> Result<()> {
    if let Some(size) = overrides.key_size {
        config.key_size = size;
    }
    if let Some(iv) = overrides.iv_length {
        config.iv_length = iv.into();
    }
    if let Some(dir) = &overrides.key_dir {
        config.keys = key_paths_in(dir);
    }
    if let Some(p) = &overrides.symmetric_key {
        config.keys.symmetric_key = p.clone();
    }
    if let Some(p) = &overrides.private_key {
        config.keys.private_key = p.clone();
    }
    if let Some(p) = &overrides.public_key {
        config.keys.public_key = p.clone();
    }
    config.validate().context("invalid configuration")?;
    Ok(())
}

fn print_hint(err: &anyhow::Error) {
    let Some(e) = err.downcast_ref::<HcryptError>() else {
        return;
    };
    match e.kind() {
        ErrorKind::KeyState => {
            eprintln!("hint: no usable key material; run `hcrypt generate-keys` (with the same --key-size)");
        }
        ErrorKind::Padding | ErrorKind::Unwrap => {
            eprintln!("hint: the file was not encrypted with the current keys, or it was modified");
        }
        _ => {}
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_generate_keys(hc: &HybridCryptosystem) -> Result<()> {
    if hc.state() == KeyState::Initialized {
        warn!("replacing existing key material; files encrypted under it become undecryptable");
    }

    hc.key_generation().context("generating keys")?;

    let paths = hc.paths();
    println!("Keys generated ({}-byte symmetric key):", hc.key_size());
    println!("  symmetric key: {}", paths.symmetric_key.display());
    println!("  private key:   {}", paths.private_key.display());
    println!("  public key:    {}", paths.public_key.display());
    Ok(())
}

fn cmd_transform(hc: &HybridCryptosystem, action: Action, src: &Path, dst: &Path) -> Result<()> {
    hc.run(action, src, dst).with_context(|| {
        let verb = match action {
            Action::Encrypt => "encrypting",
            Action::Decrypt => "decrypting",
        };
        format!("{verb} {}", src.display())
    })?;

    let bytes = std::fs::metadata(dst).map(|m| m.len()).unwrap_or(0);
    info!(%action, dst = %dst.display(), bytes, "done");
    println!("{action}: {} -> {} ({bytes} bytes)", src.display(), dst.display());
    Ok(())
}

fn cmd_status(hc: &HybridCryptosystem) -> Result<()> {
    let paths = hc.paths();
    let present = |p: &Path| if p.is_file() { "present" } else { "missing" };

    let state = match hc.state() {
        KeyState::Initialized => "initialized",
        KeyState::Uninitialized => "uninitialized (run `hcrypt generate-keys`)",
    };
    println!("state:         {state}");
    println!("key size:      {} bytes", hc.key_size());
    println!("iv length:     {}", hc.codec().iv_length());
    println!(
        "symmetric key: {} [{}]",
        paths.symmetric_key.display(),
        present(&paths.symmetric_key)
    );
    println!(
        "private key:   {} [{}]",
        paths.private_key.display(),
        present(&paths.private_key)
    );
    println!(
        "public key:    {} [{}]",
        paths.public_key.display(),
        present(&paths.public_key)
    );
    Ok(())
}

fn cmd_config_show(config: &HcryptConfig, config_path: &Path, exists: bool) -> Result<()> {
    if exists {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    print!("{}", config.to_toml_string().context("serializing config")?);
    Ok(())
}
