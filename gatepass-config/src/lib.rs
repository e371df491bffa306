//! # Gatepass Config
//!
//! Configuration management for Gatepass scoped tokens.
//!
//! The token core takes its signing secret and clock as explicit
//! constructor parameters; this crate is only concerned with getting that
//! secret (and a few issuer-side knobs) from the host environment into the
//! process: files, environment variables, a builder, or a process-wide
//! default.
//!
//! ## Usage
//!
//! ```no_run
//! use gatepass_config::GatepassConfig;
//!
//! // From environment variables: GATEPASS_SIGNING_SECRET or
//! // GATEPASS_SIGNING_SECRET_FILE, plus optional GATEPASS_DEFAULT_TTL_SECONDS.
//! let config = GatepassConfig::from_env_or_file("GATEPASS")
//!     .expect("failed to load configuration from environment");
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Minimum accepted signing-secret length, in bytes.
///
/// Length is the only entropy proxy a configuration layer can check; the
/// secret itself must come from a CSPRNG or a secret manager.
pub const MIN_SECRET_LEN: usize = 32;

/// Configuration for Gatepass token issuance and verification.
///
/// Holds the shared signing secret and issuer-side defaults. It can be
/// created manually, through [`GatepassConfigBuilder`], or loaded from
/// JSON/TOML files and environment variables.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatepassConfig {
    /// Shared secret used to sign and verify tokens. High-entropy, known
    /// only to trusted issuers and verifiers.
    pub signing_secret: String,
    /// Validity window, in seconds, applied by issuers that do not set one
    /// per token.
    #[serde(default)]
    pub default_ttl_seconds: Option<i64>,
}

impl fmt::Debug for GatepassConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatepassConfig")
            .field("signing_secret", &"..")
            .field("default_ttl_seconds", &self.default_ttl_seconds)
            .finish()
    }
}

/// Builder for [`GatepassConfig`].
#[derive(Default, Debug)]
pub struct GatepassConfigBuilder {
    signing_secret: Option<String>,
    default_ttl_seconds: Option<i64>,
}

impl GatepassConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder from an existing configuration
    pub fn from_config(config: &GatepassConfig) -> Self {
        GatepassConfigBuilder {
            signing_secret: Some(config.signing_secret.clone()),
            default_ttl_seconds: config.default_ttl_seconds,
        }
    }

    /// Set the shared signing secret
    pub fn signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    /// Set the issuer-side default validity window, in seconds
    pub fn default_ttl_seconds(mut self, ttl: i64) -> Self {
        self.default_ttl_seconds = Some(ttl);
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is missing, too short, or the default
    /// TTL is negative.
    pub fn build(self) -> Result<GatepassConfig, ConfigError> {
        let config = GatepassConfig {
            signing_secret: self.signing_secret.ok_or(ConfigError::MissingSecret)?,
            default_ttl_seconds: self.default_ttl_seconds,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Errors that can occur when working with Gatepass configuration
#[derive(Debug)]
pub enum ConfigError {
    MissingSecret,
    WeakSecret(usize),
    InvalidTtl(i64),
    IOError(String),
    ParseError(String),
    AlreadyInitialized,
    EnvVarError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingSecret => {
                write!(f, "Signing secret is required but was not provided. Please supply a high-entropy shared secret.")
            }
            ConfigError::WeakSecret(len) => {
                write!(
                    f,
                    "Signing secret is too short ({} bytes). At least {} bytes are required.",
                    len, MIN_SECRET_LEN
                )
            }
            ConfigError::InvalidTtl(ttl) => {
                write!(
                    f,
                    "Invalid default TTL: {}. The value must be a non-negative number of seconds.",
                    ttl
                )
            }
            ConfigError::IOError(e) => {
                write!(f, "I/O error occurred while reading configuration: {}. Please check file permissions and paths.", e)
            }
            ConfigError::ParseError(e) => {
                write!(f, "Failed to parse configuration data: {}. Please ensure the configuration format is correct.", e)
            }
            ConfigError::AlreadyInitialized => {
                write!(f, "Global configuration has already been initialized. Call get_default_config() to access it.")
            }
            ConfigError::EnvVarError(e) => {
                write!(f, "Environment variable error: {}. Please ensure all required environment variables are set correctly.", e)
            }
        }
    }
}

impl Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::IOError(error.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::ParseError(error.to_string())
    }
}

#[cfg(feature = "toml")]
impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::ParseError(error.to_string())
    }
}

impl From<std::env::VarError> for ConfigError {
    fn from(error: std::env::VarError) -> Self {
        ConfigError::EnvVarError(error.to_string())
    }
}

impl GatepassConfig {
    /// Create a new configuration with the given signing secret
    pub fn new(signing_secret: impl Into<String>) -> Self {
        GatepassConfig {
            signing_secret: signing_secret.into(),
            default_ttl_seconds: None,
        }
    }

    pub fn builder() -> GatepassConfigBuilder {
        GatepassConfigBuilder::new()
    }

    /// Convert this configuration to a builder for modification
    pub fn to_builder(&self) -> GatepassConfigBuilder {
        GatepassConfigBuilder::from_config(self)
    }

    /// Create a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_content = fs::read_to_string(path)?;
        let config: GatepassConfig = serde_json::from_str(&file_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from a TOML file
    #[cfg(feature = "toml")]
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_content = fs::read_to_string(path)?;
        let config: GatepassConfig = toml::from_str(&file_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from environment variables
    ///
    /// The environment variables are named with the given prefix followed by:
    /// - `SIGNING_SECRET`: the shared signing secret (content, not a path)
    /// - `DEFAULT_TTL_SECONDS`: issuer-side default validity window (optional)
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required variable is missing or a value
    /// fails validation.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let signing_secret = env::var(format!("{}_SIGNING_SECRET", prefix))?;
        let default_ttl_seconds = read_ttl_var(prefix)?;

        let config = GatepassConfig {
            signing_secret,
            default_ttl_seconds,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from environment variables or files
    ///
    /// Like [`GatepassConfig::from_env`], but if `{PREFIX}_SIGNING_SECRET_FILE`
    /// is present the secret is read from the file at that path instead of
    /// from the inline variable. Trailing newlines are stripped, so secrets
    /// written by `echo` or a secret-manager mount verify identically to
    /// inline ones.
    pub fn from_env_or_file(prefix: &str) -> Result<Self, ConfigError> {
        let signing_secret = match env::var(format!("{}_SIGNING_SECRET_FILE", prefix)) {
            Ok(secret_file) => {
                let content = fs::read_to_string(&secret_file).map_err(|e| {
                    ConfigError::IOError(format!("Failed to read secret file: {}", e))
                })?;
                content.trim_end_matches(['\r', '\n']).to_string()
            }
            Err(std::env::VarError::NotPresent) => {
                env::var(format!("{}_SIGNING_SECRET", prefix))?
            }
            Err(e) => return Err(e.into()),
        };
        let default_ttl_seconds = read_ttl_var(prefix)?;

        let config = GatepassConfig {
            signing_secret,
            default_ttl_seconds,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks that the signing secret is present and long enough, and that
    /// the default TTL, when set, is non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.signing_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret(self.signing_secret.len()));
        }
        if let Some(ttl) = self.default_ttl_seconds {
            if ttl < 0 {
                return Err(ConfigError::InvalidTtl(ttl));
            }
        }
        Ok(())
    }
}

fn read_ttl_var(prefix: &str) -> Result<Option<i64>, ConfigError> {
    match env::var(format!("{}_DEFAULT_TTL_SECONDS", prefix)) {
        Ok(ttl_str) => Ok(Some(ttl_str.parse::<i64>().map_err(|_| {
            ConfigError::ParseError(format!("Invalid default TTL: {}", ttl_str))
        })?)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// Global configuration singleton
static DEFAULT_CONFIG: OnceLock<GatepassConfig> = OnceLock::new();

/// Set the default global configuration
///
/// Used by hosts that load configuration once at startup and hand it to
/// issuing and verifying code paths implicitly. Returns an error if a
/// default configuration is already set.
pub fn set_default_config(config: GatepassConfig) -> Result<(), ConfigError> {
    config.validate()?;
    DEFAULT_CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)
}

/// Get the default global configuration, if set
pub fn get_default_config() -> Option<&'static GatepassConfig> {
    DEFAULT_CONFIG.get()
}

/// Try to load a default configuration from standard locations
///
/// This function attempts to load a configuration from:
/// 1. Environment variables with the prefix "GATEPASS"
/// 2. A file at ./gatepass.json
/// 3. A file at ~/.gatepass/config.json
/// 4. A file at /etc/gatepass/config.json
/// 5. If the "toml" feature is enabled, TOML files at the same paths
///
/// Returns None if no configuration could be found.
pub fn try_load_default_config() -> Option<GatepassConfig> {
    if let Ok(config) = GatepassConfig::from_env_or_file("GATEPASS") {
        return Some(config);
    }

    let paths = [
        "./gatepass.json",
        "~/.gatepass/config.json",
        "/etc/gatepass/config.json",
    ];

    for path in paths.iter() {
        if let Some(expanded_path) = expand_home(path) {
            if expanded_path.exists() {
                if let Ok(config) = GatepassConfig::from_file(&expanded_path) {
                    return Some(config);
                }
            }
        }
    }

    #[cfg(feature = "toml")]
    {
        let toml_paths = [
            "./gatepass.toml",
            "~/.gatepass/config.toml",
            "/etc/gatepass/config.toml",
        ];

        for path in toml_paths.iter() {
            if let Some(expanded_path) = expand_home(path) {
                if expanded_path.exists() {
                    if let Ok(config) = GatepassConfig::from_toml(&expanded_path) {
                        return Some(config);
                    }
                }
            }
        }
    }

    None
}

fn expand_home(path: &str) -> Option<std::path::PathBuf> {
    if let Some(stripped) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(stripped))
    } else {
        Some(Path::new(path).to_path_buf())
    }
}
