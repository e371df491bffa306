//! # Gatepass
//!
//! Temporary permission-scoped API tokens for Rust services.
//!
//! Gatepass lets a service hand a third party (a script, a microservice, a
//! browser session) a credential that is narrower and shorter-lived than the
//! holder's full account permissions, without provisioning a new account or
//! storing server-side session state. The signed string *is* the token's
//! durable form: subject, scope, validity window, and audit label all round
//! trip through it.
//!
//! This crate combines functionality from:
//! - `gatepass-token`: token construction, signing, verification, and scope
//!   checks
//! - `gatepass-config`: signing-secret configuration management
//!
//! ## Feature Flags
//!
//! - `toml`: Enables configuration loading from TOML files (default)
//!
//! ## Basic Usage
//!
//! ```
//! use gatepass::{codec_from_config, GatepassConfig, Method, Subject, Token, TokenError};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct User {
//!     id: String,
//! }
//!
//! impl Subject for User {
//!     fn subject_id(&self) -> String {
//!         self.id.clone()
//!     }
//! }
//!
//! # fn main() -> Result<(), gatepass::GatepassError> {
//! let config = GatepassConfig::builder()
//!     .signing_secret("a-high-entropy-secret-of-at-least-32-bytes")
//!     .build()?;
//! let codec = codec_from_config(&config)?;
//!
//! let user = User { id: "42".to_string() };
//! let token = Token::builder(user.clone())
//!     .grant(Method::Get, "/api/v1/reports")
//!     .ttl_seconds(600)
//!     .build()?;
//!
//! let signed = codec.encode(&token)?;
//! let verified = codec.decode(&signed, |id| {
//!     if id == "42" {
//!         Ok(user.clone())
//!     } else {
//!         Err(TokenError::subject_resolution("No such user"))
//!     }
//! })?;
//! verified.authorize(Method::Get, "/api/v1/reports/2026")?;
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub use gatepass_token::{
    iri_to_uri, Clock, Method, Scope, SigningKey, Subject, SystemClock, Token, TokenBuilder,
    TokenCodec, TokenError, DEFAULT_TTL_SECONDS,
};

pub use gatepass_config::{
    get_default_config, set_default_config, try_load_default_config, ConfigError, GatepassConfig,
    GatepassConfigBuilder, MIN_SECRET_LEN,
};

/// Errors that can occur in the Gatepass SDK
#[derive(Error, Debug)]
pub enum GatepassError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Token error
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

/// Create a token codec from a validated configuration.
///
/// The codec uses wall-clock time; construct [`TokenCodec`] directly with
/// [`TokenCodec::with_clock`] when a different time source is needed.
pub fn codec_from_config(config: &GatepassConfig) -> Result<TokenCodec, GatepassError> {
    config.validate()?;
    Ok(TokenCodec::new(SigningKey::new(
        config.signing_secret.as_str(),
    )))
}
