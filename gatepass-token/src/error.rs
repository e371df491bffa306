use thiserror::Error;

/// Errors produced when building, signing, or verifying scoped tokens.
///
/// Each variant is a distinct, inspectable failure kind; none are retried or
/// recovered inside this crate. The caller (typically an HTTP authentication
/// adapter) decides how each maps to a protocol-level response.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Token construction was given structurally invalid data: an unsupported
    /// method, a prefix without a leading slash, a negative TTL, or a subject
    /// without an identifier.
    #[error("invalid token data: {0}")]
    Validation(String),

    /// MAC verification failed: the token is corrupt, forged, or was signed
    /// with a different secret. Carries no detail about which, so callers
    /// cannot distinguish structural from cryptographic failure.
    #[error("bad token signature")]
    BadSignature,

    /// The signature is valid but the token's validity window has elapsed.
    #[error("token has expired")]
    SignatureExpired,

    /// Signature and expiry are fine, but the requested method and path fall
    /// outside the token's granted scope.
    #[error("{0}")]
    Scope(String),

    /// The subject identifier embedded in a verified payload does not resolve
    /// to a known principal.
    #[error("{0}")]
    SubjectResolution(String),
}

impl TokenError {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        TokenError::Validation(message.into())
    }

    /// Create a new scope error
    pub fn scope(message: impl Into<String>) -> Self {
        TokenError::Scope(message.into())
    }

    /// Create a new subject resolution error
    pub fn subject_resolution(message: impl Into<String>) -> Self {
        TokenError::SubjectResolution(message.into())
    }
}
