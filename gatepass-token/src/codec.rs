use std::fmt;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::TokenError;
use crate::token::{Scope, Subject, Token};
use crate::utils::{decode_segment, encode_segment};

type HmacSha256 = Hmac<Sha256>;

/// Secret key for the token MAC.
///
/// Shared only by trusted issuers and verifiers; must be high-entropy.
/// Zeroed on drop and redacted from `Debug` output.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        SigningKey(secret.into())
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        // Zeroize on drop
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Time source for issue timestamps and expiry checks.
///
/// Injectable so issuance and verification are deterministic under test.
pub trait Clock: Send + Sync {
    /// Current Unix time, in whole seconds.
    fn now(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Serialized form of a token's fields.
///
/// The scope map keeps a stable key order, so a given token always encodes
/// to the same payload bytes; that stability serves reproducible tests, not
/// security.
#[derive(Serialize, Deserialize)]
struct TokenPayload {
    subject: String,
    ttl_seconds: i64,
    scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recipient: Option<String>,
}

/// Signs tokens into their durable string form and verifies them back.
///
/// The signed string is a single printable, url-safe token with no embedded
/// whitespace, fit for an `Authorization` header value or a query-string
/// parameter. Treat its layout as opaque: three unpadded base64url segments
/// `payload.issued_at.mac`, where the MAC (HMAC-SHA256 under the shared
/// secret) covers the first two segments. Because the issue timestamp is
/// inside the MAC input, neither the validity window nor its start can be
/// altered by a holder who cannot sign.
///
/// The codec is stateless beyond its read-only key and clock; any number of
/// encode/decode calls may run concurrently.
pub struct TokenCodec {
    key: SigningKey,
    clock: Box<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec using wall-clock time.
    pub fn new(key: SigningKey) -> Self {
        TokenCodec::with_clock(key, SystemClock)
    }

    /// Create a codec with an explicit time source.
    pub fn with_clock(key: SigningKey, clock: impl Clock + 'static) -> Self {
        TokenCodec {
            key,
            clock: Box::new(clock),
        }
    }

    /// Serialize and sign a token, stamping it with the clock's current
    /// time as the issue instant.
    pub fn encode<S: Subject>(&self, token: &Token<S>) -> Result<String, TokenError> {
        let payload = TokenPayload {
            subject: token.subject().subject_id(),
            ttl_seconds: token.ttl_seconds(),
            scope: token.scope().clone(),
            recipient: token.recipient().map(str::to_owned),
        };
        let payload_json = serde_json::to_vec(&payload)
            .map_err(|e| TokenError::validation(format!("failed to serialize payload: {}", e)))?;
        let issued_at = self.clock.now();

        let payload_segment = encode_segment(&payload_json);
        let timestamp_segment = encode_segment(&issued_at.to_be_bytes());
        let mac_segment = encode_segment(&self.mac_over(&payload_segment, &timestamp_segment));

        debug!(
            "issued token for subject {} with ttl {}s",
            payload.subject, payload.ttl_seconds
        );
        Ok(format!(
            "{}.{}.{}",
            payload_segment, timestamp_segment, mac_segment
        ))
    }

    /// Verify a signed string and reconstruct its token.
    ///
    /// Verification order: signature integrity, then expiry, then subject
    /// resolution, then structural validation. The declared `ttl_seconds`
    /// is read from the payload only after the MAC has proven the payload
    /// untampered, so trusting the token's own stated window is safe.
    ///
    /// `resolve_subject` maps the embedded identifier to a live principal
    /// (e.g. a datastore lookup); it should fail with
    /// [`TokenError::SubjectResolution`], which is propagated unchanged.
    ///
    /// # Errors
    ///
    /// * [`TokenError::BadSignature`] - the string is malformed, corrupt,
    ///   forged, or signed with a different secret
    /// * [`TokenError::SignatureExpired`] - the MAC is valid but the issue
    ///   time plus the declared TTL has elapsed
    /// * [`TokenError::SubjectResolution`] - the embedded subject identifier
    ///   no longer resolves to a principal
    /// * [`TokenError::Validation`] - the verified payload fails structural
    ///   validation
    pub fn decode<S, F>(&self, signed: &str, resolve_subject: F) -> Result<Token<S>, TokenError>
    where
        S: Subject,
        F: FnOnce(&str) -> Result<S, TokenError>,
    {
        let parts: Vec<&str> = signed.split('.').collect();
        if parts.len() != 3 {
            return Err(TokenError::BadSignature);
        }
        let (payload_segment, timestamp_segment, mac_segment) = (parts[0], parts[1], parts[2]);

        let mac = decode_segment(mac_segment)?;
        let expected = self.mac_over(payload_segment, timestamp_segment);
        if !bool::from(expected[..].ct_eq(&mac[..])) {
            return Err(TokenError::BadSignature);
        }

        let timestamp_bytes = decode_segment(timestamp_segment)?;
        let timestamp_bytes: [u8; 8] = timestamp_bytes
            .as_slice()
            .try_into()
            .map_err(|_| TokenError::BadSignature)?;
        let issued_at = i64::from_be_bytes(timestamp_bytes);

        let payload_json = decode_segment(payload_segment)?;
        let payload: TokenPayload = serde_json::from_slice(&payload_json)
            .map_err(|e| TokenError::validation(format!("malformed payload: {}", e)))?;

        if self.clock.now() - issued_at > payload.ttl_seconds {
            return Err(TokenError::SignatureExpired);
        }

        let subject = resolve_subject(&payload.subject)?;
        debug!("verified token for subject {}", payload.subject);
        Token::new(subject, payload.scope, payload.ttl_seconds, payload.recipient)
    }

    fn mac_over(&self, payload_segment: &str, timestamp_segment: &str) -> [u8; 32] {
        // Per RFC 2104, HMAC accepts keys of any length, so construction
        // cannot fail for any key slice.
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .unwrap_or_else(|_| HmacSha256::new_from_slice(&[0u8; 32]).unwrap());
        mac.update(payload_segment.as_bytes());
        mac.update(b".");
        mac.update(timestamp_segment.as_bytes());

        let mut output = [0u8; 32];
        output.copy_from_slice(&mac.finalize().into_bytes());
        output
    }
}
