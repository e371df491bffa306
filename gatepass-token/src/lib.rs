//! # Gatepass Token
//!
//! Core library for temporary permission-scoped API tokens.
//!
//! A token grants a specific subject a restricted subset of HTTP-style
//! access (method + path-prefix pairs) for a bounded time window, optionally
//! tagged with a recipient label for audit tracking. All authorization state
//! lives in the signed string itself: there is no server-side session store,
//! and verification needs nothing but the shared signing secret and a
//! subject lookup. A token never widens its subject's permissions within the
//! host system; it only narrows them.
//!
//! This crate has no networking dependencies. Extracting token strings from
//! requests and mapping error kinds onto protocol responses is the job of
//! the host framework's authentication adapter.
//!
//! ## Features
//!
//! - Token construction: validated, immutable grants built directly or via
//!   [`TokenBuilder`]
//! - Signing: compact tamper-evident strings (HMAC-SHA256, url-safe base64)
//! - Verification: signature, expiry, and subject resolution in one call
//! - Scope checks: encoding-agnostic path-prefix authorization
//!
//! ## Usage
//!
//! ```
//! use gatepass_token::{Method, SigningKey, Subject, Token, TokenCodec, TokenError};
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
//! fn main() -> Result<(), TokenError> {
//!     let user = User { id: "42".to_string() };
//!     let token = Token::builder(user.clone())
//!         .grant(Method::Get, "/api/v1/reports")
//!         .ttl_seconds(600)
//!         .recipient("nightly-export-job")
//!         .build()?;
//!
//!     let codec = TokenCodec::new(SigningKey::new("a-high-entropy-secret-shared-by-issuers"));
//!     let signed = codec.encode(&token)?;
//!
//!     // On the verifying side:
//!     let token = codec.decode(&signed, |id| {
//!         if id == "42" {
//!             Ok(user.clone())
//!         } else {
//!             Err(TokenError::subject_resolution("No such user"))
//!         }
//!     })?;
//!     let (subject, _token) = token.authorize(Method::Get, "/api/v1/reports/2026")?;
//!     assert_eq!(subject.id, "42");
//!     Ok(())
//! }
//! ```

mod codec;
mod error;
mod normalize;
mod token;
mod utils;

pub use codec::{Clock, SigningKey, SystemClock, TokenCodec};
pub use error::TokenError;
pub use normalize::iri_to_uri;
pub use token::{Method, Scope, Subject, Token, TokenBuilder, DEFAULT_TTL_SECONDS};

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestUser {
        id: String,
    }

    impl Subject for TestUser {
        fn subject_id(&self) -> String {
            self.id.clone()
        }
    }

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now(&self) -> i64 {
            self.0
        }
    }

    fn codec_at(now: i64) -> TokenCodec {
        TokenCodec::with_clock(
            SigningKey::new(b"integration-test-secret-0123456789ab".to_vec()),
            FixedClock(now),
        )
    }

    fn user_42() -> TestUser {
        TestUser {
            id: "42".to_string(),
        }
    }

    fn resolve(id: &str) -> Result<TestUser, TokenError> {
        if id == "42" {
            Ok(user_42())
        } else {
            Err(TokenError::subject_resolution("No such user"))
        }
    }

    // Subject 42, GET /bar + POST /foo, ttl 10s, recipient "svc-a": encode,
    // decode, and exercise the scope boundary from both sides.
    #[test]
    fn test_issue_verify_authorize_flow() {
        let token = Token::builder(user_42())
            .grant(Method::Get, "/bar")
            .grant(Method::Post, "/foo")
            .ttl_seconds(10)
            .recipient("svc-a")
            .build()
            .unwrap();

        let codec = codec_at(50_000);
        let signed = codec.encode(&token).unwrap();
        let decoded = codec.decode(&signed, resolve).unwrap();
        assert_eq!(decoded, token);
        assert_eq!(decoded.recipient(), Some("svc-a"));

        let (subject, granted) = decoded.authorize(Method::Post, "/foo/nested").unwrap();
        assert_eq!(subject.id, "42");
        assert_eq!(granted, &decoded);

        assert!(matches!(
            decoded.authorize(Method::Get, "/foo"),
            Err(TokenError::Scope(_))
        ));
    }

    #[test]
    fn test_normalization_survives_the_wire() {
        let token = Token::builder(user_42())
            .grant(Method::Get, "/tést")
            .ttl_seconds(10)
            .build()
            .unwrap();

        let codec = codec_at(50_000);
        let signed = codec.encode(&token).unwrap();
        let decoded = codec.decode(&signed, resolve).unwrap();

        assert!(decoded.authorize(Method::Get, "/tést/x").is_ok());
        assert!(decoded.authorize(Method::Get, "/t%C3%A9st/x").is_ok());
    }

    #[test]
    fn test_decoded_token_rejects_out_of_scope_requests() {
        let token = Token::builder(user_42())
            .grant(Method::Get, "/foo")
            .ttl_seconds(10)
            .build()
            .unwrap();

        let codec = codec_at(50_000);
        let decoded = codec
            .decode(&codec.encode(&token).unwrap(), resolve)
            .unwrap();

        match decoded.authorize(Method::Get, "/secret") {
            Err(TokenError::Scope(msg)) => {
                assert_eq!(msg, "Endpoint interaction not permitted by token")
            }
            other => panic!("expected Scope error, got {:?}", other),
        }
        assert!(decoded.authorize(Method::Delete, "/foo").is_err());
    }

    #[test]
    fn test_error_kinds_are_distinguishable() {
        let codec = codec_at(50_000);
        let token = Token::builder(user_42())
            .grant(Method::Get, "/foo")
            .ttl_seconds(0)
            .build()
            .unwrap();
        let signed = codec.encode(&token).unwrap();

        assert!(matches!(
            codec.decode::<TestUser, _>("badtoken", resolve),
            Err(TokenError::BadSignature)
        ));
        assert!(matches!(
            codec_at(50_001).decode::<TestUser, _>(&signed, resolve),
            Err(TokenError::SignatureExpired)
        ));
        assert!(matches!(
            codec.decode::<TestUser, _>(&signed, |_| Err(TokenError::subject_resolution(
                "No such user"
            ))),
            Err(TokenError::SubjectResolution(_))
        ));
    }
}
