use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TokenError;
use crate::normalize::iri_to_uri;

/// Validity window applied when a token is built without an explicit TTL,
/// in seconds.
pub const DEFAULT_TTL_SECONDS: i64 = 3600;

/// HTTP methods a token scope may grant.
///
/// The set is fixed; anything else (`TRACE`, `CONNECT`, arbitrary strings)
/// is rejected at the parse boundary with [`TokenError::Validation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other => Err(TokenError::validation(format!(
                "unsupported method: {}",
                other
            ))),
        }
    }
}

/// A token's grant map: for each method, the path prefixes the holder may
/// reach. Prefix lists keep their insertion order; the map itself keeps a
/// stable key order so serialized forms are reproducible.
pub type Scope = BTreeMap<Method, Vec<String>>;

/// A principal a token acts on behalf of.
///
/// The issuing side holds a resolved identity object; the serialized token
/// carries only the identifier returned here. The identifier must be
/// non-empty and stable between issuance and verification.
pub trait Subject {
    fn subject_id(&self) -> String;
}

/// An immutable capability grant: subject, method-to-prefix scope map, TTL,
/// and an optional recipient label.
///
/// A token only further restricts what its subject may do; it never widens
/// the subject's permissions within the host system. All fields are fixed at
/// construction, and every scope prefix is normalized once through
/// [`iri_to_uri`] so later matching is encoding-agnostic.
///
/// Two tokens are equal when all normalized fields are structurally equal.
/// Equality exists for tests; it plays no part in any security decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<S: Subject> {
    subject: S,
    scope: Scope,
    ttl_seconds: i64,
    recipient: Option<String>,
}

impl<S: Subject> Token<S> {
    /// Validate and build a token.
    ///
    /// Checks, in order: the subject exposes a non-empty identifier,
    /// `ttl_seconds` is non-negative (zero means "expires immediately" and
    /// is allowed), and every scope prefix begins with a slash. Any
    /// violation fails with [`TokenError::Validation`] naming the field and
    /// the constraint.
    pub fn new(
        subject: S,
        scope: Scope,
        ttl_seconds: i64,
        recipient: Option<String>,
    ) -> Result<Self, TokenError> {
        if subject.subject_id().is_empty() {
            return Err(TokenError::validation(
                "subject must have a non-empty identifier",
            ));
        }
        if ttl_seconds < 0 {
            return Err(TokenError::validation(format!(
                "ttl_seconds must be non-negative, got {}",
                ttl_seconds
            )));
        }
        for (method, prefixes) in &scope {
            for prefix in prefixes {
                if !prefix.starts_with('/') {
                    return Err(TokenError::validation(format!(
                        "scope prefix for {} must begin with a slash, got {:?}",
                        method, prefix
                    )));
                }
            }
        }

        let scope = scope
            .into_iter()
            .map(|(method, prefixes)| {
                let prefixes = prefixes.iter().map(|p| iri_to_uri(p)).collect();
                (method, prefixes)
            })
            .collect();

        Ok(Token {
            subject,
            scope,
            ttl_seconds,
            recipient,
        })
    }

    /// Start building a token for `subject` with the default TTL and an
    /// empty scope.
    pub fn builder(subject: S) -> TokenBuilder<S> {
        TokenBuilder::new(subject)
    }

    /// Check a candidate request against the token's scope.
    ///
    /// The request path is normalized with the same routine applied to scope
    /// prefixes at construction, then compared in list order against the
    /// prefixes granted for `method`; the first prefix the path starts with
    /// wins. A method absent from the scope map grants nothing.
    ///
    /// The match is a plain string-prefix test, not a path-segment-aware
    /// one: a scope of `/foo` also matches `/foobar`. Inherited behavior,
    /// kept as documented.
    ///
    /// On success returns the authenticated subject together with the token
    /// itself; this pair is the single authoritative contract of the check.
    pub fn authorize(&self, method: Method, path: &str) -> Result<(&S, &Token<S>), TokenError> {
        let path = iri_to_uri(path);
        for prefix in self.scope.get(&method).map(Vec::as_slice).unwrap_or(&[]) {
            if path.starts_with(prefix.as_str()) {
                return Ok((&self.subject, self));
            }
        }
        Err(TokenError::scope("Endpoint interaction not permitted by token"))
    }

    pub fn subject(&self) -> &S {
        &self.subject
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Audit label identifying who the token was issued to, when present.
    /// Free text, never validated; adapters attach it to an outbound audit
    /// header such as `X-API-Token-Recipient`.
    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }
}

impl<S: Subject> fmt::Display for Token<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Token subject={} scope={:?} ttl={}>",
            self.subject.subject_id(),
            self.scope,
            self.ttl_seconds
        )
    }
}

/// Builder for [`Token`].
#[derive(Debug)]
pub struct TokenBuilder<S: Subject> {
    subject: S,
    scope: Scope,
    ttl_seconds: i64,
    recipient: Option<String>,
}

impl<S: Subject> TokenBuilder<S> {
    pub fn new(subject: S) -> Self {
        TokenBuilder {
            subject,
            scope: Scope::new(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            recipient: None,
        }
    }

    /// Append a path prefix to the list granted for `method`.
    pub fn grant(mut self, method: Method, prefix: impl Into<String>) -> Self {
        self.scope.entry(method).or_default().push(prefix.into());
        self
    }

    /// Set how long the token remains valid after issuance.
    pub fn ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Set the recipient audit label.
    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Validate and build the token.
    pub fn build(self) -> Result<Token<S>, TokenError> {
        Token::new(self.subject, self.scope, self.ttl_seconds, self.recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestUser {
        id: String,
    }

    impl TestUser {
        fn new(id: &str) -> Self {
            TestUser { id: id.to_string() }
        }
    }

    impl Subject for TestUser {
        fn subject_id(&self) -> String {
            self.id.clone()
        }
    }

    fn scope(entries: &[(Method, &[&str])]) -> Scope {
        entries
            .iter()
            .map(|(method, prefixes)| {
                (*method, prefixes.iter().map(|p| p.to_string()).collect())
            })
            .collect()
    }

    #[test]
    fn test_construct_valid_token() {
        let token = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["/bar"]), (Method::Post, &["/foo"])]),
            10,
            Some("svc-a".to_string()),
        )
        .unwrap();
        assert_eq!(token.ttl_seconds(), 10);
        assert_eq!(token.recipient(), Some("svc-a"));
        assert_eq!(token.scope()[&Method::Get], vec!["/bar".to_string()]);
    }

    #[test]
    fn test_construct_rejects_empty_subject_id() {
        let err = Token::new(TestUser::new(""), Scope::new(), 10, None).unwrap_err();
        match err {
            TokenError::Validation(msg) => assert!(msg.contains("subject"), "{}", msg),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_construct_rejects_negative_ttl() {
        let err = Token::new(TestUser::new("42"), Scope::new(), -1, None).unwrap_err();
        match err {
            TokenError::Validation(msg) => assert!(msg.contains("ttl_seconds"), "{}", msg),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_ttl_is_allowed() {
        assert!(Token::new(TestUser::new("42"), Scope::new(), 0, None).is_ok());
    }

    #[test]
    fn test_construct_rejects_prefix_without_slash() {
        let err = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["foo"])]),
            10,
            None,
        )
        .unwrap_err();
        match err {
            TokenError::Validation(msg) => assert!(msg.contains("slash"), "{}", msg),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_method_is_rejected_at_parse() {
        let err = "TRACE".parse::<Method>().unwrap_err();
        match err {
            TokenError::Validation(msg) => assert!(msg.contains("TRACE"), "{}", msg),
            other => panic!("expected Validation, got {:?}", other),
        }
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
    }

    #[test]
    fn test_authorize_matches_prefix() {
        let token = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["/foo", "/bar"])]),
            10,
            None,
        )
        .unwrap();

        let (user, returned) = token.authorize(Method::Get, "/foo/x").unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(returned, &token);
        assert!(token.authorize(Method::Get, "/bar").is_ok());
    }

    #[test]
    fn test_authorize_rejects_unscoped_path() {
        let token = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["/foo", "/bar"])]),
            10,
            None,
        )
        .unwrap();

        match token.authorize(Method::Get, "/secret") {
            Err(TokenError::Scope(msg)) => {
                assert_eq!(msg, "Endpoint interaction not permitted by token")
            }
            other => panic!("expected Scope error, got {:?}", other),
        }
    }

    #[test]
    fn test_authorize_rejects_method_absent_from_scope() {
        let token = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["/foo"])]),
            10,
            None,
        )
        .unwrap();

        assert!(matches!(
            token.authorize(Method::Post, "/foo"),
            Err(TokenError::Scope(_))
        ));
    }

    #[test]
    fn test_prefix_match_is_not_segment_aware() {
        let token = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["/foo"])]),
            10,
            None,
        )
        .unwrap();

        // Plain string prefixes: "/foo" reaches "/foobar" as well.
        assert!(token.authorize(Method::Get, "/foobar").is_ok());
    }

    #[test]
    fn test_authorize_with_iri_scope_and_encoded_path() {
        let token = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["/tést"])]),
            10,
            None,
        )
        .unwrap();

        assert!(token.authorize(Method::Get, "/tést/some-éndpoint/").is_ok());
        assert!(token
            .authorize(Method::Get, "/t%C3%A9st/some-%C3%A9ndpoint/")
            .is_ok());
    }

    #[test]
    fn test_authorize_with_encoded_scope_and_iri_path() {
        let token = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["/t%C3%A9st"])]),
            10,
            None,
        )
        .unwrap();

        assert!(token.authorize(Method::Get, "/tést/some-éndpoint/").is_ok());
        assert!(token
            .authorize(Method::Get, "/t%C3%A9st/some-%C3%A9ndpoint/")
            .is_ok());
    }

    #[test]
    fn test_token_equality_is_structural() {
        let make = |prefix: &str| {
            Token::new(
                TestUser::new("42"),
                scope(&[(Method::Get, &[prefix])]),
                10,
                None,
            )
            .unwrap()
        };
        let t1 = make("/foo");
        let t2 = make("/foo");
        let t3 = make("/bar");
        assert_eq!(t1, t2);
        assert_ne!(t1, t3);
    }

    #[test]
    fn test_normalized_and_literal_scopes_compare_equal() {
        let literal = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["/tést"])]),
            10,
            None,
        )
        .unwrap();
        let encoded = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["/t%C3%A9st"])]),
            10,
            None,
        )
        .unwrap();
        assert_eq!(literal, encoded);
    }

    #[test]
    fn test_builder_defaults() {
        let token = Token::builder(TestUser::new("42"))
            .grant(Method::Get, "/foo")
            .build()
            .unwrap();
        assert_eq!(token.ttl_seconds(), DEFAULT_TTL_SECONDS);
        assert_eq!(token.recipient(), None);
    }

    #[test]
    fn test_builder_accumulates_grants_in_order() {
        let token = Token::builder(TestUser::new("42"))
            .grant(Method::Get, "/foo")
            .grant(Method::Get, "/bar")
            .grant(Method::Post, "/baz")
            .ttl_seconds(5)
            .recipient("svc-a")
            .build()
            .unwrap();
        assert_eq!(
            token.scope()[&Method::Get],
            vec!["/foo".to_string(), "/bar".to_string()]
        );
        assert_eq!(token.ttl_seconds(), 5);
        assert_eq!(token.recipient(), Some("svc-a"));
    }

    #[test]
    fn test_display() {
        let token = Token::new(
            TestUser::new("42"),
            scope(&[(Method::Get, &["/bar"])]),
            10,
            None,
        )
        .unwrap();
        let rendered = format!("{}", token);
        assert!(rendered.contains("subject=42"), "{}", rendered);
        assert!(rendered.contains("ttl=10"), "{}", rendered);
    }
}
