use gatepass_token::{Method, SigningKey, Subject, Token, TokenCodec, TokenError};

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: String,
    username: String,
}

impl Subject for User {
    fn subject_id(&self) -> String {
        self.id.clone()
    }
}

fn main() -> Result<(), TokenError> {
    // The issuing side holds a resolved identity and a shared secret
    // (in a real application, loaded from configuration at startup).
    let alice = User {
        id: "42".to_string(),
        username: "alice".to_string(),
    };
    let codec = TokenCodec::new(SigningKey::new("example-secret-0123456789abcdef!"));

    // Example 1: Issue a narrow grant
    println!("Example 1: Issue a narrow grant");
    let token = Token::builder(alice.clone())
        .grant(Method::Get, "/api/v1/reports")
        .grant(Method::Post, "/api/v1/exports")
        .ttl_seconds(600)
        .recipient("nightly-export-job")
        .build()?;
    let signed = codec.encode(&token)?;
    println!("Signed token: {}\n", signed);

    // Example 2: Verify and authorize a request
    println!("Example 2: Verify and authorize a request");
    let verified = codec.decode(&signed, |id| {
        if id == "42" {
            Ok(alice.clone())
        } else {
            Err(TokenError::subject_resolution("No such user"))
        }
    })?;
    let (subject, _token) = verified.authorize(Method::Get, "/api/v1/reports/2026-08")?;
    println!("✅ {} may read reports\n", subject.username);

    // Example 3: A request outside the scope is denied
    println!("Example 3: A request outside the scope is denied");
    match verified.authorize(Method::Delete, "/api/v1/reports/2026-08") {
        Err(TokenError::Scope(msg)) => println!("✅ denied as expected: {}", msg),
        other => println!("unexpected result: {:?}", other.map(|_| ())),
    }

    Ok(())
}
