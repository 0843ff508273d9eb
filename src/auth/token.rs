// Session token codec: issues and verifies signed JWTs

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::models::{Identity, Role};

/// Default session lifetime: 30 days
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // user id
    pub email: String,
    pub role: Role,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Verification outcomes. All of them collapse to `Unauthenticated` at the
/// middleware boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token could not be decoded")]
    Malformed,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token could not be encoded: {0}")]
    Encoding(String),
}

/// Token codec bound to the server-held signing secret.
///
/// Tokens are immutable once issued; a changed role or identity needs a new token.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: Option<i64>,
}

impl TokenCodec {
    /// Create a codec with the default 30 day lifetime
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Some(DEFAULT_TOKEN_TTL_SECS))
    }

    /// Create a codec with a custom lifetime. `None` issues tokens without `exp`.
    pub fn with_ttl(secret: &str, ttl_secs: Option<i64>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is optional; it is still enforced whenever present
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Issue a token for an identity
    pub fn issue<I: Identity + ?Sized>(&self, identity: &I) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.id(),
            email: identity.email().to_string(),
            role: identity.role(),
            iat: now,
            exp: self.ttl_secs.map(|ttl| now + ttl),
        };
        self.encode_claims(&claims)
    }

    /// Sign an arbitrary claim set
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify a token and return its claims. Pure over the secret and the token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{AdminIdentity, UserIdentity};
    use proptest::prelude::*;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    fn test_codec() -> TokenCodec {
        TokenCodec::new(SECRET)
    }

    fn user(id: i32, email: &str, role: Role) -> UserIdentity {
        UserIdentity {
            id,
            name: "Test".to_string(),
            email: email.to_string(),
            role,
            force_password_change: false,
        }
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::User), Just(Role::Coach), Just(Role::SuperAdmin)]
    }

    #[test]
    fn test_token_lifetime_is_30_days() {
        let codec = test_codec();
        let token = codec.issue(&user(1, "test@example.com", Role::User)).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.exp.unwrap() - claims.iat, DEFAULT_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_token_without_expiry_is_accepted() {
        let codec = TokenCodec::with_ttl(SECRET, None);
        let admin = AdminIdentity {
            id: 7,
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            role: Role::SuperAdmin,
        };
        let token = codec.issue(&admin).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.exp, None);
        assert_eq!(claims.role, Role::SuperAdmin);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = test_codec();
        let now = Utc::now().timestamp();
        let token = codec
            .encode_claims(&Claims {
                sub: 1,
                email: "test@example.com".to_string(),
                role: Role::User,
                iat: now - 1000,
                exp: Some(now - 500),
            })
            .unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let codec = test_codec();

        assert_eq!(codec.verify(""), Err(TokenError::Malformed));
        assert_eq!(codec.verify("not.a.token"), Err(TokenError::Malformed));
        assert_eq!(codec.verify("invalid_token_format"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let issuer = TokenCodec::new("secret1");
        let verifier = TokenCodec::new("secret2");
        let token = issuer.issue(&user(1, "test@example.com", Role::Coach)).unwrap();

        assert!(issuer.verify(&token).is_ok());
        assert_eq!(verifier.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload_is_invalid_signature() {
        let codec = test_codec();
        let token = codec.issue(&user(1, "test@example.com", Role::User)).unwrap();
        let other = codec.issue(&user(1, "test@example.com", Role::SuperAdmin)).unwrap();

        // Splice the SUPER_ADMIN payload onto the USER signature
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(codec.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_unknown_role_claim_is_malformed() {
        #[derive(Serialize)]
        struct LooseClaims<'a> {
            sub: i32,
            email: &'a str,
            role: &'a str,
            iat: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &LooseClaims {
                sub: 1,
                email: "x@example.com",
                role: "ADMIN",
                iat: Utc::now().timestamp(),
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(test_codec().verify(&token), Err(TokenError::Malformed));
    }

    proptest! {
        // Round-trip: claims come back unchanged
        #[test]
        fn prop_verify_returns_issued_claims(
            id in 1i32..1000000,
            email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)",
            role in role_strategy(),
        ) {
            let codec = test_codec();
            let token = codec.issue(&user(id, &email, role)).unwrap();
            let claims = codec.verify(&token).unwrap();

            prop_assert_eq!(claims.sub, id);
            prop_assert_eq!(claims.email, email);
            prop_assert_eq!(claims.role, role);
        }

        #[test]
        fn prop_other_secret_never_verifies(
            id in 1i32..1000000,
            secret in "[a-zA-Z0-9]{8,32}",
        ) {
            prop_assume!(secret != SECRET);
            let token = TokenCodec::new(&secret).issue(&user(id, "p@example.com", Role::User)).unwrap();
            prop_assert_eq!(test_codec().verify(&token), Err(TokenError::InvalidSignature));
        }

        #[test]
        fn prop_random_strings_are_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            prop_assert!(test_codec().verify(&malformed).is_err());
        }
    }
}
