//! Access and refresh token primitives
//!
//! Access tokens are HS256-signed JWTs carrying a [`Claims`] payload.
//! Refresh and password-reset tokens are opaque random strings; only their
//! keyed HMAC-SHA256 digest is stored server-side, so a database leak does
//! not compromise active sessions.

use crate::config::AuthConfig;
use anyhow::{Context, Result};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

/// Number of random bytes in an opaque token (hex-encoded to twice this length)
const OPAQUE_TOKEN_BYTES: usize = 32;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject, the user's database id
    pub sub: i64,
    /// The user's role name (e.g. `"admin"`, `"editor"`)
    pub role: String,
    /// Expiration time (UTC Unix timestamp)
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp)
    pub iat: i64,
    /// Unique token identifier for audit trails
    pub jti: String,
}

/// Generate an HS256 access token for the given user.
pub fn generate_access_token(
    user_id: i64,
    role: &str,
    config: &AuthConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.access_token_ttl_minutes * 60;

    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Checks the signature and expiration automatically.
pub fn validate_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Generate a cryptographically random opaque token, hex-encoded.
///
/// Used for refresh and password-reset tokens. The plaintext goes to the
/// client; only [`token_digest`] of it is persisted.
pub fn generate_opaque_token() -> Result<String> {
    let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];
    getrandom::fill(&mut bytes).context("Failed to gather randomness for token")?;
    Ok(hex::encode(bytes))
}

type HmacSha256 = Hmac<Sha256>;

/// Compute the keyed HMAC-SHA256 hex digest of an opaque token.
///
/// Tokens are looked up in the database by this digest, so a leaked table
/// cannot be replayed without the server-side key.
pub fn token_digest(token: &str, key: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Check a presented opaque token against a stored digest in constant time.
///
/// Goes through `Mac::verify_slice` rather than string equality, so the
/// comparison leaks no timing information about the digest.
pub fn verify_token_digest(token: &str, key: &str, digest: &str) -> bool {
    let Some(expected) = hex::decode(digest) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string; None when malformed.
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if !s.is_ascii() || s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            token_key: "test-token-key".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 30,
            reset_token_ttl_minutes: 30,
        }
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = test_config();
        let token =
            generate_access_token(42, "admin", &config).expect("token generation should succeed");

        let claims = validate_access_token(&token, &config).expect("validation should succeed");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();

        // Manually build an already-expired token, well past the default
        // 60 second validation leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: "editor".to_string(),
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .expect("encoding should succeed");

        assert!(validate_access_token(&token, &config).is_err());
    }

    #[test]
    fn test_different_secrets_fail() {
        let config_a = test_config();
        let mut config_b = test_config();
        config_b.jwt_secret = "another-secret-entirely".to_string();

        let token =
            generate_access_token(1, "editor", &config_a).expect("token generation should succeed");

        assert!(
            validate_access_token(&token, &config_b).is_err(),
            "token signed with a different secret must fail"
        );
    }

    #[test]
    fn test_opaque_token_is_hex_and_unique() {
        let first = generate_opaque_token().expect("token generation should succeed");
        let second = generate_opaque_token().expect("token generation should succeed");

        assert_eq!(first.len(), OPAQUE_TOKEN_BYTES * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_token_digest_is_stable_and_keyed() {
        let token = "sample-token";

        let digest = token_digest(token, "key-one");
        assert_eq!(digest, token_digest(token, "key-one"));
        assert_eq!(digest.len(), 64);

        // A different key must produce a different digest
        assert_ne!(digest, token_digest(token, "key-two"));
    }

    #[test]
    fn test_verify_token_digest() {
        let digest = token_digest("sample-token", "key-one");

        assert!(verify_token_digest("sample-token", "key-one", &digest));
        assert!(!verify_token_digest("other-token", "key-one", &digest));
        assert!(!verify_token_digest("sample-token", "key-two", &digest));
        assert!(!verify_token_digest("sample-token", "key-one", "not-hex"));
    }
}
