//! JWT Token Generation and Validation
//!
//! Tokens are HS256, signed with the secret shared with the identity provider.
//! Expiry is enforced with zero leeway.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::error::{AuthError, AuthResult};

/// Verified JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity provider user ID).
    pub sub: String,
    /// Email address, if the provider shares it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name, if the provider shares it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

/// Mint a token for `subject`.
///
/// The service only verifies tokens in production; this exists for tooling
/// and tests that stand in for the identity provider.
pub fn issue_token(
    subject: &str,
    email: Option<&str>,
    name: Option<&str>,
    secret: &str,
    expiry_seconds: i64,
) -> AuthResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        email: email.map(str::to_string),
        name: name.map(str::to_string),
        exp: (now + Duration::seconds(expiry_seconds)).timestamp(),
        iat: now.timestamp(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Validate and decode a token.
///
/// Returns [`AuthError::TokenExpired`] for expired tokens and
/// [`AuthError::InvalidToken`] for everything else that fails verification.
pub fn validate_token(token: &str, secret: &str) -> AuthResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    if token_data.claims.sub.trim().is_empty() {
        return Err(AuthError::InvalidToken);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_issue_and_validate_token() {
        let token = issue_token(
            "auth0|alice",
            Some("alice@campus.test"),
            Some("Alice"),
            SECRET,
            900,
        )
        .unwrap();
        let claims = validate_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, "auth0|alice");
        assert_eq!(claims.email.as_deref(), Some("alice@campus.test"));
        assert_eq!(claims.name.as_deref(), Some("Alice"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_fails() {
        let token = issue_token("alice", None, None, SECRET, 900).unwrap();
        let result = validate_token(&token, "another-secret");

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_reports_expiry() {
        let token = issue_token("alice", None, None, SECRET, -60).unwrap();
        let result = validate_token(&token, SECRET);

        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            validate_token("not-a-jwt", SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_blank_subject_is_invalid() {
        let token = issue_token("  ", None, None, SECRET, 900).unwrap();
        assert!(matches!(
            validate_token(&token, SECRET),
            Err(AuthError::InvalidToken)
        ));
    }
}
