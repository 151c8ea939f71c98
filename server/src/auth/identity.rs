//! Identity Resolution
//!
//! Turns request headers into an [`Identity`]. Token sources, in order:
//! `Authorization: Bearer`, the session cookie, and (development fallback only)
//! the `X-Dev-User-Id` header.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::Value;
use tracing::warn;

use super::error::{AuthError, AuthResult};
use super::jwt::validate_token;
use crate::config::Config;

/// Trusted identity header, honoured only with the development fallback.
pub const DEV_USER_HEADER: &str = "x-dev-user-id";

/// Subject of the synthesized development identity.
pub const DEV_SUBJECT: &str = "dev-user";

/// How the caller's identity was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// Signature and expiry checked.
    Verified,
    /// Payload read without verification (development fallback).
    Unverified,
    /// Fixed development identity (development fallback).
    Synthesized,
}

/// The caller as asserted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub source: IdentitySource,
}

impl Identity {
    fn synthesized() -> Self {
        Self {
            subject: DEV_SUBJECT.into(),
            email: Some("dev@localhost".into()),
            name: Some("Development User".into()),
            source: IdentitySource::Synthesized,
        }
    }
}

/// Raw credential found on the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Token(String),
    DevHeader(String),
}

/// Locate the caller's credential.
pub fn extract_credential(headers: &HeaderMap, config: &Config) -> AuthResult<Credential> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;
        return Ok(Credential::Token(token.to_string()));
    }

    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(&config.session_cookie_name) {
        if !cookie.value().is_empty() {
            return Ok(Credential::Token(cookie.value().to_string()));
        }
    }

    if config.dev_auth_fallback {
        if let Some(subject) = headers
            .get(DEV_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return Ok(Credential::DevHeader(subject.to_string()));
        }
    }

    Err(AuthError::MissingAuthHeader)
}

/// Resolve the caller's identity from request headers.
///
/// Fails closed unless `config.dev_auth_fallback` is set.
pub fn resolve_identity(headers: &HeaderMap, config: &Config) -> AuthResult<Identity> {
    match extract_credential(headers, config)? {
        Credential::DevHeader(subject) => {
            warn!(subject = %subject, "Accepting development identity header");
            Ok(Identity {
                subject,
                email: None,
                name: None,
                source: IdentitySource::Unverified,
            })
        }
        Credential::Token(token) => match validate_token(&token, &config.jwt_secret) {
            Ok(claims) => Ok(Identity {
                subject: claims.sub,
                email: claims.email,
                name: claims.name,
                source: IdentitySource::Verified,
            }),
            Err(err) if config.dev_auth_fallback => {
                let identity = decode_unverified(&token).unwrap_or_else(Identity::synthesized);
                warn!(
                    error = %err,
                    subject = %identity.subject,
                    source = ?identity.source,
                    "Token verification failed, using development identity"
                );
                Ok(identity)
            }
            Err(err) => Err(err),
        },
    }
}

/// Read a JWT payload without checking its signature.
fn decode_unverified(token: &str) -> Option<Identity> {
    let mut segments = token.split('.');
    let (_, payload, _) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    let text = |key: &str| {
        claims
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let subject = text("sub").or_else(|| text("user_id")).or_else(|| text("uid"))?;
    Some(Identity {
        subject,
        email: text("email"),
        name: text("name"),
        source: IdentitySource::Unverified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::issue_token;
    use axum::http::{header::COOKIE, HeaderValue};

    fn fallback_config() -> Config {
        Config {
            dev_auth_fallback: true,
            ..Config::default_for_test()
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn unsigned_token(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn missing_credentials_are_rejected_in_every_mode() {
        let headers = HeaderMap::new();
        assert!(matches!(
            resolve_identity(&headers, &Config::default_for_test()),
            Err(AuthError::MissingAuthHeader)
        ));
        assert!(matches!(
            resolve_identity(&headers, &fallback_config()),
            Err(AuthError::MissingAuthHeader)
        ));
    }

    #[test]
    fn verified_token_yields_claims() {
        let config = Config::default_for_test();
        let token = issue_token("alice", Some("a@campus.test"), None, &config.jwt_secret, 60)
            .unwrap();

        let identity = resolve_identity(&bearer(&token), &config).unwrap();
        assert_eq!(identity.subject, "alice");
        assert_eq!(identity.email.as_deref(), Some("a@campus.test"));
        assert_eq!(identity.source, IdentitySource::Verified);
    }

    #[test]
    fn session_cookie_is_a_token_source() {
        let config = Config::default_for_test();
        let token = issue_token("bob", None, None, &config.jwt_secret, 60).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; session={token}")).unwrap(),
        );

        let identity = resolve_identity(&headers, &config).unwrap();
        assert_eq!(identity.subject, "bob");
    }

    #[test]
    fn non_bearer_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            extract_credential(&headers, &Config::default_for_test()),
            Err(AuthError::InvalidAuthHeader)
        ));
    }

    #[test]
    fn malformed_token_fails_closed_by_default() {
        let result = resolve_identity(&bearer("garbage"), &Config::default_for_test());
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn malformed_token_is_synthesized_with_fallback() {
        let identity = resolve_identity(&bearer("garbage"), &fallback_config()).unwrap();
        assert_eq!(identity.subject, DEV_SUBJECT);
        assert_eq!(identity.source, IdentitySource::Synthesized);
    }

    #[test]
    fn unsigned_payload_is_used_with_fallback() {
        let token = unsigned_token(r#"{"user_id":"carol","name":"Carol"}"#);
        let identity = resolve_identity(&bearer(&token), &fallback_config()).unwrap();
        assert_eq!(identity.subject, "carol");
        assert_eq!(identity.name.as_deref(), Some("Carol"));
        assert_eq!(identity.source, IdentitySource::Unverified);
    }

    #[test]
    fn unsigned_payload_is_rejected_by_default() {
        let token = unsigned_token(r#"{"sub":"carol"}"#);
        assert!(resolve_identity(&bearer(&token), &Config::default_for_test()).is_err());
    }

    #[test]
    fn dev_header_requires_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(DEV_USER_HEADER, HeaderValue::from_static("dana"));

        assert!(matches!(
            resolve_identity(&headers, &Config::default_for_test()),
            Err(AuthError::MissingAuthHeader)
        ));
        let identity = resolve_identity(&headers, &fallback_config()).unwrap();
        assert_eq!(identity.subject, "dana");
    }
}
