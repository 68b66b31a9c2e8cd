// Kling request signing: short-lived HS256 JWT (issuer = access key, signed with the secret key)

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use openreel_core::port::ProviderError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime after `now` (30 minutes).
pub const TOKEN_TTL_SECS: i64 = 1800;

/// Clock skew allowance before `now`.
pub const NOT_BEFORE_SKEW_SECS: i64 = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Access key and secret key are required")]
    MissingCredentials,

    #[error("Failed to encode token: {0}")]
    EncodingFailure(String),
}

impl From<TokenError> for ProviderError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MissingCredentials => ProviderError::MissingCredentials,
            TokenError::EncodingFailure(msg) => ProviderError::Encoding(msg),
        }
    }
}

#[derive(Serialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'a str,
}

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub exp: i64,
    pub nbf: i64,
}

/// Build a signed token valid from `now - 5s` to `now + 1800s`.
pub fn sign(access_key: &str, secret_key: &SecretString, now_secs: i64) -> Result<String, TokenError> {
    let access_key = access_key.trim();
    let secret = secret_key.expose_secret().trim();
    if access_key.is_empty() || secret.is_empty() {
        return Err(TokenError::MissingCredentials);
    }

    let header = serde_json::to_vec(&Header {
        alg: "HS256",
        typ: "JWT",
    })
    .map_err(|e| TokenError::EncodingFailure(e.to_string()))?;

    let claims = serde_json::to_vec(&Claims {
        iss: access_key.to_string(),
        exp: now_secs + TOKEN_TTL_SECS,
        nbf: now_secs - NOT_BEFORE_SKEW_SECS,
    })
    .map_err(|e| TokenError::EncodingFailure(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(claims)
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| TokenError::EncodingFailure(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Decode the claims segment of a token (no signature check).
pub fn claims(token: &str) -> Option<Claims> {
    let segment = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_token_has_three_url_safe_segments() {
        let token = sign("ak-test", &secret("sk-test"), NOW).unwrap();
        let parts: Vec<_> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        for part in parts {
            assert!(!part.is_empty());
            assert!(!part.contains('='));
            assert!(!part.contains('+'));
            assert!(!part.contains('/'));
        }
    }

    #[test]
    fn test_signing_is_deterministic() {
        let a = sign("ak-test", &secret("sk-test"), NOW).unwrap();
        let b = sign("ak-test", &secret("sk-test"), NOW).unwrap();
        assert_eq!(a, b);

        let later = sign("ak-test", &secret("sk-test"), NOW + 1).unwrap();
        assert_ne!(a, later);
    }

    #[test]
    fn test_claims_window() {
        let token = sign("  ak-test ", &secret("sk-test"), NOW).unwrap();
        let claims = claims(&token).unwrap();

        assert_eq!(claims.iss, "ak-test");
        assert_eq!(claims.exp, NOW + 1800);
        assert_eq!(claims.nbf, NOW - 5);
        assert_eq!(claims.exp - claims.nbf, 1805);
    }

    #[test]
    fn test_header_segment() {
        let token = sign("ak", &secret("sk"), NOW).unwrap();
        let header = token.split('.').next().unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(header).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value["alg"], "HS256");
        assert_eq!(value["typ"], "JWT");
    }

    #[test]
    fn test_signature_verifies_with_secret() {
        let token = sign("ak", &secret("sk-secret"), NOW).unwrap();
        let (signing_input, signature) = token.rsplit_once('.').unwrap();

        let mut mac = HmacSha256::new_from_slice(b"sk-secret").unwrap();
        mac.update(signing_input.as_bytes());
        let expected = URL_SAFE_NO_PAD.decode(signature).unwrap();
        assert!(mac.verify_slice(&expected).is_ok());

        let other = sign("ak", &secret("other-secret"), NOW).unwrap();
        assert_ne!(token.rsplit_once('.').unwrap().1, other.rsplit_once('.').unwrap().1);
    }

    #[test]
    fn test_blank_credentials_rejected() {
        assert_eq!(
            sign("", &secret("sk"), NOW),
            Err(TokenError::MissingCredentials)
        );
        assert_eq!(
            sign("ak", &secret("  \n"), NOW),
            Err(TokenError::MissingCredentials)
        );
        assert_eq!(
            ProviderError::from(TokenError::MissingCredentials),
            ProviderError::MissingCredentials
        );
    }
}
