//! Mock session-token codec.
//!
//! Tokens are JWT-shaped: three dot-separated base64url segments carrying a
//! JSON header, JSON claims (`sub`, `role`, `iat`, `exp`) and a fixed
//! placeholder signature string. Nothing is cryptographically signed or
//! verified; the codec exists to give sessions a self-contained, expiring
//! wire format. A production deployment must replace this with a real HMAC
//! or asymmetric signature, or an opaque server-side session id.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::role::Role;

/// Token lifetime: 24 hours.
pub const TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

fn b64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn unb64(segment: &str, which: &str) -> AppResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AppError::malformed_token(format!("{} segment is not valid base64", which)))
}

/// Encode a token for the given subject, issued now and expiring in
/// [`TOKEN_TTL_SECS`].
pub fn encode(subject_id: &str, role: Role) -> String {
    let iat = Utc::now().timestamp();
    encode_claims(&Claims {
        sub: subject_id.to_string(),
        role,
        iat,
        exp: iat + TOKEN_TTL_SECS,
    })
}

/// Encode arbitrary claims. Exposed so callers (and tests) can craft tokens
/// with explicit timestamps.
pub fn encode_claims(claims: &Claims) -> String {
    let header = Header { alg: "HS256".to_string(), typ: "JWT".to_string() };
    // Header and Claims serialize infallibly; fall back to empty JSON anyway.
    let header_json = serde_json::to_vec(&header).unwrap_or_else(|_| b"{}".to_vec());
    let claims_json = serde_json::to_vec(claims).unwrap_or_else(|_| b"{}".to_vec());
    let signature = format!("mock-signature-{}-{}", claims.sub, claims.role);
    format!("{}.{}.{}", b64(&header_json), b64(&claims_json), b64(signature.as_bytes()))
}

/// Decode a token into its claims. Fails with `malformed_token` if the
/// segment structure, base64 or claim JSON is broken. The signature segment
/// only has to be decodable; its content is the documented placeholder.
pub fn decode(token: &str) -> AppResult<Claims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AppError::malformed_token(format!(
            "expected 3 segments, found {}",
            parts.len()
        )));
    }
    let header_bytes = unb64(parts[0], "header")?;
    serde_json::from_slice::<Header>(&header_bytes)
        .map_err(|_| AppError::malformed_token("header segment is not valid JSON"))?;
    let claims_bytes = unb64(parts[1], "claims")?;
    let claims: Claims = serde_json::from_slice(&claims_bytes)
        .map_err(|_| AppError::malformed_token("claims segment is not valid JSON"))?;
    unb64(parts[2], "signature")?;
    Ok(claims)
}

/// Fails closed: a token that cannot be decoded counts as expired, and a
/// decodable one is expired once the current time reaches its `exp`.
pub fn is_expired(token: &str) -> bool {
    match decode(token) {
        Ok(claims) => Utc::now().timestamp() >= claims.exp,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_subject_and_role() {
        for role in Role::ALL {
            let token = encode("subject-42", role);
            let claims = decode(&token).unwrap();
            assert_eq!(claims.sub, "subject-42");
            assert_eq!(claims.role, role);
            assert_eq!(claims.exp, claims.iat + TOKEN_TTL_SECS);
        }
    }

    #[test]
    fn fresh_token_is_not_expired() {
        let token = encode("s", Role::Teacher);
        assert!(!is_expired(&token));
    }

    #[test]
    fn token_expiring_one_second_ago_is_expired() {
        let now = Utc::now().timestamp();
        let token = encode_claims(&Claims {
            sub: "s".into(),
            role: Role::Student,
            iat: now - TOKEN_TTL_SECS,
            exp: now - 1,
        });
        assert!(is_expired(&token));
    }

    #[test]
    fn token_expiring_exactly_now_is_expired() {
        let now = Utc::now().timestamp();
        let token = encode_claims(&Claims { sub: "s".into(), role: Role::Parent, iat: now, exp: now });
        assert!(is_expired(&token));
    }

    #[test]
    fn malformed_tokens_fail_closed() {
        for bad in [
            "",
            "only-one-segment",
            "a.b",
            "a.b.c.d",
            "!!!.???.###",
            "bm90LWpzb24.bm90LWpzb24.bm90LWpzb24", // base64 of "not-json"
        ] {
            let err = decode(bad).unwrap_err();
            assert_eq!(err.code_str(), "malformed_token", "input: {:?}", bad);
            assert!(is_expired(bad), "input: {:?}", bad);
        }
    }

    #[test]
    fn truncated_valid_token_is_malformed() {
        let token = encode("s", Role::Admin);
        let truncated = &token[..token.len() / 2];
        assert!(decode(truncated).is_err());
        assert!(is_expired(truncated));
    }
}
