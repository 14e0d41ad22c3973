//! JWT payload inspection.
//!
//! Tokens are decoded without verifying the signature: the client only
//! needs the expiry and a few identity claims for display. Verification is
//! the backend's job. Decoding never fails loudly; anything malformed
//! yields `None`.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

const CLAIM_NAME_IDENTIFIER: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
const CLAIM_EMAIL: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";
const CLAIM_NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
const CLAIM_ROLE: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

/// Decoded claims of a JWT payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    exp: Option<i64>,
    claims: Map<String, Value>,
}

impl TokenClaims {
    /// Expiry as seconds since the Unix epoch, if the token carries one.
    #[must_use]
    pub fn exp(&self) -> Option<i64> {
        self.exp
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Raw claim lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// All claims.
    #[must_use]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// User identifier (`sub`, `nameid`, `userId` or the ASP.NET name identifier).
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.first_string(&["sub", "nameid", "userId", CLAIM_NAME_IDENTIFIER])
    }

    /// Email address.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.first_string(&["email", CLAIM_EMAIL])
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.first_string(&["name", "unique_name", CLAIM_NAME])
    }

    /// All roles. A role claim may be a single string or an array.
    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        ["role", "roles", CLAIM_ROLE]
            .iter()
            .filter_map(|name| self.claims.get(*name))
            .flat_map(|value| match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect(),
                _ => Vec::new(),
            })
            .collect()
    }

    /// First role, if any.
    #[must_use]
    pub fn role(&self) -> Option<String> {
        self.roles().into_iter().next()
    }

    /// Returns whether the token grants `role` (case-insensitive).
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    fn first_string(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .filter_map(|name| self.claims.get(*name))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

/// Decodes the payload segment of a JWT.
///
/// Returns `None` for anything that is not `header.payload[.signature]`
/// with a base64url-encoded JSON object as payload.
#[must_use]
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut segments = token.trim().split('.');
    let _header = segments.next()?;
    let payload = segments.next()?.trim_end_matches('=');
    if payload.is_empty() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let claims: Map<String, Value> = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp").and_then(numeric_date);

    Some(TokenClaims { exp, claims })
}

/// Interprets a JWT NumericDate. Fractional seconds are truncated.
#[allow(clippy::cast_possible_truncation)]
fn numeric_date(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_token;
    use serde_json::json;

    #[test]
    fn test_decode_expiry_and_claims() {
        let token = make_token(&json!({ "exp": 1_700_000_000, "sub": "42", "email": "a@b.vn" }));
        let claims = decode_claims(&token).unwrap();

        assert_eq!(claims.exp(), Some(1_700_000_000));
        assert_eq!(claims.subject().as_deref(), Some("42"));
        assert_eq!(claims.email().as_deref(), Some("a@b.vn"));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_decode_aspnet_claim_uris() {
        let mut payload = Map::new();
        payload.insert(CLAIM_NAME_IDENTIFIER.to_string(), json!(7));
        payload.insert(CLAIM_ROLE.to_string(), json!(["Admin", "Seller"]));
        payload.insert(CLAIM_NAME.to_string(), json!("Lan"));
        let token = make_token(&Value::Object(payload));
        let claims = decode_claims(&token).unwrap();

        assert_eq!(claims.subject().as_deref(), Some("7"));
        assert_eq!(claims.role().as_deref(), Some("Admin"));
        assert!(claims.has_role("seller"));
        assert_eq!(claims.name().as_deref(), Some("Lan"));
        assert_eq!(claims.exp(), None);
    }

    #[test]
    fn test_decode_float_and_string_exp() {
        let claims = decode_claims(&make_token(&json!({ "exp": 1_700_000_000.75 }))).unwrap();
        assert_eq!(claims.exp(), Some(1_700_000_000));

        let claims = decode_claims(&make_token(&json!({ "exp": "1700000000" }))).unwrap();
        assert_eq!(claims.exp(), Some(1_700_000_000));

        let claims = decode_claims(&make_token(&json!({ "exp": true }))).unwrap();
        assert_eq!(claims.exp(), None);
    }

    #[test]
    fn test_decode_tolerates_padding() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":1}"#);
        let token = format!("h.{payload}==.s");
        assert_eq!(decode_claims(&token).unwrap().exp(), Some(1));
    }

    #[test]
    fn test_decode_malformed_inputs() {
        for token in [
            "",
            "abc",
            "abc.",
            "a.!!!.c",
            "a.bm90IGpzb24.c",
            "a.WzEsMiwzXQ.c",
            "....",
        ] {
            assert!(decode_claims(token).is_none(), "decoded {token:?}");
        }
    }
}
