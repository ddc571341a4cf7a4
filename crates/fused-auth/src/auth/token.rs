/*
[INPUT]:  Compact bearer tokens (header.payload.signature)
[OUTPUT]: Decoded claim maps, optional HS256 signature check
[POS]:    Auth layer - token codec
[UPDATE]: When claim names or the verification options change
*/

use std::fmt;

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::auth::TokenRejection;
use crate::types::StringMap;

pub const CLAIM_ADDRESS: &str = "address";
pub const CLAIM_APP_ID: &str = "appId";
pub const CLAIM_EXPIRES_AT: &str = "exp";
pub const CLAIM_ISSUED_AT: &str = "iat";

/// Claims carried in a token's payload segment, all values as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Claims(StringMap);

impl Claims {
    pub fn new(map: StringMap) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name)
    }

    /// Wallet address
    pub fn address(&self) -> Option<&str> {
        self.get(CLAIM_ADDRESS)
    }

    pub fn app_id(&self) -> Option<&str> {
        self.get(CLAIM_APP_ID)
    }

    /// `exp` as Unix seconds
    pub fn exp(&self) -> Option<i64> {
        self.get(CLAIM_EXPIRES_AT).and_then(parse_unix_seconds)
    }

    /// `iat` as Unix seconds
    pub fn iat(&self) -> Option<i64> {
        self.get(CLAIM_ISSUED_AT).and_then(parse_unix_seconds)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp().and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn as_map(&self) -> &StringMap {
        &self.0
    }

    pub fn into_map(self) -> StringMap {
        self.0
    }
}

fn parse_unix_seconds(value: &str) -> Option<i64> {
    let value = value.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite())
            .map(|secs| secs.trunc() as i64)
    })
}

/// Decode the payload segment of a compact token
///
/// The signature segment is not checked here; see [`SignaturePolicy`].
pub fn decode_claims(token: &str) -> Result<Claims, TokenRejection> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() < 3 {
        return Err(TokenRejection::Malformed(format!(
            "expected three dot-separated segments, found {}",
            segments.len()
        )));
    }

    let payload = segments[1];
    let padding = (4 - payload.len() % 4) % 4;
    let padded = format!("{payload}{}", "=".repeat(padding));

    let bytes = URL_SAFE
        .decode(&padded)
        .or_else(|_| STANDARD.decode(&padded))
        .map_err(|e| TokenRejection::Malformed(format!("payload is not base64url: {e}")))?;

    let text = String::from_utf8(bytes)
        .map_err(|e| TokenRejection::Malformed(format!("payload is not UTF-8: {e}")))?;

    let map: StringMap = serde_json::from_str(&text)
        .map_err(|e| TokenRejection::Malformed(format!("payload is not a JSON object: {e}")))?;

    Ok(Claims(map))
}

/// How much to trust a token's signature segment
///
/// The remote service never publishes a verification key, so the default is
/// to trust tokens received over its TLS channel without checking them.
/// Deployments that share an HMAC secret with the service can require it.
#[derive(Clone, Default)]
pub enum SignaturePolicy {
    #[default]
    Unverified,
    Hs256 {
        secret: Vec<u8>,
    },
}

impl SignaturePolicy {
    pub fn hs256(secret: impl Into<Vec<u8>>) -> Self {
        SignaturePolicy::Hs256 {
            secret: secret.into(),
        }
    }

    pub fn is_verified(&self) -> bool {
        !matches!(self, SignaturePolicy::Unverified)
    }

    /// Check the signature segment; claims are left to the validator
    pub fn verify(&self, token: &str) -> Result<(), TokenRejection> {
        match self {
            SignaturePolicy::Unverified => Ok(()),
            SignaturePolicy::Hs256 { secret } => {
                let mut validation = Validation::new(Algorithm::HS256);
                validation.validate_exp = false;
                validation.validate_nbf = false;
                validation.validate_aud = false;
                validation.required_spec_claims.clear();

                jsonwebtoken::decode::<serde_json::Value>(
                    token.trim(),
                    &DecodingKey::from_secret(secret),
                    &validation,
                )
                .map(|_| ())
                .map_err(|e| TokenRejection::Signature(e.to_string()))
            }
        }
    }
}

impl fmt::Debug for SignaturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignaturePolicy::Unverified => f.write_str("Unverified"),
            SignaturePolicy::Hs256 { .. } => f.write_str("Hs256 { secret: <redacted> }"),
        }
    }
}
