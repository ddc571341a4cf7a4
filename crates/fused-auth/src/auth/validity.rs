/*
[INPUT]:  Decoded claims, session application id, current time
[OUTPUT]: Accept / reject decision with a typed reason
[POS]:    Auth layer - pluggable token validity predicate
[UPDATE]: When the service settles which time claim bounds a token
*/

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::auth::token::{CLAIM_APP_ID, CLAIM_EXPIRES_AT, CLAIM_ISSUED_AT, Claims};

/// Why a token was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token has no `{0}` claim")]
    MissingClaim(&'static str),

    #[error("token belongs to application {actual:?}, expected {expected:?}")]
    AppIdMismatch { expected: String, actual: String },

    #[error("token expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    #[error("`{claim}` claim {value:?} does not satisfy the time policy")]
    TimeClaimRejected { claim: &'static str, value: String },

    #[error("signature check failed: {0}")]
    Signature(String),
}

/// Decides whether decoded claims still authorize this session
///
/// Implemented for plain closures, so a one-off rule can be passed directly.
pub trait TokenValidator: Send + Sync {
    fn check(
        &self,
        claims: &Claims,
        app_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TokenRejection>;
}

impl<F> TokenValidator for F
where
    F: Fn(&Claims, &str, DateTime<Utc>) -> Result<(), TokenRejection> + Send + Sync,
{
    fn check(
        &self,
        claims: &Claims,
        app_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TokenRejection> {
        self(claims, app_id, now)
    }
}

/// Which time claim bounds a token's lifetime
///
/// Two generations of the service disagree: one checks `exp` against the
/// clock, the other treats `iat` as a deadline that must still be ahead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeClaimPolicy {
    /// `exp` must lie in the future
    #[default]
    Expiry,
    /// `iat` must lie in the future
    IssuedAtFuture,
    /// No time check
    Ignore,
}

/// Default validator: `appId` must match, then the time policy applies
#[derive(Debug, Clone)]
pub struct ClaimValidator {
    pub time_claim: TimeClaimPolicy,
    /// Grace period added after `exp`
    pub leeway: Duration,
}

impl Default for ClaimValidator {
    fn default() -> Self {
        Self::new(TimeClaimPolicy::default())
    }
}

impl ClaimValidator {
    pub fn new(time_claim: TimeClaimPolicy) -> Self {
        Self {
            time_claim,
            leeway: Duration::zero(),
        }
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    fn check_app_id(claims: &Claims, app_id: &str) -> Result<(), TokenRejection> {
        let actual = claims
            .app_id()
            .ok_or(TokenRejection::MissingClaim(CLAIM_APP_ID))?;
        if actual == app_id {
            Ok(())
        } else {
            Err(TokenRejection::AppIdMismatch {
                expected: app_id.to_string(),
                actual: actual.to_string(),
            })
        }
    }

    fn check_time(&self, claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenRejection> {
        match self.time_claim {
            TimeClaimPolicy::Expiry => {
                let raw = claims
                    .get(CLAIM_EXPIRES_AT)
                    .ok_or(TokenRejection::MissingClaim(CLAIM_EXPIRES_AT))?;
                let expired_at = claims.expires_at().ok_or_else(|| {
                    TokenRejection::TimeClaimRejected {
                        claim: CLAIM_EXPIRES_AT,
                        value: raw.to_string(),
                    }
                })?;
                // past the representable range means no practical expiry
                let still_valid = expired_at
                    .checked_add_signed(self.leeway)
                    .is_none_or(|deadline| deadline > now);
                if still_valid {
                    Ok(())
                } else {
                    Err(TokenRejection::Expired { expired_at })
                }
            }
            TimeClaimPolicy::IssuedAtFuture => {
                let raw = claims
                    .get(CLAIM_ISSUED_AT)
                    .ok_or(TokenRejection::MissingClaim(CLAIM_ISSUED_AT))?;
                match claims.iat() {
                    Some(iat) if iat > now.timestamp() => Ok(()),
                    _ => Err(TokenRejection::TimeClaimRejected {
                        claim: CLAIM_ISSUED_AT,
                        value: raw.to_string(),
                    }),
                }
            }
            TimeClaimPolicy::Ignore => Ok(()),
        }
    }
}

impl TokenValidator for ClaimValidator {
    fn check(
        &self,
        claims: &Claims,
        app_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TokenRejection> {
        Self::check_app_id(claims, app_id)?;
        self.check_time(claims, now)
    }
}
