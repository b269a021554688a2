use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ers_core::{EmployeeId, IdentityId};

use crate::Role;

/// Tolerated clock difference between the issuing and verifying services.
pub const CLOCK_SKEW_SECS: i64 = 30;

/// Claims embedded in every bearer token.
///
/// Field names are the wire names shared by all services; `iat`/`exp` are Unix
/// seconds as required by JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Subject: the credential-store identity id.
    pub sub: IdentityId,
    pub username: String,
    pub role: Role,
    pub employee_id: Option<EmployeeId>,
    pub manager_id: Option<EmployeeId>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("token has expired")]
    Expired,

    /// Bad structure, bad signature, or an impossible time window.
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token could not be parsed: {0}")]
    Unknown(String),
}

/// Deterministically validate the time window of already-decoded claims.
///
/// Signature verification happens in [`crate::token`]; this only looks at
/// `iat`/`exp` against `now`.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), VerificationError> {
    if claims.exp <= claims.iat {
        return Err(VerificationError::Malformed(
            "invalid token time window (exp <= iat)".to_string(),
        ));
    }
    let now = now.timestamp();
    if now + CLOCK_SKEW_SECS < claims.iat {
        return Err(VerificationError::Malformed(
            "token not yet valid (iat is in the future)".to_string(),
        ));
    }
    if now > claims.exp {
        return Err(VerificationError::Expired);
    }
    Ok(())
}
