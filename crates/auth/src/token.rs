//! HS256 token issuing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use ers_core::DomainError;

use crate::{Principal, TokenClaims, VerificationError, validate_claims};

/// Minimum accepted length of the shared signing secret (256 bits).
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenKeyError {
    #[error("signing secret must be at least {MIN_SECRET_LEN} bytes (got {0})")]
    TooShort(usize),

    #[error("token ttl must be positive")]
    NonPositiveTtl,
}

/// Verification side of the token protocol.
///
/// The HTTP middleware only depends on this trait so services that never issue
/// tokens still verify them the same way.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, VerificationError>;
}

/// A freshly minted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Symmetric-key (HMAC-SHA256) issuer/verifier.
///
/// Built once at startup from configuration and shared behind an `Arc`.
#[derive(Clone)]
pub struct Hs256TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for Hs256TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Hs256TokenService {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, TokenKeyError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenKeyError::TooShort(secret.len()));
        }
        if ttl <= Duration::zero() {
            return Err(TokenKeyError::NonPositiveTtl);
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    pub fn issue(&self, principal: &Principal) -> Result<IssuedToken, DomainError> {
        self.issue_at(principal, Utc::now())
    }

    /// Mint a token as if issued at `now` (expiry = `now + ttl`).
    pub fn issue_at(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, DomainError> {
        let expires_at = now + self.ttl;
        let claims = TokenClaims {
            sub: principal.identity_id,
            username: principal.username.clone(),
            role: principal.role,
            employee_id: principal.employee_id,
            manager_id: principal.manager_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("token encoding failed: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}

impl TokenVerifier for Hs256TokenService {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, VerificationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` against the injected clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(map_jwt_error)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> VerificationError {
    match e.kind() {
        ErrorKind::ExpiredSignature => VerificationError::Expired,
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Utf8(_) => VerificationError::Malformed(e.to_string()),
        _ => VerificationError::Unknown(e.to_string()),
    }
}
