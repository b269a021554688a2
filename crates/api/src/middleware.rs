use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use ers_auth::{Principal, TokenVerifier, VerificationError};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Fail-closed bearer authentication.
///
/// Every request through this layer either carries a valid token and gets a
/// [`PrincipalContext`], or is answered with 401 before reaching a handler.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers()).map_err(|reason| {
        tracing::warn!(path = %req.uri().path(), reason, "rejected request without usable bearer token");
        json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Missing or invalid Authorization header",
        )
    })?;

    let claims = state.verifier.verify(token, Utc::now()).map_err(|e| {
        tracing::warn!(path = %req.uri().path(), kind = verification_kind(&e), "token verification failed");
        verification_error_to_response(&e)
    })?;

    let principal = Principal::from(claims);
    tracing::debug!(username = %principal.username, role = %principal.role, "authenticated");
    req.extensions_mut().insert(PrincipalContext::new(principal));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing authorization header")?;

    let header = header.to_str().map_err(|_| "authorization header is not ascii")?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or("authorization scheme is not Bearer")?;

    let token = header.trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(token)
}

fn verification_kind(e: &VerificationError) -> &'static str {
    match e {
        VerificationError::Expired => "expired",
        VerificationError::Malformed(_) => "malformed",
        VerificationError::Unknown(_) => "unknown",
    }
}

fn verification_error_to_response(e: &VerificationError) -> Response {
    match e {
        VerificationError::Expired => {
            json_error(StatusCode::UNAUTHORIZED, "token_expired", "Token has expired")
        }
        VerificationError::Malformed(_) => {
            json_error(StatusCode::UNAUTHORIZED, "token_malformed", "Token is malformed")
        }
        VerificationError::Unknown(_) => {
            json_error(StatusCode::UNAUTHORIZED, "token_invalid", "Token could not be verified")
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        h
    }

    #[test]
    fn bearer_token_is_extracted_and_trimmed() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def.ghi ")), Ok("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_rejected() {
        assert!(extract_bearer(&HeaderMap::new()).is_err());
        assert!(extract_bearer(&headers("Basic dXNlcjpwdw==")).is_err());
        assert!(extract_bearer(&headers("Bearer    ")).is_err());
        assert!(extract_bearer(&headers("bearer abc")).is_err());
    }
}
