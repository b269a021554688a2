//! HTTP application wiring (Axum routers per service).
//!
//! - `services.rs`: store and token wiring from configuration
//! - `routes/`: HTTP handlers, one file per service area
//! - `dto.rs`: response bodies and query strings
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use ers_auth::{AuthService, TokenVerifier};
use ers_directory::DirectoryService;
use ers_reimbursement::ReimbursementService;

use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Credential service: login and register are public, `/me` is protected.
pub fn build_auth_app(auth: Arc<AuthService>, verifier: Arc<dyn TokenVerifier>) -> Router {
    let public = Router::new().nest("/api/auth", routes::auth::public_router());
    let protected = Router::new().nest("/api/auth", routes::auth::protected_router());

    finish(public, protected, verifier).layer(Extension(auth))
}

pub fn build_directory_app(
    directory: Arc<DirectoryService>,
    verifier: Arc<dyn TokenVerifier>,
) -> Router {
    let protected = Router::new().nest("/api/employees", routes::employees::router());

    finish(Router::new(), protected, verifier).layer(Extension(directory))
}

pub fn build_reimbursement_app(
    reimbursements: Arc<ReimbursementService>,
    verifier: Arc<dyn TokenVerifier>,
) -> Router {
    let protected = Router::new().nest("/api/reimbursements", routes::reimbursements::router());

    finish(Router::new(), protected, verifier).layer(Extension(reimbursements))
}

/// Shared shell: public health check, fail-closed auth on `protected`,
/// request tracing and panic recovery.
fn finish(public: Router, protected: Router, verifier: Arc<dyn TokenVerifier>) -> Router {
    let auth_state = AuthState { verifier };
    let protected = protected.route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(public)
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(errors::panic_to_response)),
        )
}
