//! `ers-auth`: identity, token and authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: the credential
//! store is a port implemented by `ers-infra`, and the token service only needs
//! the signing key.

pub mod authorize;
pub mod claims;
pub mod identity;
pub mod password;
pub mod principal;
pub mod roles;
pub mod service;
pub mod token;

pub use authorize::require_role;
pub use claims::{TokenClaims, VerificationError, validate_claims};
pub use identity::{CredentialStore, Identity};
pub use password::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
pub use service::{AuthService, LoginRequest, RegisterRequest};
pub use token::{Hs256TokenService, IssuedToken, TokenKeyError, TokenVerifier};
