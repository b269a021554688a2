//! Registration and login flows.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use ers_core::{DomainError, DomainResult, EmployeeId, IdentityId, StoreError};

use crate::{
    CredentialStore, Hs256TokenService, Identity, IssuedToken, PasswordHasher, Principal, Role,
};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Registration input as received from the client.
///
/// `role` stays a string here: it is parsed into [`Role`] by
/// [`AuthService::register`], which is the trust boundary for it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    #[serde(default)]
    pub manager_id: Option<EmployeeId>,
}

/// Credential-store facade: the only component that mints tokens.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<Hs256TokenService>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<Hs256TokenService>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Authenticate and mint a token.
    ///
    /// Unknown user, wrong password and disabled identity all fail with the
    /// same `InvalidCredentials`.
    pub async fn login(&self, req: &LoginRequest) -> DomainResult<IssuedToken> {
        let Some(identity) = self.store.find_by_username(req.username.trim()).await? else {
            self.hasher.verify_dummy(&req.password);
            tracing::info!("login failed");
            return Err(DomainError::InvalidCredentials);
        };

        if !self.hasher.verify(&req.password, &identity.password_hash) || !identity.enabled {
            tracing::info!(identity_id = %identity.id, "login failed");
            return Err(DomainError::InvalidCredentials);
        }

        let issued = self.tokens.issue(&Principal::from(&identity))?;
        tracing::info!(identity_id = %identity.id, role = %identity.role, "login succeeded");
        Ok(issued)
    }

    pub async fn register(&self, req: RegisterRequest) -> DomainResult<Identity> {
        let username = req.username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::validation("username", "Username is required"));
        }
        if req.password.is_empty() {
            return Err(DomainError::validation("password", "Password is required"));
        }
        if self.store.find_by_username(&username).await?.is_some() {
            return Err(DomainError::DuplicateUsername);
        }
        let role: Role = req
            .role
            .parse()
            .map_err(|e: crate::UnknownRole| DomainError::validation("role", e.to_string()))?;
        if role == Role::Employee && req.manager_id.is_none() {
            return Err(DomainError::MissingManager);
        }

        let password_hash = self
            .hasher
            .hash(&req.password)
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let identity = Identity {
            id: IdentityId::new(),
            employee_id: req.employee_id,
            manager_id: req.manager_id,
            username,
            password_hash,
            role,
            enabled: true,
            created_at: Utc::now(),
        };

        match self.store.insert(identity.clone()).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration of the same name/number.
            Err(StoreError::Duplicate(field)) if field == "username" => {
                return Err(DomainError::DuplicateUsername);
            }
            Err(StoreError::Duplicate(field)) if field == "employee_id" => {
                let number = identity.employee_id.map(EmployeeId::get).unwrap_or_default();
                return Err(DomainError::DuplicateEmployeeId(number));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(identity_id = %identity.id, role = %identity.role, "identity registered");
        Ok(identity)
    }
}
