//! Infrastructure wiring: stores, hasher and token service for one process.

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use thiserror::Error;

use ers_auth::{Argon2PasswordHasher, AuthService, CredentialStore, PasswordHasher, TokenVerifier};
use ers_directory::{DirectoryService, DirectoryStore};
use ers_infra::{
    InMemoryCredentialStore, InMemoryDirectoryStore, InMemoryReimbursementStore,
    PostgresCredentialStore, PostgresDirectoryStore, PostgresReimbursementStore, db,
};
use ers_reimbursement::{ReimbursementService, ReimbursementStore};

use crate::config::{AppConfig, ConfigError, DatabaseConfig, Service};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to postgres: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("failed to apply migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// The three store ports, backed either by memory or by one Postgres pool.
#[derive(Clone)]
pub struct Stores {
    pub credentials: Arc<dyn CredentialStore>,
    pub directory: Arc<dyn DirectoryStore>,
    pub reimbursements: Arc<dyn ReimbursementStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            credentials: Arc::new(InMemoryCredentialStore::new()),
            directory: Arc::new(InMemoryDirectoryStore::new()),
            reimbursements: Arc::new(InMemoryReimbursementStore::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            credentials: Arc::new(PostgresCredentialStore::new(pool.clone())),
            directory: Arc::new(PostgresDirectoryStore::new(pool.clone())),
            reimbursements: Arc::new(PostgresReimbursementStore::new(pool)),
        }
    }

    /// Connect and migrate when a URL is configured; otherwise keep data in
    /// memory for the lifetime of the process.
    pub async fn open(cfg: &DatabaseConfig) -> Result<Self, StartupError> {
        let Some(url) = cfg.url.as_deref() else {
            tracing::warn!("database.url not set; using in-memory stores");
            return Ok(Self::in_memory());
        };

        let pool = db::connect(url, cfg.max_connections)
            .await
            .map_err(StartupError::Connect)?;
        db::migrate(&pool).await?;
        Ok(Self::postgres(pool))
    }
}

/// Build the router for `service` from loaded configuration.
///
/// Refuses to start without a usable signing secret.
pub async fn build_router(service: Service, cfg: &AppConfig) -> Result<Router, StartupError> {
    let tokens = Arc::new(cfg.jwt.token_service()?);
    let verifier: Arc<dyn TokenVerifier> = tokens.clone();
    let stores = Stores::open(&cfg.database).await?;
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());

    let router = match service {
        Service::Auth => super::build_auth_app(
            Arc::new(AuthService::new(stores.credentials, hasher, tokens)),
            verifier,
        ),
        Service::Directory => super::build_directory_app(
            Arc::new(DirectoryService::new(stores.directory, hasher)),
            verifier,
        ),
        Service::Reimbursement => super::build_reimbursement_app(
            Arc::new(ReimbursementService::new(stores.reimbursements)),
            verifier,
        ),
    };
    Ok(router)
}
