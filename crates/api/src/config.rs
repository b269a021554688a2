//! Process configuration.
//!
//! Layering, lowest to highest precedence:
//! 1. compiled defaults (per service)
//! 2. TOML file (`--config`, `ERS_CONFIG`, or `ers.toml` when present)
//! 3. `ERS_*` environment variables, `__` separating nested keys
//!    (`ERS_JWT__SECRET`, `ERS_DATABASE__URL`, `ERS_SERVER__BIND`)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::Duration;
use clap::{Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ers_auth::{Hs256TokenService, TokenKeyError};
use ers_observability::LogSettings;

pub const DEFAULT_CONFIG_FILE: &str = "ers.toml";

#[derive(Debug, Parser)]
#[command(name = "ers-api", version, about = "Employee reimbursement services")]
pub struct Cli {
    #[command(subcommand)]
    pub service: Service,

    /// TOML configuration file.
    #[arg(long, global = true, env = "ERS_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Which of the three services this process runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Subcommand)]
pub enum Service {
    /// Registration, login and token issuing.
    Auth,
    /// Employee directory.
    Directory,
    /// Reimbursement requests and approvals.
    Reimbursement,
}

impl Service {
    pub fn name(self) -> &'static str {
        match self {
            Service::Auth => "auth",
            Service::Directory => "directory",
            Service::Reimbursement => "reimbursement",
        }
    }

    pub fn default_bind(self) -> SocketAddr {
        let port = match self {
            Service::Auth => 8081,
            Service::Directory => 8082,
            Service::Reimbursement => 8083,
        };
        SocketAddr::from(([0, 0, 0, 0], port))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("jwt.secret is not set (use ERS_JWT__SECRET or the config file)")]
    MissingSecret,

    #[error("invalid jwt settings: {0}")]
    InvalidJwt(#[from] TokenKeyError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: String,
    pub ttl_minutes: i64,
}

impl core::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

impl JwtConfig {
    /// Build the token service; refuses a missing or short secret.
    pub fn token_service(&self) -> Result<Hs256TokenService, ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        // Out-of-range values fall through to the non-positive ttl error.
        let ttl = Duration::try_minutes(self.ttl_minutes).unwrap_or_else(Duration::zero);
        Ok(Hs256TokenService::new(self.secret.as_bytes(), ttl)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL. Without one the service keeps its data in memory.
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogSettings,
}

impl AppConfig {
    /// Compiled defaults for `service`. The signing secret is left empty.
    pub fn defaults(service: Service) -> Self {
        Self {
            server: ServerConfig {
                bind: service.default_bind(),
            },
            jwt: JwtConfig {
                secret: String::new(),
                ttl_minutes: 60,
            },
            database: DatabaseConfig::default(),
            log: LogSettings::default(),
        }
    }

    pub fn figment(service: Service, file: Option<&Path>) -> Figment {
        let file = file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Self::defaults(service)))
            .merge(Toml::file(file))
            .merge(Env::prefixed("ERS_").split("__"))
    }

    pub fn load(service: Service, file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(service, file)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }
}
