use std::net::SocketAddr;

use actix_web::http::Uri;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_POOL_MAX_SIZE: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a number, got {0:?}")]
    Port(String),
    #[error("HTTP_HOST and PORT do not form a socket address: {0}")]
    Address(String),
    #[error("PG_POOL_MAX_SIZE must be a positive number, got {0:?}")]
    PoolMaxSize(String),
    #[error("unknown STORAGE_BACKEND {0:?}, expected \"postgres\" or \"memory\"")]
    Backend(String),
    #[error("DATABASE_URL is required for the postgres storage backend")]
    MissingDatabaseUrl,
    #[error("FRONTEND_URL is not a valid origin: {0:?}")]
    Origin(String),
    #[error("TLS_CERT_FILE and TLS_KEY_FILE must be set together")]
    PartialTls,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Postgres { database_url: String, pool_max_size: usize },
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TlsConfig {
    pub cert_file: String,
    pub key_file: String,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub address: SocketAddr,
    pub storage: StorageBackend,
    /// `None` allows any origin.
    pub frontend_url: Option<String>,
    pub tls: Option<TlsConfig>,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|_| ConfigError::Port(port))?,
            None => DEFAULT_PORT,
        };
        let host = var("HTTP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let address = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::Address(err.to_string()))?;

        let storage = match var("STORAGE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => {
                let database_url = var("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?;
                let pool_max_size = match var("PG_POOL_MAX_SIZE") {
                    Some(size) => match size.trim().parse::<usize>() {
                        Ok(parsed) if parsed > 0 => parsed,
                        _ => return Err(ConfigError::PoolMaxSize(size)),
                    },
                    None => DEFAULT_POOL_MAX_SIZE,
                };
                StorageBackend::Postgres { database_url, pool_max_size }
            }
            "memory" => StorageBackend::Memory,
            other => return Err(ConfigError::Backend(other.to_owned())),
        };

        let frontend_url = match var("FRONTEND_URL") {
            Some(origin) => {
                let uri = origin.parse::<Uri>().map_err(|_| ConfigError::Origin(origin.clone()))?;
                if uri.scheme().is_none() || uri.host().is_none() {
                    return Err(ConfigError::Origin(origin));
                }
                Some(origin)
            }
            None => None,
        };

        let tls = match (var("TLS_CERT_FILE"), var("TLS_KEY_FILE")) {
            (Some(cert_file), Some(key_file)) => Some(TlsConfig { cert_file, key_file }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        Ok(Config {
            address,
            storage,
            frontend_url,
            tls,
        })
    }
}
