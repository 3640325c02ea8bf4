use std::env;
use std::net::SocketAddr;

use crate::auth::Session;
use crate::error::AppError;
use crate::graphql::GraphqlConfig;
use crate::storage::StorageConfig;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub upload_limit_bytes: usize,
    /// `None` runs against the in-memory data service.
    pub graphql: Option<GraphqlConfig>,
    /// `None` runs against the in-memory blob store.
    pub storage: Option<StorageConfig>,
    pub session: Option<Session>,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let raw_addr = env::var("TODO_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("Invalid TODO_BIND_ADDR {}: {}", raw_addr, e)))?;

        let upload_limit_bytes = match env::var("TODO_UPLOAD_LIMIT_BYTES") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|e| AppError::Config(format!("Invalid TODO_UPLOAD_LIMIT_BYTES {}: {}", raw, e)))?,
            Err(_) => DEFAULT_UPLOAD_LIMIT_BYTES,
        };

        Ok(Self {
            bind_addr,
            upload_limit_bytes,
            graphql: GraphqlConfig::new_from_env()?,
            storage: StorageConfig::new_from_env()?,
            session: Session::from_env(),
        })
    }

    pub fn local() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
            graphql: None,
            storage: None,
            session: None,
        }
    }
}
