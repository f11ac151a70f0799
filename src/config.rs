use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://school.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// When set, principals are resolved by calling this userinfo endpoint;
    /// otherwise trusted `x-user-*` headers from the fronting proxy are used.
    pub identity_userinfo_url: Option<String>,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let raw_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR {:?} is invalid: {}", raw_addr, e)))?;

        let identity_userinfo_url = env::var("IDENTITY_USERINFO_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            database_url,
            bind_addr,
            identity_userinfo_url,
        })
    }
}
