use std::time::Duration;

use bb8::Pool;
use bb8_tiberius::ConnectionManager;
use tiberius::{AuthMethod, Config};

use crate::error::StoreError;

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub trust_server_certificate: bool,
    pub connection_timeout: Duration,
    pub command_timeout: Duration,
}

pub type DbPool = Pool<ConnectionManager>;

pub async fn build_pool(config: &DatabaseConfig) -> Result<DbPool, StoreError> {
    let mut tiberius_config = Config::new();
    tiberius_config.host(&config.server);
    tiberius_config.port(config.port);
    tiberius_config.database(&config.database);
    tiberius_config.authentication(AuthMethod::sql_server(&config.username, &config.password));
    if config.trust_server_certificate {
        tiberius_config.trust_cert();
    }

    let manager = ConnectionManager::new(tiberius_config);
    Pool::builder()
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))
}
