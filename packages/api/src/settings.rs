use std::net::SocketAddr;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use store::PlacementDefaults;

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS, `*` for any.
    pub cors_origin: String,
    /// Upper bound for request bodies; map images travel inline as data URLs.
    pub body_limit_bytes: usize,
}

impl Server {
    pub fn address(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    /// Full connection string; takes precedence over the individual parts.
    pub url: Option<String>,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub max_connections: u32,
}

impl Database {
    pub fn url(&self) -> String {
        match self.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => url.to_string(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.database
            ),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Auth {
    /// 64 hex chars. When empty a random key is generated per process and
    /// tokens do not survive a restart.
    pub token_key: String,
    pub token_ttl_secs: u64,
    pub min_password_len: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
    #[serde(default)]
    pub placement: PlacementDefaults,
}

impl Settings {
    /// Layered configuration: built-in defaults, then `beaconmap.toml` if
    /// present, then `BEACONMAP__SECTION__KEY` environment variables.
    /// A plain `DATABASE_URL` is honoured when no URL was configured otherwise.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load("beaconmap.toml")
    }

    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3001)?
            .set_default("server.cors_origin", "http://localhost:8080")?
            .set_default("server.body_limit_bytes", 20 * 1024 * 1024)?
            .set_default("database.user", "beaconmap")?
            .set_default("database.password", "password")?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.database", "beaconmap")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.token_key", "")?
            .set_default("auth.token_ttl_secs", 3600)?
            .set_default("auth.min_password_len", 8)?
            .add_source(
                File::with_name(path)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("BEACONMAP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        if settings.database.url.is_none() {
            settings.database.url = std::env::var("DATABASE_URL").ok();
        }
        Ok(settings)
    }
}
