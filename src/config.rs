//! Destination connection settings.
//!
//! Values come from a `.env` file (loaded with `dotenvy`, never overriding
//! variables already set in the process environment), then the process
//! environment. Anything still missing is asked for interactively by
//! [`crate::prompt`].

use std::{env, fmt, path::Path};

use log::{debug, warn};

use crate::error::{IngestError, IngestResult};

pub const DEFAULT_ENV_FILE: &str = ".env";

pub const ENV_HOST: &str = "db_host";
pub const ENV_PORT: &str = "db_port";
pub const ENV_USER: &str = "db_login";
pub const ENV_PASSWORD: &str = "db_pass";
pub const ENV_DATABASE: &str = "db_database";

#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDetails {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ConnectionDetails {
    pub fn to_pg_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password)
            .application_name(env!("CARGO_PKG_NAME"));
        config
    }
}

impl fmt::Debug for ConnectionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDetails")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings as gathered so far; any field may still be missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PartialConnection {
    pub host: Option<String>,
    pub port: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl PartialConnection {
    /// Loads `env_path` (or `.env`) into the process environment, then reads
    /// the connection variables.
    pub fn from_env(env_path: Option<&Path>) -> Self {
        let path = env_path.unwrap_or_else(|| Path::new(DEFAULT_ENV_FILE));
        match dotenvy::from_path(path) {
            Ok(()) => debug!("Loaded environment from {path:?}"),
            Err(err) if env_path.is_some() => warn!("Could not load {path:?}: {err}"),
            Err(err) => debug!("No environment file loaded from {path:?}: {err}"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        PartialConnection {
            host: read(ENV_HOST),
            port: read(ENV_PORT),
            database: read(ENV_DATABASE),
            user: read(ENV_USER),
            password: read(ENV_PASSWORD),
        }
    }

    pub fn missing(&self) -> Vec<&'static str> {
        [
            (ENV_HOST, self.host.is_none()),
            (ENV_PORT, self.port.is_none()),
            (ENV_USER, self.user.is_none()),
            (ENV_PASSWORD, self.password.is_none()),
            (ENV_DATABASE, self.database.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect()
    }

    pub fn complete(self) -> IngestResult<ConnectionDetails> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(IngestError::config(format!(
                "Missing connection setting(s): {}",
                missing.join(", ")
            )));
        }
        let port = parse_port(self.port.as_deref().unwrap_or_default())?;
        Ok(ConnectionDetails {
            host: self.host.unwrap_or_default(),
            port,
            database: self.database.unwrap_or_default(),
            user: self.user.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
        })
    }
}

impl fmt::Debug for PartialConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub fn parse_port(value: &str) -> IngestResult<u16> {
    match value.trim().parse::<u16>() {
        Ok(port) if port >= 1 => Ok(port),
        _ => Err(IngestError::config(format!(
            "Port must be an integer between 1 and 65535, got '{value}'"
        ))),
    }
}
