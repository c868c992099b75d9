//! Application configuration loaded from environment variables.

use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown SERVICE_ROLE {0:?}, expected orders, inventory or all")]
    UnknownRole(String),

    #[error("RABBITMQ_URL must start with amqp:// or amqps://, got {0:?}")]
    InvalidBrokerUrl(String),

    #[error("SAGA_STRICT_TRANSITIONS must be a boolean, got {0:?}")]
    InvalidBool(String),
}

/// Which side of the saga this process hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceRole {
    /// Order endpoints, the outcome completer and the user view projection.
    Orders,
    /// Stock endpoints and the reservation responder.
    Inventory,
    /// Both services in one process.
    #[default]
    All,
}

impl ServiceRole {
    pub fn runs_orders(&self) -> bool {
        matches!(self, ServiceRole::Orders | ServiceRole::All)
    }

    pub fn runs_inventory(&self) -> bool {
        matches!(self, ServiceRole::Inventory | ServiceRole::All)
    }
}

impl FromStr for ServiceRole {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orders" => Ok(ServiceRole::Orders),
            "inventory" => Ok(ServiceRole::Inventory),
            "all" => Ok(ServiceRole::All),
            _ => Err(ConfigError::UnknownRole(s.to_string())),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL connection string (default: in-memory storage)
/// - `RABBITMQ_URL` — AMQP broker URL (default: in-process bus)
/// - `SERVICE_ROLE` — `orders`, `inventory` or `all` (default: `all`)
/// - `SAGA_STRICT_TRANSITIONS` — only complete pending orders (default: `false`)
/// - `QUEUE_CAPACITY` — buffered deliveries per consumer (default: `256`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub rabbitmq_url: Option<String>,
    pub role: ServiceRole,
    pub strict_transitions: bool,
    pub queue_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let rabbitmq_url = lookup("RABBITMQ_URL").filter(|u| !u.is_empty());
        if let Some(url) = &rabbitmq_url
            && event_bus::validate_url(url).is_err()
        {
            return Err(ConfigError::InvalidBrokerUrl(url.clone()));
        }

        let role = match lookup("SERVICE_ROLE") {
            Some(role) => role.parse()?,
            None => defaults.role,
        };

        let strict_transitions = match lookup("SAGA_STRICT_TRANSITIONS") {
            Some(value) => parse_bool(&value)?,
            None => defaults.strict_transitions,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|u| !u.is_empty()),
            rabbitmq_url,
            role,
            strict_transitions,
            queue_capacity: lookup("QUEUE_CAPACITY")
                .and_then(|c| c.parse().ok())
                .filter(|c| *c > 0)
                .unwrap_or(defaults.queue_capacity),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool(value.to_string())),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            rabbitmq_url: None,
            role: ServiceRole::All,
            strict_transitions: false,
            queue_capacity: 256,
        }
    }
}
