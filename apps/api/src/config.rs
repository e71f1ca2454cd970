//! API server configuration.
//!
//! Values are layered, later sources winning:
//!
//! ```text
//! built-in defaults ──► smartpos.toml (optional) ──► SMARTPOS_* environment
//! ```
//!
//! | Variable                      | Default          |
//! |-------------------------------|------------------|
//! | `SMARTPOS_DATABASE_PATH`      | `./smartpos.db`  |
//! | `SMARTPOS_PORT`               | `4000`           |
//! | `SMARTPOS_JWT_SECRET`         | dev secret       |
//! | `SMARTPOS_JWT_LIFETIME_SECS`  | `604800` (7 days)|
//! | `SMARTPOS_MANAGER_EMAIL`      | unset            |
//! | `SMARTPOS_FRONTEND_URL`       | unset (any)      |
//! | `SMARTPOS_NOTIFIER`           | `outbox`         |

use serde::{Deserialize, Serialize};

const DEV_JWT_SECRET: &str = "smartpos-dev-secret-change-in-production";

/// How outbound notifications are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Persist to the notification outbox for the mail relay.
    #[default]
    Outbox,
    /// Only log the message.
    Log,
}

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// SQLite database file
    pub database_path: String,

    /// HTTP listen port
    pub port: u16,

    /// Secret for signing JWTs
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Recipient of low-stock alerts and cc of approved orders
    #[serde(default)]
    pub manager_email: Option<String>,

    /// Allowed CORS origin; any origin when unset
    #[serde(default)]
    pub frontend_url: Option<String>,

    #[serde(default)]
    pub notifier: NotifierKind,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            database_path: "./smartpos.db".to_string(),
            port: 4000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 604_800,
            manager_email: None,
            frontend_url: None,
            notifier: NotifierKind::Outbox,
        }
    }
}

impl ApiConfig {
    /// Load configuration from defaults, `smartpos.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let settings = config::Config::builder()
            .set_default("database_path", defaults.database_path)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_lifetime_secs", defaults.jwt_lifetime_secs)?
            .set_default("notifier", "outbox")?
            .add_source(config::File::with_name("smartpos").required(false))
            .add_source(config::Environment::with_prefix("SMARTPOS").try_parsing(true))
            .build()?;

        let config: ApiConfig = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }

        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }

        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }

        if let Some(email) = self.manager_email.as_deref() {
            if smartpos_core::validation::validate_email(email).is_err() {
                return Err(ConfigError::InvalidValue("manager_email".to_string()));
            }
        }

        Ok(())
    }

    /// True when the signing secret is still the built-in development one.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
