use serde::Deserialize;
use thiserror::Error;

/// Minimum length of the HS256 signing secret, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Env(#[from] envy::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration, read from environment variables (`DATABASE_URL`, `JWT_SECRET`, ...).
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_jwt_expiry_hours")]
    pub jwt_expiry_hours: i64,
    #[serde(default = "default_refresh_token_expiry_days")]
    pub refresh_token_expiry_days: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    /// TTS is disabled when unset
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_tts_timeout_secs")]
    pub tts_timeout_secs: u64,
    #[serde(default = "default_upload_base_url")]
    pub upload_base_url: String,
    #[serde(default = "default_upload_max_bytes")]
    pub upload_max_bytes: i64,
}

fn default_port() -> u16 {
    3000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3001".to_string()]
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_jwt_expiry_hours() -> i64 {
    24
}

fn default_refresh_token_expiry_days() -> i64 {
    30
}

fn default_bcrypt_cost() -> u32 {
    12
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_tts_timeout_secs() -> u64 {
    60
}

fn default_upload_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_upload_max_bytes() -> i64 {
    10 * 1024 * 1024
}

/// Keys looked up in the Shuttle secret store
#[cfg(feature = "shuttle")]
const SECRET_KEYS: &[&str] = &[
    "JWT_SECRET",
    "ENV",
    "PORT",
    "ALLOWED_ORIGINS",
    "DB_MAX_CONNECTIONS",
    "JWT_EXPIRY_HOURS",
    "REFRESH_TOKEN_EXPIRY_DAYS",
    "BCRYPT_COST",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "TTS_TIMEOUT_SECS",
    "UPLOAD_BASE_URL",
    "UPLOAD_MAX_BYTES",
];

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Same keys as [`ApiConfig::from_env`], read from any key/value source.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(pairs)?;
        config.validate()?;
        Ok(config)
    }

    /// Shuttle provisions the database, so its URL comes from the platform rather than secrets.
    #[cfg(feature = "shuttle")]
    pub fn from_shuttle_secrets(
        secrets: &shuttle_runtime::SecretStore,
        database_url: String,
    ) -> Result<Self, ConfigError> {
        let pairs = SECRET_KEYS
            .iter()
            .filter_map(|key| secrets.get(key).map(|value| (key.to_string(), value)))
            .chain(std::iter::once(("DATABASE_URL".to_string(), database_url)));
        Self::from_pairs(pairs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes"
            )));
        }
        if self.jwt_expiry_hours <= 0 || self.refresh_token_expiry_days <= 0 {
            return Err(ConfigError::Invalid(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid(
                "BCRYPT_COST must be between 4 and 31".to_string(),
            ));
        }
        if self.upload_max_bytes <= 0 {
            return Err(ConfigError::Invalid(
                "UPLOAD_MAX_BYTES must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Allowed CORS origins with surrounding whitespace and empty entries removed.
    pub fn parsed_allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn tts_enabled(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}
