use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Process-wide settings read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub algorithm: Algorithm,
    /// Lifetime of issued access tokens, from `ACCESS_TOKEN_EXPIRE_MINUTES`.
    pub access_token_ttl: Duration,
    pub mongodb_url: String,
    pub database_name: String,
    pub cors_origins: Vec<String>,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_timeout_secs: u64,
    pub bcrypt_cost: u32,
    pub server_port: u16,
    pub server_host: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value '{}'", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let algorithm = parse_algorithm(&or_default("ALGORITHM", "HS256"))?;

        Ok(Self {
            secret_key: required("SECRET_KEY")?,
            algorithm,
            access_token_ttl: parse_token_ttl(or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "30"))?,
            mongodb_url: required("MONGODB_URL")?,
            database_name: required("DATABASE_NAME")?,
            cors_origins: or_default("CORS_ORIGINS", "*")
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            openai_api_key: or_default("OPENAI_API_KEY", ""),
            openai_base_url: or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: or_default("OPENAI_MODEL", "gpt-3.5-turbo"),
            openai_timeout_secs: parse_number(
                "OPENAI_TIMEOUT_SECS",
                or_default("OPENAI_TIMEOUT_SECS", "30"),
            )?,
            bcrypt_cost: parse_number("BCRYPT_COST", or_default("BCRYPT_COST", "12"))?,
            server_port: parse_number("SERVER_PORT", or_default("SERVER_PORT", "8080"))?,
            server_host: or_default("SERVER_HOST", "127.0.0.1"),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    /// True when `CORS_ORIGINS` allows every origin.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

// Expiry timestamps are computed as now + ttl, which must stay representable.
fn parse_token_ttl(value: String) -> Result<Duration, ConfigError> {
    let minutes: i64 = parse_number("ACCESS_TOKEN_EXPIRE_MINUTES", value.clone())?;
    Some(minutes)
        .filter(|minutes| *minutes >= 0)
        .and_then(Duration::try_minutes)
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or(ConfigError::Invalid {
            key: "ACCESS_TOKEN_EXPIRE_MINUTES",
            value,
        })
}

// Tokens are signed with a shared secret, so only the HMAC family is usable.
fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(value.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::Invalid {
            key: "ALGORITHM",
            value: value.to_string(),
        }),
    }
}
