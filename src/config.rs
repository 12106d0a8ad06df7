//! Configuration module

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::decision::DecisionPolicy;
use crate::model::ModelFormat;
use crate::scoring::PersistenceMode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Record store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Csv,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "csv" => Ok(StoreBackend::Csv),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("expected postgres, csv or memory, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected pretty or json, got {other:?}")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Classifier artifact
    pub model_path: PathBuf,
    pub model_format: ModelFormat,

    /// Record store selection
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub records_path: PathBuf,

    /// Labelling threshold, validated at load time
    pub decision_policy: DecisionPolicy,

    pub persistence_mode: PersistenceMode,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_path = PathBuf::from(
            lookup("MODEL_PATH").unwrap_or_else(|| "models/fraud_model.json".to_string()),
        );
        let model_format = match lookup("MODEL_FORMAT") {
            Some(value) => parse("MODEL_FORMAT", value)?,
            None => ModelFormat::from_path(&model_path),
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        let store_backend = match lookup("STORE_BACKEND") {
            Some(value) => parse("STORE_BACKEND", value)?,
            None if database_url.is_some() => StoreBackend::Postgres,
            None => StoreBackend::Csv,
        };
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let decision_policy = match lookup("LABEL_THRESHOLD") {
            Some(value) => {
                let threshold: f64 = parse("LABEL_THRESHOLD", value.clone())?;
                DecisionPolicy::new(threshold).map_err(|e| ConfigError::Invalid {
                    name: "LABEL_THRESHOLD",
                    value,
                    reason: e.to_string(),
                })?
            }
            None => DecisionPolicy::default(),
        };

        Ok(Self {
            port: optional(&lookup, "PORT", 8080)?,
            model_path,
            model_format,
            store_backend,
            database_url,
            database_max_connections: optional(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            records_path: PathBuf::from(
                lookup("RECORDS_PATH").unwrap_or_else(|| "data/transactions.csv".to_string()),
            ),
            decision_policy,
            persistence_mode: optional(&lookup, "PERSISTENCE_MODE", PersistenceMode::Strict)?,
            log_format: optional(&lookup, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

fn parse<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

fn optional<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => parse(name, value),
        None => Ok(default),
    }
}
