use serde::{Deserialize, Serialize};
use std::{env, fmt};

pub const DEFAULT_NAZOTTE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Local,
    Dev,
    Test,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_env(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "local" => Self::Local,
            "dev" | "development" => Self::Dev,
            "test" | "testing" => Self::Test,
            "staging" => Self::Staging,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Staging => "staging",
            Self::Prod => "prod",
        };
        write!(f, "{}", value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub environment: Environment,
    pub region: Option<String>,
    pub metrics_addr: Option<String>,
    pub log_level: String,
}

impl ServiceConfig {
    pub fn from_env(default_service_name: &str) -> Self {
        Self {
            service_name: env_var("ESTATE_SERVICE_NAME", default_service_name.to_string()),
            environment: Environment::from_env(&env_var("ESTATE_ENV", "local".to_string())),
            region: env::var("ESTATE_REGION").ok(),
            metrics_addr: env::var("ESTATE_METRICS_ADDR").ok(),
            log_level: env_var("ESTATE_LOG_LEVEL", "info".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Upper bound on estates returned by one polygon search.
    pub nazotte_limit: usize,
}

impl SearchConfig {
    pub fn from_env() -> Self {
        Self {
            nazotte_limit: env_var_usize("ESTATE_NAZOTTE_LIMIT", DEFAULT_NAZOTTE_LIMIT),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            nazotte_limit: DEFAULT_NAZOTTE_LIMIT,
        }
    }
}

fn env_var(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn env_var_usize(key: &str, default: usize) -> usize {
    parse_usize(env::var(key).ok().as_deref(), default)
}

fn parse_usize(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}
