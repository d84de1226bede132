use std::env;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_STATE_DIR: &str = ".classflow-state";

#[derive(Debug, Clone)]
pub struct Settings {
    api: ApiSettings,
    storage: StorageSettings,
    telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub state_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    pub log_level: String,
    pub json: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url = env_or_default("CLASSFLOW_API_URL", DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        let request_timeout_secs = parse_u64(
            "CLASSFLOW_API_TIMEOUT_SECONDS",
            env_or_default("CLASSFLOW_API_TIMEOUT_SECONDS", "30"),
        )?;

        let state_dir = PathBuf::from(env_or_default("CLASSFLOW_STATE_DIR", DEFAULT_STATE_DIR));

        let log_level = env_or_default("CLASSFLOW_LOG_LEVEL", "info");
        let json = env_optional("CLASSFLOW_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            api: ApiSettings { base_url, request_timeout_secs },
            storage: StorageSettings { state_dir },
            telemetry: TelemetrySettings { log_level, json },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "CLASSFLOW_API_URL",
                value: String::from("<empty>"),
            });
        }
        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "CLASSFLOW_API_TIMEOUT_SECONDS",
                value: String::from("0"),
            });
        }
        Ok(())
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue { field, value })
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}
