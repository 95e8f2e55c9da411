use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::types::AppConfig;
use super::validation::validate_config;
use crate::core::errors::{ApiError, ErrorCode};

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "total_tokens", "tokens"];

/// Environment variables layered over the YAML files, with their config path.
const ENV_OVERRIDES: [(&str, &[&str]); 6] = [
    ("PORT", &["app", "port"]),
    ("APP_ENV", &["app", "env"]),
    ("INQUIRY_DATABASE_PATH", &["database", "path"]),
    ("INQUIRY_SOURCE_PATH", &["ingestion", "source_path"]),
    ("INQUIRY_PROVIDER_BASE_URL", &["provider", "base_url"]),
    ("OPENAI_API_KEY", &["provider", "api_key"]),
];

#[derive(Debug, Clone)]
pub struct ConfigService {
    config_path: PathBuf,
    secrets_path: PathBuf,
}

impl ConfigService {
    pub fn new(config_path: PathBuf, secrets_path: PathBuf) -> Self {
        Self {
            config_path,
            secrets_path,
        }
    }

    /// `INQUIRY_CONFIG_PATH` / `INQUIRY_SECRETS_PATH`, else `config.yml` and
    /// `secrets.yaml` in the working directory.
    pub fn from_env() -> Self {
        let config_path = env::var("INQUIRY_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.yml"));
        let secrets_path = env::var("INQUIRY_SECRETS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                config_path
                    .parent()
                    .map(|dir| dir.join("secrets.yaml"))
                    .unwrap_or_else(|| PathBuf::from("secrets.yaml"))
            });
        Self::new(config_path, secrets_path)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<AppConfig, ApiError> {
        self.load_with_env(|key| env::var(key).ok())
    }

    pub fn load_with_env<F>(&self, lookup: F) -> Result<AppConfig, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut merged = self.load_value()?;
        apply_env_overrides(&mut merged, lookup)?;
        validate_config(&merged)?;

        serde_json::from_value(merged).map_err(|e| {
            ApiError::with_source(ErrorCode::InvalidParameter, "failed to decode config", e)
        })
    }

    /// Public config deep-merged with the secrets file, before env overrides.
    pub fn load_value(&self) -> Result<Value, ApiError> {
        let public_config = load_yaml_file(&self.config_path)?;
        let secrets_config = load_yaml_file(&self.secrets_path)?;
        Ok(deep_merge(&public_config, &secrets_config))
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ApiError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ApiError::with_source(
            ErrorCode::InternalError,
            format!("failed to read {}", path.display()),
            e,
        )
    })?;
    let value = serde_yaml::from_str::<Value>(&contents).map_err(|e| {
        ApiError::with_source(
            ErrorCode::InvalidParameter,
            format!("failed to parse {}", path.display()),
            e,
        )
    })?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ApiError::invalid_parameter(format!(
            "{} must contain a mapping at the top level",
            path.display()
        ))),
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F) -> Result<(), ApiError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, path) in ENV_OVERRIDES {
        let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };

        let value = if var == "PORT" {
            let port = raw.trim().parse::<u16>().map_err(|_| {
                ApiError::invalid_parameter(format!(
                    "PORT must be a valid port number, got '{}'",
                    raw
                ))
            })?;
            Value::from(port)
        } else {
            Value::String(raw)
        };
        ensure_object_path(config, path, value);
    }
    Ok(())
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}
