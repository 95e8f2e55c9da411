use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(app) = expect_optional_object(root, "app")? {
        validate_optional_string_field(app, "app.env", "env")?;
        validate_optional_string_field(app, "app.host", "host")?;
        validate_u64_field(app, "app.port", "port", 0, 65_535)?;
        validate_u64_field(
            app,
            "app.request_timeout_secs",
            "request_timeout_secs",
            1,
            86_400,
        )?;
        validate_string_array_field(app, "app.cors_allowed_origins", "cors_allowed_origins")?;
    }

    if let Some(database) = expect_optional_object(root, "database")? {
        validate_non_empty_string_field(database, "database.path", "path")?;
        validate_u64_field(
            database,
            "database.max_connections",
            "max_connections",
            1,
            64,
        )?;
    }

    if let Some(logging) = expect_optional_object(root, "logging")? {
        validate_optional_string_field(logging, "logging.dir", "dir")?;
        validate_optional_string_field(logging, "logging.level", "level")?;
    }

    if let Some(provider) = expect_optional_object(root, "provider")? {
        validate_non_empty_string_field(provider, "provider.base_url", "base_url")?;
        validate_optional_string_field(provider, "provider.api_key", "api_key")?;
        validate_u64_field(provider, "provider.timeout_secs", "timeout_secs", 1, 3_600)?;
        validate_non_empty_string_field(provider, "provider.embedding_model", "embedding_model")?;
        validate_non_empty_string_field(provider, "provider.chat_model", "chat_model")?;
        validate_f64_field(provider, "provider.temperature", "temperature", 0.0, 2.0)?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_u64_field(embedding, "embedding.dimension", "dimension", 1, 65_536)?;
    }

    if let Some(ingestion) = expect_optional_object(root, "ingestion")? {
        validate_non_empty_string_field(ingestion, "ingestion.source_path", "source_path")?;
        validate_u64_field(ingestion, "ingestion.batch_size", "batch_size", 1, 2_048)?;
    }

    if let Some(inquiry) = expect_optional_object(root, "inquiry")? {
        validate_u64_field(inquiry, "inquiry.top_k", "top_k", 1, 100)?;
        validate_enum_field(
            inquiry,
            "inquiry.answer_mode",
            "answer_mode",
            &["refine", "direct"],
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "non-negative integer"));
    };
    if number < min || number > max {
        return Err(ApiError::invalid_parameter(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if !(min..=max).contains(&number) {
        return Err(ApiError::invalid_parameter(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::invalid_parameter(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    match section.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(config_type_error(path, "string")),
    }
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if !allowed.contains(&text) {
        return Err(ApiError::invalid_parameter(format!(
            "Invalid config at '{}': expected one of {}",
            path,
            allowed.join(", ")
        )));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::invalid_parameter(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::invalid_parameter(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
