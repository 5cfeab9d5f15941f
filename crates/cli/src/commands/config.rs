use std::env;
use std::fs;
use std::path::Path;

use secrecy::ExposeSecret;
use shopfront_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

struct Field<'a> {
    key_path: &'a str,
    value: String,
    env_keys: &'a [&'a str],
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mock_functions_key = config
        .reviews
        .mock_functions_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let fields = [
        Field {
            key_path: "catalog.base_url",
            value: config.catalog.base_url.clone(),
            env_keys: &["SHOPFRONT_CATALOG_BASE_URL"],
        },
        Field {
            key_path: "reviews.external_base_url",
            value: config.reviews.external_base_url.clone(),
            env_keys: &["SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL"],
        },
        Field {
            key_path: "reviews.external_api_key",
            value: redact_secret(config.reviews.external_api_key.expose_secret()),
            env_keys: &["SHOPFRONT_REVIEWS_EXTERNAL_API_KEY"],
        },
        Field {
            key_path: "reviews.mock_base_url",
            value: config.reviews.mock_base_url.clone(),
            env_keys: &["SHOPFRONT_REVIEWS_MOCK_BASE_URL"],
        },
        Field {
            key_path: "reviews.mock_functions_key",
            value: mock_functions_key,
            env_keys: &["SHOPFRONT_REVIEWS_MOCK_FUNCTIONS_KEY"],
        },
        Field {
            key_path: "reviews.request_timeout_ms",
            value: config.reviews.request_timeout_ms.to_string(),
            env_keys: &["SHOPFRONT_REVIEWS_REQUEST_TIMEOUT_MS"],
        },
        Field {
            key_path: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["SHOPFRONT_SERVER_BIND_ADDRESS"],
        },
        Field {
            key_path: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["SHOPFRONT_SERVER_PORT"],
        },
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["SHOPFRONT_LOGGING_LEVEL", "SHOPFRONT_LOG_LEVEL"],
        },
        Field {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["SHOPFRONT_LOGGING_FORMAT", "SHOPFRONT_LOG_FORMAT"],
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the first four characters of long secrets so operators can tell
/// keys apart without exposing them.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if trimmed.chars().count() > 12 {
        let prefix: String = trimmed.chars().take(4).collect();
        return format!("{prefix}***");
    }

    "<redacted>".to_string()
}
