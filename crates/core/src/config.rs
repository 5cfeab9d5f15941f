use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "shopfront.toml";
pub const NESTED_CONFIG_FILE: &str = "config/shopfront.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub reviews: ReviewsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct ReviewsConfig {
    pub external_base_url: String,
    pub external_api_key: SecretString,
    pub mock_base_url: String,
    pub mock_functions_key: Option<SecretString>,
    pub request_timeout_ms: u64,
}

impl ReviewsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_base_url: Option<String>,
    pub external_base_url: Option<String>,
    pub external_api_key: Option<String>,
    pub mock_base_url: Option<String>,
    pub mock_functions_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig { base_url: "http://localhost:5000".to_string() },
            reviews: ReviewsConfig {
                external_base_url: String::new(),
                external_api_key: String::new().into(),
                mock_base_url: "http://localhost:7071".to_string(),
                mock_functions_key: None,
                request_timeout_ms: 5_000,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(base_url) = catalog.base_url {
                self.catalog.base_url = base_url;
            }
        }

        if let Some(reviews) = patch.reviews {
            if let Some(external_base_url) = reviews.external_base_url {
                self.reviews.external_base_url = external_base_url;
            }
            if let Some(external_api_key) = reviews.external_api_key {
                self.reviews.external_api_key = secret_value(external_api_key);
            }
            if let Some(mock_base_url) = reviews.mock_base_url {
                self.reviews.mock_base_url = mock_base_url;
            }
            if let Some(mock_functions_key) = reviews.mock_functions_key {
                self.reviews.mock_functions_key = Some(secret_value(mock_functions_key));
            }
            if let Some(request_timeout_ms) = reviews.request_timeout_ms {
                self.reviews.request_timeout_ms = request_timeout_ms;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SHOPFRONT_CATALOG_BASE_URL") {
            self.catalog.base_url = value;
        }

        if let Some(value) = read_env("SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL") {
            self.reviews.external_base_url = value;
        }
        if let Some(value) = read_env("SHOPFRONT_REVIEWS_EXTERNAL_API_KEY") {
            self.reviews.external_api_key = secret_value(value);
        }
        if let Some(value) = read_env("SHOPFRONT_REVIEWS_MOCK_BASE_URL") {
            self.reviews.mock_base_url = value;
        }
        if let Some(value) = read_env("SHOPFRONT_REVIEWS_MOCK_FUNCTIONS_KEY") {
            self.reviews.mock_functions_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SHOPFRONT_REVIEWS_REQUEST_TIMEOUT_MS") {
            self.reviews.request_timeout_ms =
                parse_u64("SHOPFRONT_REVIEWS_REQUEST_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = read_env("SHOPFRONT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SHOPFRONT_SERVER_PORT") {
            self.server.port = parse_u16("SHOPFRONT_SERVER_PORT", &value)?;
        }

        let log_level =
            read_env("SHOPFRONT_LOGGING_LEVEL").or_else(|| read_env("SHOPFRONT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SHOPFRONT_LOGGING_FORMAT").or_else(|| read_env("SHOPFRONT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_base_url) = overrides.catalog_base_url {
            self.catalog.base_url = catalog_base_url;
        }
        if let Some(external_base_url) = overrides.external_base_url {
            self.reviews.external_base_url = external_base_url;
        }
        if let Some(external_api_key) = overrides.external_api_key {
            self.reviews.external_api_key = secret_value(external_api_key);
        }
        if let Some(mock_base_url) = overrides.mock_base_url {
            self.reviews.mock_base_url = mock_base_url;
        }
        if let Some(mock_functions_key) = overrides.mock_functions_key {
            self.reviews.mock_functions_key = Some(secret_value(mock_functions_key));
        }
        if let Some(request_timeout_ms) = overrides.request_timeout_ms {
            self.reviews.request_timeout_ms = request_timeout_ms;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_reviews(&self.reviews)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{key} is required")));
    }
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{key} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    validate_http_url("catalog.base_url", &catalog.base_url)
}

fn validate_reviews(reviews: &ReviewsConfig) -> Result<(), ConfigError> {
    validate_http_url("reviews.external_base_url", &reviews.external_base_url)?;
    validate_http_url("reviews.mock_base_url", &reviews.mock_base_url)?;

    if reviews.external_api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "reviews.external_api_key is required to call the external reviews provider"
                .to_string(),
        ));
    }

    if reviews.request_timeout_ms == 0 || reviews.request_timeout_ms > 60_000 {
        return Err(ConfigError::Validation(
            "reviews.request_timeout_ms must be in range 1..=60000".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address is required".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    reviews: Option<ReviewsPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewsPatch {
    external_base_url: Option<String>,
    external_api_key: Option<String>,
    mock_base_url: Option<String>,
    mock_functions_key: Option<String>,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const REQUIRED_VARS: [(&str, &str); 2] = [
        ("SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL", "https://reviews.example.test/api"),
        ("SHOPFRONT_REVIEWS_EXTERNAL_API_KEY", "ext-key-from-env"),
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn set_required_vars() {
        for (key, value) in REQUIRED_VARS {
            env::set_var(key, value);
        }
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_REVIEWS_API_KEY", "key-from-interpolation");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("shopfront.toml");
            fs::write(
                &path,
                r#"
[reviews]
external_base_url = "https://reviews.example.test/api"
external_api_key = "${TEST_REVIEWS_API_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.reviews.external_api_key.expose_secret() == "key-from-interpolation",
                "api key should be interpolated from environment",
            )?;
            ensure(
                config.reviews.external_base_url == "https://reviews.example.test/api",
                "external base url should come from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_REVIEWS_API_KEY"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_vars();
        env::set_var("SHOPFRONT_LOG_LEVEL", "warn");
        env::set_var("SHOPFRONT_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL",
            "SHOPFRONT_REVIEWS_EXTERNAL_API_KEY",
            "SHOPFRONT_LOG_LEVEL",
            "SHOPFRONT_LOG_FORMAT",
        ]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_vars();
        env::set_var("SHOPFRONT_REVIEWS_REQUEST_TIMEOUT_MS", "2500");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("shopfront.toml");
            fs::write(
                &path,
                r#"
[catalog]
base_url = "http://catalog-from-file:5000"

[reviews]
external_api_key = "ext-key-from-file"
request_timeout_ms = 900

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    catalog_base_url: Some("http://catalog-from-override:5000".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.base_url == "http://catalog-from-override:5000",
                "override catalog url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.reviews.external_api_key.expose_secret() == "ext-key-from-env",
                "env api key should win over file and defaults",
            )?;
            ensure(
                config.reviews.request_timeout_ms == 2500,
                "env timeout should win over file",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL",
            "SHOPFRONT_REVIEWS_EXTERNAL_API_KEY",
            "SHOPFRONT_REVIEWS_REQUEST_TIMEOUT_MS",
        ]);
        result
    }

    #[test]
    fn missing_api_key_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL", "https://reviews.example.test/api");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("reviews.external_api_key")
            );
            ensure(has_message, "validation failure should mention reviews.external_api_key")
        })();

        clear_vars(&["SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL"]);
        result
    }

    #[test]
    fn zero_timeout_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_vars();

        let result = (|| -> Result<(), String> {
            let outcome = AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    request_timeout_ms: Some(0),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            });
            ensure(
                matches!(
                    outcome,
                    Err(ConfigError::Validation(ref message))
                        if message.contains("reviews.request_timeout_ms")
                ),
                "zero timeout should fail validation",
            )
        })();

        clear_vars(&["SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL", "SHOPFRONT_REVIEWS_EXTERNAL_API_KEY"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_vars();
        env::set_var("SHOPFRONT_REVIEWS_MOCK_FUNCTIONS_KEY", "functions-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("ext-key-from-env"), "debug output should not contain api key")?;
            ensure(
                !debug.contains("functions-secret-value"),
                "debug output should not contain functions key",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL",
            "SHOPFRONT_REVIEWS_EXTERNAL_API_KEY",
            "SHOPFRONT_REVIEWS_MOCK_FUNCTIONS_KEY",
        ]);
        result
    }
}
