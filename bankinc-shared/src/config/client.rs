use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use url::Url;

/// Address of the BankInc API when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

/// Product code used for the card created right after registration.
pub const DEFAULT_PRODUCT_ID: &str = "PROD01";

/// Errors raised while resolving a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file has a YAML extension but is not valid YAML for this schema.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file has a JSON extension but is not valid JSON for this schema.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Only `yaml`, `yml` and `json` files are understood.
    #[error("Unsupported configuration format. Use 'yaml' or 'json'.")]
    UnsupportedFormat,

    /// An environment override held a value that does not parse.
    #[error("Invalid {var} value: {value}")]
    InvalidEnv {
        /// Name of the offending variable.
        var: &'static str,
        /// The raw value found in the environment.
        value: String,
    },

    /// The base URL cannot have API paths appended to it.
    #[error("base URL {0} cannot carry API paths")]
    InvalidBaseUrl(Url),
}

/// Runtime configuration for the BankInc client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base address of the external banking API
    pub base_url: Url,

    /// Logging level used when `RUST_LOG` is not set
    pub log_level: String,

    /// Where the session is persisted; platform config dir when unset
    pub session_path: Option<PathBuf>,

    /// Product code for cards generated without an explicit product
    pub default_product_id: String,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            base_url: default_base_url(),
            log_level: "warn".to_string(),
            session_path: None,
            default_product_id: DEFAULT_PRODUCT_ID.to_string(),
            user_agent: "bankinc-cli".to_string(),
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Values read from the file win over the environment; the environment
    /// only fills fields that are still at their default. `base_url_override`
    /// (the `--base-url` flag) wins over both.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the file cannot be read or parsed, when
    /// an environment override is malformed, or when the resolved base URL
    /// cannot carry API paths.
    pub fn load_config(
        config_path: Option<PathBuf>,
        base_url_override: Option<Url>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::with_defaults();
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => defaults.clone(),
        };

        if config.base_url == defaults.base_url {
            if let Ok(value) = env::var("BANKINC_BASE_URL") {
                config.base_url = Url::parse(&value).map_err(|_| ConfigError::InvalidEnv {
                    var: "BANKINC_BASE_URL",
                    value,
                })?;
            }
        }
        if config.log_level == defaults.log_level {
            if let Ok(log_level) = env::var("BANKINC_LOG_LEVEL") {
                config.log_level = log_level;
            }
        }
        if config.session_path.is_none() {
            if let Ok(path) = env::var("BANKINC_SESSION_PATH") {
                config.session_path = Some(PathBuf::from(path));
            }
        }
        if config.default_product_id == defaults.default_product_id {
            if let Ok(product) = env::var("BANKINC_PRODUCT_ID") {
                config.default_product_id = product;
            }
        }

        if let Some(base_url) = base_url_override {
            config.base_url = base_url;
        }

        if config.base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(config.base_url));
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat),
        }
    }

    /// Session file location, falling back to the platform config directory.
    #[must_use]
    pub fn resolved_session_path(&self) -> PathBuf {
        self.session_path.clone().unwrap_or_else(default_session_path)
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|_| unreachable!("default base URL is valid"))
}

/// Default location of the persisted session.
#[must_use]
pub fn default_session_path() -> PathBuf {
    BaseDirs::new().map_or_else(
        || PathBuf::from("./bankinc-session.json"),
        |dirs| dirs.config_dir().join("bankinc").join("session.json"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("BANKINC_BASE_URL");
            env::remove_var("BANKINC_LOG_LEVEL");
            env::remove_var("BANKINC_SESSION_PATH");
            env::remove_var("BANKINC_PRODUCT_ID");
        }
    }

    #[test]
    fn test_config_with_defaults() {
        let config = ClientConfig::with_defaults();

        assert_eq!(config.base_url.as_str(), "http://localhost:8081/");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.default_product_id, "PROD01");
        assert!(config.session_path.is_none());
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        cleanup_env_vars();
        let config = ClientConfig::load_config(None, None).unwrap();

        assert_eq!(config, ClientConfig::with_defaults());
    }

    #[test]
    #[serial]
    fn test_load_config_with_environment_variables() {
        cleanup_env_vars();
        unsafe {
            env::set_var("BANKINC_BASE_URL", "https://bank.example.com/api/");
            env::set_var("BANKINC_LOG_LEVEL", "debug");
            env::set_var("BANKINC_SESSION_PATH", "/tmp/bankinc/session.json");
            env::set_var("BANKINC_PRODUCT_ID", "PROD99");
        }

        let config = ClientConfig::load_config(None, None).unwrap();

        assert_eq!(config.base_url.as_str(), "https://bank.example.com/api/");
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.resolved_session_path(),
            PathBuf::from("/tmp/bankinc/session.json")
        );
        assert_eq!(config.default_product_id, "PROD99");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_load_config_invalid_base_url_environment() {
        cleanup_env_vars();
        unsafe {
            env::set_var("BANKINC_BASE_URL", "not a url");
        }

        let result = ClientConfig::load_config(None, None);
        cleanup_env_vars();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid BANKINC_BASE_URL"));
    }

    #[test]
    #[serial]
    fn test_base_url_override_precedence() {
        cleanup_env_vars();
        unsafe {
            env::set_var("BANKINC_BASE_URL", "http://from-env:9000");
        }

        let cli_url = Url::parse("http://from-cli:7000").unwrap();
        let config = ClientConfig::load_config(None, Some(cli_url)).unwrap();
        cleanup_env_vars();

        assert_eq!(config.base_url.as_str(), "http://from-cli:7000/");
    }

    #[test]
    #[serial]
    fn test_rejects_base_url_without_path_support() {
        cleanup_env_vars();
        let url = Url::parse("mailto:bank@example.com").unwrap();

        let result = ClientConfig::load_config(None, Some(url));
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl(_))));
    }

    #[test]
    #[serial]
    fn test_load_config_from_yaml_file() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("bankinc.yaml");
        fs::write(
            &config_file,
            "base_url: \"http://yaml-host:8081\"\nlog_level: \"trace\"\n",
        )
        .unwrap();

        let config = ClientConfig::load_config(Some(config_file), None).unwrap();

        assert_eq!(config.base_url.as_str(), "http://yaml-host:8081/");
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.default_product_id, "PROD01");
    }

    #[test]
    #[serial]
    fn test_file_values_win_over_environment() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("bankinc.json");
        fs::write(&config_file, r#"{"base_url": "http://json-host:1234"}"#).unwrap();
        unsafe {
            env::set_var("BANKINC_BASE_URL", "http://from-env:9000");
        }

        let config = ClientConfig::load_config(Some(config_file), None).unwrap();
        cleanup_env_vars();

        assert_eq!(config.base_url.as_str(), "http://json-host:1234/");
    }

    #[test]
    #[serial]
    fn test_unsupported_config_extension() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("bankinc.toml");
        fs::write(&config_file, "base_url = 'x'").unwrap();

        let result = ClientConfig::load_config(Some(config_file), None);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat)));
    }

    #[test]
    #[serial]
    fn test_missing_config_file() {
        cleanup_env_vars();
        let result = ClientConfig::load_config(Some(PathBuf::from("/nonexistent/bankinc.yaml")), None);
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_config_yaml_roundtrip_keeps_fields() {
        let mut config = ClientConfig::with_defaults();
        config.session_path = Some(PathBuf::from("/var/lib/bankinc/session.json"));

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: ClientConfig = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed, config);
    }
}
