//! Application configuration.
//!
//! Configuration can be loaded from:
//! - A TOML file named by `IDEACAP_CONFIG`
//! - Environment variables (`IDEACAP_*` prefixed, `.env` honoured)
//!
//! # Example
//!
//! ```rust,no_run
//! use ideacap_core::config::AppConfig;
//!
//! // File named by IDEACAP_CONFIG, or environment variables
//! let config = AppConfig::load().expect("Failed to load config");
//! config.validate().expect("Invalid config");
//! ```
//!
//! A missing completion token is a hard error at [`AppConfig::validate`].
//! A missing remote store only disables sync.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::defaults;
use crate::logging::redact;

/// Environment variable naming a TOML config file.
pub const ENV_CONFIG_FILE: &str = "IDEACAP_CONFIG";
pub const ENV_COMPLETION_BASE_URL: &str = "IDEACAP_COMPLETION_BASE_URL";
pub const ENV_COMPLETION_TOKEN: &str = "IDEACAP_COMPLETION_TOKEN";
pub const ENV_COMPLETION_MODEL: &str = "IDEACAP_COMPLETION_MODEL";
pub const ENV_COMPLETION_TIMEOUT: &str = "IDEACAP_COMPLETION_TIMEOUT";
pub const ENV_REMOTE_URL: &str = "IDEACAP_REMOTE_URL";
pub const ENV_REMOTE_KEY: &str = "IDEACAP_REMOTE_KEY";
pub const ENV_DATA_DIR: &str = "IDEACAP_DATA_DIR";

static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder regex is valid"));

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Completion token is not configured (set IDEACAP_COMPLETION_TOKEN)")]
    MissingCompletionToken,

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Completion service configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL; `/v1/chat/completions` is appended.
    #[serde(default = "CompletionConfig::default_base_url")]
    pub base_url: String,
    /// Bearer token.
    #[serde(default)]
    pub token: String,
    /// Model identifier sent with each request.
    #[serde(default = "CompletionConfig::default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "CompletionConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            token: String::new(),
            model: Self::default_model(),
            timeout_secs: Self::default_timeout(),
        }
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("base_url", &self.base_url)
            .field("token", &redact(&self.token))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl CompletionConfig {
    fn default_base_url() -> String {
        defaults::COMPLETION_BASE_URL.to_string()
    }

    fn default_model() -> String {
        defaults::COMPLETION_MODEL.to_string()
    }

    fn default_timeout() -> u64 {
        defaults::COMPLETION_TIMEOUT_SECS
    }

    /// Full URL of the chat completion endpoint.
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            defaults::COMPLETION_PATH
        )
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingCompletionToken);
        }
        validate_url("completion base_url", &self.base_url)?;
        if self.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "completion model cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Remote store configuration. Both fields empty means sync is disabled.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RemoteStoreConfig {
    #[serde(default)]
    pub base_url: String,
    /// Publishable key sent as `apikey` and bearer token.
    #[serde(default)]
    pub publishable_key: String,
}

impl fmt::Debug for RemoteStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStoreConfig")
            .field("base_url", &self.base_url)
            .field("publishable_key", &redact(&self.publishable_key))
            .finish()
    }
}

impl RemoteStoreConfig {
    pub fn new(base_url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            publishable_key: publishable_key.into(),
        }
    }

    /// True iff both the base URL and the key are non-empty.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.publishable_key.trim().is_empty()
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub remote: RemoteStoreConfig,
    /// Directory of the file-backed local store.
    #[serde(default = "AppConfig::default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            completion: CompletionConfig::default(),
            remote: RemoteStoreConfig::default(),
            data_dir: Self::default_data_dir(),
        }
    }
}

impl AppConfig {
    fn default_data_dir() -> PathBuf {
        PathBuf::from(defaults::DATA_DIR)
    }

    /// Load from the file named by `IDEACAP_CONFIG`, falling back to
    /// environment variables.
    pub fn load() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();

        match env::var(ENV_CONFIG_FILE) {
            Ok(path) if !path.is_empty() => {
                info!(path = %path, "Loading config file");
                Self::from_file(Path::new(&path))
            }
            _ => {
                debug!("No config file set, using environment variables");
                Ok(Self::from_env())
            }
        }
    }

    /// Load from a TOML file. `${VAR}` placeholders are substituted from the
    /// environment.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let content = substitute_env_vars(&content);
        let mut config: AppConfig = toml::from_str(&content)?;
        if config.data_dir.as_os_str().is_empty() {
            config.data_dir = Self::default_data_dir();
        }
        Ok(config)
    }

    /// Load from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key-value provider.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let completion = CompletionConfig {
            base_url: lookup(ENV_COMPLETION_BASE_URL)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(CompletionConfig::default_base_url),
            token: lookup(ENV_COMPLETION_TOKEN).unwrap_or_default(),
            model: lookup(ENV_COMPLETION_MODEL)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(CompletionConfig::default_model),
            timeout_secs: lookup(ENV_COMPLETION_TIMEOUT)
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(CompletionConfig::default_timeout),
        };

        let remote = RemoteStoreConfig {
            base_url: lookup(ENV_REMOTE_URL).unwrap_or_default(),
            publishable_key: lookup(ENV_REMOTE_KEY).unwrap_or_default(),
        };

        let data_dir = lookup(ENV_DATA_DIR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_data_dir);

        Self {
            completion,
            remote,
            data_dir,
        }
    }

    /// Validate the configuration.
    ///
    /// The completion token is required. An unconfigured remote store only
    /// logs a warning; a configured one must have an http(s) URL.
    pub fn validate(&self) -> ConfigResult<()> {
        self.completion.validate()?;

        if self.remote.is_configured() {
            validate_url("remote base_url", &self.remote.base_url)?;
        } else {
            warn!("Remote store not configured; sync disabled");
        }

        Ok(())
    }
}

fn validate_url(name: &str, url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{} must start with http:// or https://, got: {}",
            name, url
        )));
    }
    Ok(())
}

/// Replace `${VAR}` placeholders with environment values; unknown
/// placeholders are left as-is.
fn substitute_env_vars(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_from_empty_lookup() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.completion.base_url, defaults::COMPLETION_BASE_URL);
        assert_eq!(config.completion.model, defaults::COMPLETION_MODEL);
        assert_eq!(
            config.completion.timeout_secs,
            defaults::COMPLETION_TIMEOUT_SECS
        );
        assert!(config.completion.token.is_empty());
        assert!(!config.remote.is_configured());
        assert_eq!(config.data_dir, PathBuf::from(defaults::DATA_DIR));
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_COMPLETION_BASE_URL, "http://localhost:9000/"),
            (ENV_COMPLETION_TOKEN, "tok"),
            (ENV_COMPLETION_MODEL, "vision-1"),
            (ENV_COMPLETION_TIMEOUT, "7"),
            (ENV_REMOTE_URL, "https://store.example"),
            (ENV_REMOTE_KEY, "pk"),
            (ENV_DATA_DIR, "/tmp/ideas"),
        ]));
        assert_eq!(
            config.completion.endpoint(),
            "http://localhost:9000/v1/chat/completions"
        );
        assert_eq!(config.completion.model, "vision-1");
        assert_eq!(config.completion.timeout_secs, 7);
        assert!(config.remote.is_configured());
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ideas"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_token_is_hard_error() {
        let config = AppConfig::from_lookup(|_| None);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCompletionToken)
        ));
    }

    #[test]
    fn test_missing_remote_is_not_an_error() {
        let config = AppConfig::from_lookup(lookup_from(&[(ENV_COMPLETION_TOKEN, "tok")]));
        assert!(config.validate().is_ok());
        assert!(!config.remote.is_configured());
    }

    #[test]
    fn test_remote_requires_both_fields() {
        assert!(!RemoteStoreConfig::new("https://x", "").is_configured());
        assert!(!RemoteStoreConfig::new("", "key").is_configured());
        assert!(RemoteStoreConfig::new("https://x", "key").is_configured());
        assert_eq!(RemoteStoreConfig::new("https://x/", "k").base(), "https://x");
    }

    #[test]
    fn test_invalid_remote_url_rejected() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_COMPLETION_TOKEN, "tok"),
            (ENV_REMOTE_URL, "store.example"),
            (ENV_REMOTE_KEY, "pk"),
        ]));
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_COMPLETION_TOKEN, "secret-token-value"),
            (ENV_REMOTE_KEY, "secret-key-value"),
        ]));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token-value"));
        assert!(!debug.contains("secret-key-value"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
data_dir = "/var/lib/ideacap"

[completion]
token = "file-token"
model = "m"

[remote]
base_url = "https://store.example"
publishable_key = "pk"
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.completion.token, "file-token");
        assert_eq!(config.completion.model, "m");
        assert_eq!(config.completion.base_url, defaults::COMPLETION_BASE_URL);
        assert!(config.remote.is_configured());
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/ideacap"));
    }

    #[test]
    fn test_env_var_substitution_missing_is_kept() {
        let content = "token = \"${NONEXISTENT_IDEACAP_TEST_VAR_9876}\"";
        assert_eq!(substitute_env_vars(content), content);
    }

    #[test]
    fn test_env_var_substitution_with_value() {
        env::set_var("IDEACAP_TEST_SUBSTITUTION_VAR", "v");
        let result = substitute_env_vars("token = \"${IDEACAP_TEST_SUBSTITUTION_VAR}\"");
        env::remove_var("IDEACAP_TEST_SUBSTITUTION_VAR");
        assert_eq!(result, "token = \"v\"");
    }
}
