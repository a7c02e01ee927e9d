use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Application-level constants
pub const APP_NAME: &str = "Ekitsa";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "ekitsa_lib=info,ekitsa=info,tower_http=info"
}

/// Get the application data directory (`<platform data dir>/Ekitsa`).
/// Falls back to the working directory when the platform has none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the SQLite database.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("ekitsa.db")
}

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub admin_token: Option<String>,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables, logging every default used.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: load_or("EKITSA_HOST", "0.0.0.0")?,
            port: load_or("EKITSA_PORT", "8080")?,
            db_path: optional("EKITSA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| {
                    let path = default_db_path();
                    tracing::info!(path = %path.display(), "EKITSA_DB_PATH not set, using default");
                    path
                }),
            admin_token: optional("EKITSA_ADMIN_TOKEN"),
            cors_origins: optional("EKITSA_CORS_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            gemini: GeminiConfig {
                api_key: optional("GEMINI_API_KEY"),
                model: load_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL)?,
                base_url: load_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)?,
                timeout_secs: load_or("GEMINI_TIMEOUT_SECS", "30")?,
            },
        })
    }

    /// Configuration for tests and embedding: local bind, given database, no secrets.
    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            db_path,
            admin_token: None,
            cors_origins: Vec::new(),
            gemini: GeminiConfig::default(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read a non-empty, trimmed environment variable.
fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn load_or<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| {
        tracing::info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_under_app_data() {
        let db = default_db_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("ekitsa.db"));
    }

    #[test]
    fn app_name_is_ekitsa() {
        assert_eq!(APP_NAME, "Ekitsa");
    }

    #[test]
    fn split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list(" http://a.test, ,http://b.test "),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn load_or_falls_back_to_default() {
        let port: u16 = load_or("EKITSA_TEST_UNSET_PORT_VAR", "8080").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn load_or_rejects_unparseable_default() {
        let result: Result<u16, _> = load_or("EKITSA_TEST_UNSET_PORT_VAR", "not-a-port");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_config_has_no_secrets() {
        let config = Config::with_db_path(PathBuf::from("/tmp/x.db"));
        assert!(config.admin_token.is_none());
        assert!(config.gemini.api_key.is_none());
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.bind_address(), "127.0.0.1:0");
    }
}
